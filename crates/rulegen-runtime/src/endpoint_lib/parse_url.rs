use url::Host;

use crate::DiagnosticCollector;

/// The parts of a URL that endpoint rules can inspect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Url {
    scheme: String,
    authority: String,
    path: String,
    normalized_path: String,
    is_ip: bool,
}

impl Url {
    /// `http` or `https`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The host and port, as written.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// The path, as written. Empty when the URL has no path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path with a leading and trailing `/`.
    pub fn normalized_path(&self) -> &str {
        &self.normalized_path
    }

    /// Whether the host is an IP address.
    pub fn is_ip(&self) -> bool {
        self.is_ip
    }
}

/// Parses an `http` or `https` URL without a query string.
pub fn parse_url(input: &str, e: &mut DiagnosticCollector) -> Option<Url> {
    let parsed = e.capture(url::Url::parse(input))?;
    if parsed.query().is_some() {
        e.report_error("URL cannot have a query component");
        return None;
    }
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        e.report_error(format!("unsupported scheme `{scheme}`"));
        return None;
    }
    let is_ip = matches!(parsed.host(), Some(Host::Ipv4(_) | Host::Ipv6(_)));

    // `url` normalizes the path, so take both parts from the
    // input.
    let rest = input.split_once("://").map_or("", |(_, rest)| rest);
    let rest = rest.split_once('#').map_or(rest, |(rest, _)| rest);
    let (authority, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };

    let mut normalized_path = String::with_capacity(path.len().saturating_add(2));
    if !path.starts_with('/') {
        normalized_path.push('/');
    }
    normalized_path.push_str(path);
    if !normalized_path.ends_with('/') {
        normalized_path.push('/');
    }

    Some(Url {
        scheme: scheme.to_owned(),
        authority: authority.to_owned(),
        path: path.to_owned(),
        normalized_path,
        is_ip,
    })
}
