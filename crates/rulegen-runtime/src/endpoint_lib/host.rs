use crate::DiagnosticCollector;

/// Reports whether `label` is a valid DNS host label.
///
/// With `allow_subdomains`, each `.`-separated part must be a
/// valid label.
pub fn is_valid_host_label(label: &str, allow_subdomains: bool, e: &mut DiagnosticCollector) -> bool {
    if allow_subdomains {
        return label
            .split('.')
            .all(|part| is_valid_host_label(part, false, e));
    }
    if label.is_empty() || label.len() > 63 {
        e.report_error(format!("`{label}` must be between 1 and 63 characters"));
        return false;
    }
    if label.starts_with('-') {
        e.report_error(format!("`{label}` cannot start with `-`"));
        return false;
    }
    if let Some(c) = label.chars().find(|&c| !c.is_ascii_alphanumeric() && c != '-') {
        e.report_error(format!("`{label}` contains invalid character `{c}`"));
        return false;
    }
    true
}
