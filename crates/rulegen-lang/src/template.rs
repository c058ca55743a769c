use rulegen_ast::{Expr, Template, TemplatePart};

use crate::{ParseError, ParseErrorKind};

/// Parses a ruleset string template.
///
/// `{Name}` interpolates a reference and `{Name#path}` an
/// attribute of one. `{{` and `}}` are literal braces.
pub fn parse_template(input: &str) -> Result<Template, ParseError> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut chars = input.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        match c {
            '{' if chars.next_if(|&(_, c)| c == '{').is_some() => text.push('{'),
            '}' if chars.next_if(|&(_, c)| c == '}').is_some() => text.push('}'),
            '{' => {
                let mut inner = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }
                if !closed {
                    return Err(ParseError::at(
                        ParseErrorKind::InvalidTemplate,
                        format!("unclosed `{{` in `{input}`"),
                        offset,
                    ));
                }
                if !text.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut text)));
                }
                parts.push(TemplatePart::Dynamic(placeholder(&inner, input, offset)?));
            }
            '}' => {
                return Err(ParseError::at(
                    ParseErrorKind::InvalidTemplate,
                    format!("unmatched `}}` in `{input}`"),
                    offset,
                ));
            }
            c => text.push(c),
        }
    }
    if !text.is_empty() {
        parts.push(TemplatePart::Literal(text));
    }
    Ok(Template { parts })
}

fn placeholder(inner: &str, input: &str, offset: usize) -> Result<Expr, ParseError> {
    let invalid = || {
        ParseError::at(
            ParseErrorKind::InvalidTemplate,
            format!("invalid placeholder `{{{inner}}}` in `{input}`"),
            offset,
        )
    };
    let (name, path) = match inner.split_once('#') {
        Some((name, path)) => (name, Some(path)),
        None => (inner, None),
    };
    if !is_reference(name) {
        return Err(invalid());
    }
    match path {
        None => Ok(Expr::reference(name)),
        Some("") => Err(invalid()),
        Some(path) => Ok(Expr::call(
            "getAttr",
            vec![Expr::reference(name), Expr::string(path)],
        )),
    }
}

fn is_reference(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
