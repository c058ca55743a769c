use crate::DiagnosticCollector;

/// Returns `input[start..stop]`, counting from the end of the
/// string when `reverse` is set.
///
/// Only ASCII input is supported. Returns `None` when the input
/// is not ASCII or the range is out of bounds.
pub fn substring<'a>(
    input: &'a str,
    start: usize,
    stop: usize,
    reverse: bool,
    e: &mut DiagnosticCollector,
) -> Option<&'a str> {
    if start >= stop {
        e.report_error("start must be less than stop");
        return None;
    }
    if !input.is_ascii() {
        e.report_error("input must be ASCII");
        return None;
    }
    let len = input.len();
    if stop > len {
        e.report_error("stop is past the end of the input");
        return None;
    }
    let (start, stop) = if reverse {
        (len.checked_sub(stop)?, len.checked_sub(start)?)
    } else {
        (start, stop)
    };
    input.get(start..stop)
}
