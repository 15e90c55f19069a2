//! Source normalisation applied before extraction and rendering.
//!
//! Uploads come from browsers and editors on every platform. A UTF-8 BOM on
//! the first line would hide the `# ` of an H1 from the title matcher, and a
//! bare `\r` would survive into `$`-anchored captures, so both are removed
//! here once rather than accommodated in every pattern.

use std::borrow::Cow;

const BOM: char = '\u{feff}';

/// Strip a leading BOM and convert CRLF / CR line endings to LF.
///
/// Returns the input unchanged (borrowed) when there is nothing to do.
pub fn normalize_source(input: &str) -> Cow<'_, str> {
    let s = input.strip_prefix(BOM).unwrap_or(input);
    if s.contains('\r') {
        Cow::Owned(normalise_line_endings(s))
    } else {
        Cow::Borrowed(s)
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}
