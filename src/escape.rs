//! HTML escaping for text content and quoted attribute values.
//!
//! Every string the writer places into markup goes through one of these two
//! functions, so nothing upstream ever has to reason about literal angle
//! brackets.

use std::borrow::Cow;

/// Escape `&`, `<` and `>` for use as HTML text content.
pub fn escape_text(s: &str) -> Cow<'_, str> {
    html_escape::encode_text(s)
}

/// Escape a value placed inside a quoted attribute. In addition to the text
/// escapes this also covers `"` and `'`.
pub fn escape_attribute(s: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(s)
}
