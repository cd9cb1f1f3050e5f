use crate::blocks;
use crate::inline;
use crate::markup;

#[inline]
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        // a char boundary is always within four bytes
        let lower_bound = index.saturating_sub(3);
        (lower_bound..=index)
            .rev()
            .find(|i| s.is_char_boundary(*i))
            .unwrap_or(0)
    }
}

const ABBREV_SIZE: usize = 10;

/// Shorten a value for log lines.
pub fn abbrev_str(name: &str) -> String {
    if name.len() > ABBREV_SIZE {
        let closest = floor_char_boundary(name, ABBREV_SIZE);
        format!("{}...", &name[..closest])
    } else {
        name.to_owned()
    }
}

pub fn abbreviate(text: &str, len: usize) -> &str {
    let closest = floor_char_boundary(text, len);
    &text[..closest]
}

/// Plain-text preview of a field: markup and quote markers removed,
/// whitespace collapsed, and at most `max_bytes` of text before a trailing
/// `…`.
pub fn excerpt(text: &str, max_bytes: usize) -> String {
    let plain: Vec<String> = blocks::segment(text)
        .iter()
        .map(|block| inline::plain_text(&markup::parse(&block.content)))
        .collect();
    let collapsed = plain.join(" ").split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.len() <= max_bytes {
        return collapsed;
    }

    let cut = abbreviate(&collapsed, max_bytes).trim_end();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_str() {
        assert_eq!(abbrev_str("short"), "short");
        assert_eq!(abbrev_str("0123456789abc"), "0123456789...");
        // 'é' is two bytes and straddles the cut
        assert_eq!(abbrev_str("ééééééé"), "ééééé...");
    }

    #[test]
    fn test_abbreviate_char_boundary() {
        assert_eq!(abbreviate("привет", 3), "п");
        assert_eq!(abbreviate("abc", 10), "abc");
        assert_eq!(abbreviate("🎮x", 2), "");
    }

    #[test]
    fn test_excerpt_strips_markers() {
        let text = "[b]Winner[/b] of the cup\n> quoted   line\n\n\nsee [url=https://x.test]bracket[/url]";
        assert_eq!(
            excerpt(text, 200),
            "Winner of the cup quoted line see bracket"
        );
    }

    #[test]
    fn test_excerpt_truncates() {
        assert_eq!(excerpt("grand finals tonight", 12), "grand finals…");
        assert_eq!(excerpt("grand finals tonight", 6), "grand…");
        assert_eq!(excerpt("ёжик", 3), "ё…");
        assert_eq!(excerpt("", 3), "");
    }
}
