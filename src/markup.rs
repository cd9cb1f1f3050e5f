//! The achievement/feedback markup dialect.
//!
//! Supported, case-insensitive:
//!
//! - `[br]`, `[br/]`: line break
//! - `[b]...[/b]`: bold
//! - `[i]...[/i]`: italic
//! - `[url=HREF]LABEL[/url]`: link with a label
//! - `[url]HREF[/url]`: link labelled with its own href
//!
//! A construct closes at the first matching closer after it. Markers with no
//! closer stay literal text. Bold and italic content is parsed recursively;
//! link labels are plain text.
//!
//! Hrefs are taken as written. The writer and the sanitizer decide whether
//! they are safe to emit.

use crate::inline::{self, Inline};
use std::cell::RefCell;

const CLOSE_BOLD: &str = "[/b]";
const CLOSE_ITALIC: &str = "[/i]";
const CLOSE_URL: &str = "[/url]";
const CLOSE_BRACKET: &str = "]";

const NEEDLE_COUNT: usize = 4;
const NEEDLES: [&str; NEEDLE_COUNT] = [CLOSE_BOLD, CLOSE_ITALIC, CLOSE_URL, CLOSE_BRACKET];

/// Parse `text` into inline spans.
pub fn parse(text: &str) -> Vec<Inline> {
    let parser = Parser::new(text);
    parser.parse_range(0, text.len())
}

/// Convert markup straight to (unsanitized) HTML.
pub fn to_html(text: &str) -> String {
    inline::to_html(&parse(text))
}

/// Memo of the next occurrence of a closer at or after some offset. Lets
/// input full of unterminated openers parse in linear time.
#[derive(Clone, Copy)]
struct NextMatch {
    from: usize,
    at: Option<usize>,
}

struct Parser<'a> {
    src: &'a str,
    lower: String,
    memo: RefCell<[Option<NextMatch>; NEEDLE_COUNT]>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            lower: src.to_ascii_lowercase(),
            memo: RefCell::new([None; NEEDLE_COUNT]),
        }
    }

    /// First occurrence of `NEEDLES[which]` in `from..end`.
    fn find(&self, which: usize, from: usize, end: usize) -> Option<usize> {
        let needle = NEEDLES[which];
        let cached = self.memo.borrow()[which];

        let at = match cached {
            Some(m) if m.from <= from && m.at.map_or(true, |at| at >= from) => m.at,
            _ => {
                let at = self.lower[from..].find(needle).map(|i| from + i);
                self.memo.borrow_mut()[which] = Some(NextMatch { from, at });
                at
            }
        };

        at.filter(|at| at + needle.len() <= end)
    }

    fn starts_with(&self, at: usize, marker: &str) -> bool {
        self.lower[at..].starts_with(marker)
    }

    fn parse_range(&self, start: usize, end: usize) -> Vec<Inline> {
        let mut out = Vec::new();
        let mut text_start = start;
        let mut pos = start;

        while let Some(rel) = self.src[pos..end].find('[') {
            let at = pos + rel;
            match self.construct(at, end) {
                Some((span, next)) => {
                    inline::push_text(&mut out, &self.src[text_start..at]);
                    out.push(span);
                    pos = next;
                    text_start = next;
                }
                None => pos = at + 1,
            }
        }

        inline::push_text(&mut out, &self.src[text_start..end]);
        out
    }

    /// Try to read a construct starting at `at`. Returns the span and the
    /// offset just past it.
    fn construct(&self, at: usize, end: usize) -> Option<(Inline, usize)> {
        if self.starts_with(at, "[br]") {
            return Some((Inline::Break, at + 4));
        }
        if self.starts_with(at, "[br/]") {
            return Some((Inline::Break, at + 5));
        }
        if self.starts_with(at, "[b]") {
            return self.styled(at + 3, end, 0, Inline::Strong);
        }
        if self.starts_with(at, "[i]") {
            return self.styled(at + 3, end, 1, Inline::Emphasis);
        }
        if self.starts_with(at, "[url]") {
            let inner = at + 5;
            let close = self.find(2, inner, end)?;
            let href = self.src[inner..close].trim();
            if href.is_empty() {
                return None;
            }
            return Some((Inline::link(href, href), close + CLOSE_URL.len()));
        }
        if self.starts_with(at, "[url=") {
            let href_start = at + 5;
            let href_end = self.find(3, href_start, end)?;
            let href = unquote(self.src[href_start..href_end].trim());
            if href.is_empty() || href.contains(['\n', '[']) {
                return None;
            }

            let label_start = href_end + CLOSE_BRACKET.len();
            let close = self.find(2, label_start, end)?;
            let label = &self.src[label_start..close];
            return Some((Inline::link(href, label), close + CLOSE_URL.len()));
        }

        None
    }

    fn styled(
        &self,
        inner: usize,
        end: usize,
        closer: usize,
        wrap: fn(Vec<Inline>) -> Inline,
    ) -> Option<(Inline, usize)> {
        let close = self.find(closer, inner, end)?;
        let children = self.parse_range(inner, close);
        Some((wrap(children), close + NEEDLES[closer].len()))
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_and_explicit_link() {
        let spans = parse("[b]Win[/b] vs [url=https://x.test]opponent[/url]");
        assert_eq!(
            spans,
            vec![
                Inline::Strong(vec![Inline::text("Win")]),
                Inline::text(" vs "),
                Inline::link("https://x.test", "opponent"),
            ]
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            parse("[B]x[/b][I]y[/I]"),
            vec![
                Inline::Strong(vec![Inline::text("x")]),
                Inline::Emphasis(vec![Inline::text("y")]),
            ]
        );
    }

    #[test]
    fn test_breaks() {
        assert_eq!(
            parse("a[br]b[BR/]c"),
            vec![
                Inline::text("a"),
                Inline::Break,
                Inline::text("b"),
                Inline::Break,
                Inline::text("c"),
            ]
        );
    }

    #[test]
    fn test_implicit_link() {
        assert_eq!(
            parse("[url] https://youtu.be/dQw4w9WgXcQ [/url]"),
            vec![Inline::link(
                "https://youtu.be/dQw4w9WgXcQ",
                "https://youtu.be/dQw4w9WgXcQ"
            )]
        );
    }

    #[test]
    fn test_nested_styles() {
        assert_eq!(
            parse("[b]a [i]b[/i][/b]"),
            vec![Inline::Strong(vec![
                Inline::text("a "),
                Inline::Emphasis(vec![Inline::text("b")]),
            ])]
        );
    }

    #[test]
    fn test_non_greedy() {
        assert_eq!(
            parse("[b]one[/b] two [b]three[/b]"),
            vec![
                Inline::Strong(vec![Inline::text("one")]),
                Inline::text(" two "),
                Inline::Strong(vec![Inline::text("three")]),
            ]
        );
    }

    #[test]
    fn test_unterminated_stays_literal() {
        assert_eq!(parse("[b]open"), vec![Inline::text("[b]open")]);
        assert_eq!(parse("[url=x]label"), vec![Inline::text("[url=x]label")]);
        assert_eq!(parse("[url][/url]"), vec![Inline::text("[url][/url]")]);
        assert_eq!(
            parse("[i]x[b]y[/i]z[/b]"),
            vec![
                Inline::Emphasis(vec![Inline::text("x[b]y")]),
                Inline::text("z[/b]"),
            ]
        );
    }

    #[test]
    fn test_label_is_not_parsed() {
        assert_eq!(
            parse("[url=/a][b]x[/b][/url]"),
            vec![Inline::link("/a", "[b]x[/b]")]
        );
    }

    #[test]
    fn test_hostile_href_is_kept_for_the_writer() {
        let spans = parse("[url=javascript:alert(1)]click[/url]");
        assert_eq!(spans, vec![Inline::link("javascript:alert(1)", "click")]);
        assert_eq!(to_html("[url=javascript:alert(1)]click[/url]"), r##"<a href="#">click</a>"##);
    }

    #[test]
    fn test_raw_html_is_escaped() {
        assert_eq!(
            to_html("[b]<script>x</script>[/b]"),
            "<strong>&lt;script&gt;x&lt;/script&gt;</strong>"
        );
    }

    #[test]
    fn test_many_unterminated_openers() {
        let input = "[b]".repeat(20_000);
        assert_eq!(parse(&input), vec![Inline::text(input.clone())]);
    }
}
