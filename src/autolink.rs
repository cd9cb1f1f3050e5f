//! Bare URL, `#anchor` and `@handle` linking.
//!
//! URLs and anchors are found in one left-to-right pass; handles in a second
//! pass over whatever text is left. Both passes only ever look at text spans,
//! so text inside a link built earlier (or written explicitly with markup) is
//! never linked again.

use crate::inline::{self, Inline};
use regex::Regex;
use std::sync::LazyLock;

static URL_OR_ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<url>https?://[^\s<>"'`\[\]]+)|(?:^|[\s(])(?P<anchor>#\p{L}\w{0,100})"#).unwrap()
});
static HANDLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_]+)").unwrap());

/// Which handles get linked to `t.me`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleRule {
    /// 4 to 64 characters.
    #[default]
    General,
    /// Telegram usernames only: 5 to 32 characters.
    Telegram,
}

impl HandleRule {
    fn bounds(self) -> (usize, usize) {
        match self {
            HandleRule::General => (4, 64),
            HandleRule::Telegram => (5, 32),
        }
    }
}

/// Link URLs, anchors and handles in every text span of `spans`.
pub fn linkify(spans: Vec<Inline>, rule: HandleRule) -> Vec<Inline> {
    let spans = inline::map_text(spans, &link_urls_and_anchors);
    inline::map_text(spans, &|text: &str| link_handles(text, rule))
}

/// Linkify raw text straight to HTML.
pub fn linkify_html(text: &str, rule: HandleRule) -> String {
    inline::to_html(&linkify(vec![Inline::text(text)], rule))
}

pub fn link_urls_and_anchors(text: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut last = 0;

    for caps in URL_OR_ANCHOR_RE.captures_iter(text) {
        let (span, start, end) = if let Some(m) = caps.name("url") {
            let url = trim_url_end(m.as_str());
            (Inline::link(url, url), m.start(), m.start() + url.len())
        } else if let Some(m) = caps.name("anchor") {
            if text[m.end()..].chars().next().is_some_and(is_word_char) {
                continue;
            }
            (Inline::link(m.as_str(), m.as_str()), m.start(), m.end())
        } else {
            continue;
        };

        inline::push_text(&mut out, &text[last..start]);
        out.push(span);
        last = end;
    }

    inline::push_text(&mut out, &text[last..]);
    out
}

pub fn link_handles(text: &str, rule: HandleRule) -> Vec<Inline> {
    let (min, max) = rule.bounds();
    let mut out = Vec::new();
    let mut last = 0;

    for caps in HANDLE_RE.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let handle = name.as_str();
        if handle.len() < min || handle.len() > max {
            continue;
        }
        if !handle_boundary_ok(&text[..whole.start()], &text[whole.end()..]) {
            continue;
        }

        inline::push_text(&mut out, &text[last..whole.start()]);
        out.push(Inline::link(
            format!("https://t.me/{handle}"),
            format!("@{handle}"),
        ));
        last = whole.end();
    }

    inline::push_text(&mut out, &text[last..]);
    out
}

/// Reject `user@domain` style sequences: the `@` must not follow a word
/// character, and the handle must not run into a domain or another word.
fn handle_boundary_ok(before: &str, after: &str) -> bool {
    if let Some(prev) = before.chars().next_back() {
        if is_word_char(prev) || matches!(prev, '.' | '@' | '-' | '/') {
            return false;
        }
    }

    let mut rest = after.chars();
    match rest.next() {
        None => true,
        Some(c) if is_word_char(c) || c == '@' => false,
        Some('.') => !rest.next().is_some_and(is_word_char),
        Some(_) => true,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Drop trailing sentence punctuation, and a closing paren that has no
/// opening partner inside the URL.
fn trim_url_end(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(['.', ',', ';', ':', '!', '?']);
        let trimmed = match trimmed.strip_suffix(')') {
            Some(inner) if !inner.contains('(') => inner,
            _ => trimmed,
        };
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_url() {
        assert_eq!(
            linkify_html("see https://x.test/a?b=1, then", HandleRule::General),
            r#"see <a href="https://x.test/a?b=1" target="_blank" rel="noopener">https://x.test/a?b=1</a>, then"#
        );
    }

    #[test]
    fn test_url_stops_at_quotes_and_brackets() {
        let spans = link_urls_and_anchors(r#"("https://x.test/q")"#);
        assert_eq!(
            spans,
            vec![
                Inline::text("(\""),
                Inline::link("https://x.test/q", "https://x.test/q"),
                Inline::text("\")"),
            ]
        );
    }

    #[test]
    fn test_url_keeps_balanced_parens() {
        let spans = link_urls_and_anchors("https://en.wikipedia.org/wiki/Bo_(game).");
        assert_eq!(
            spans,
            vec![
                Inline::link(
                    "https://en.wikipedia.org/wiki/Bo_(game)",
                    "https://en.wikipedia.org/wiki/Bo_(game)"
                ),
                Inline::text("."),
            ]
        );
    }

    #[test]
    fn test_anchor() {
        assert_eq!(
            linkify_html("#finals (#groupA) x#no", HandleRule::General),
            r##"<a href="#finals">#finals</a> (<a href="#groupA">#groupA</a>) x#no"##
        );
        assert_eq!(
            linkify_html("#1st", HandleRule::General),
            "#1st"
        );
    }

    #[test]
    fn test_anchor_length_limit() {
        let ok = format!("#a{}", "b".repeat(100));
        let too_long = format!("#a{}", "b".repeat(101));
        assert_eq!(link_urls_and_anchors(&ok).len(), 1);
        assert!(matches!(link_urls_and_anchors(&ok)[0], Inline::Link { .. }));
        assert_eq!(link_urls_and_anchors(&too_long), vec![Inline::text(too_long.clone())]);
    }

    #[test]
    fn test_handle_lengths() {
        let general = linkify_html("@abcd", HandleRule::General);
        assert_eq!(
            general,
            r#"<a href="https://t.me/abcd" target="_blank" rel="noopener">@abcd</a>"#
        );
        assert_eq!(linkify_html("@abcd", HandleRule::Telegram), "@abcd");
        assert!(linkify_html("@abcde", HandleRule::Telegram).contains("https://t.me/abcde"));

        let long = format!("@{}", "a".repeat(33));
        assert_eq!(linkify_html(&long, HandleRule::Telegram), long);
        assert!(linkify_html(&long, HandleRule::General).contains("t.me"));
    }

    #[test]
    fn test_email_is_not_a_handle() {
        assert_eq!(
            linkify_html("user@example.com", HandleRule::General),
            "user@example.com"
        );
        assert_eq!(
            linkify_html("mail @example.com", HandleRule::General),
            "mail @example.com"
        );
        assert_eq!(
            linkify_html("thanks @caster.", HandleRule::General),
            r#"thanks <a href="https://t.me/caster" target="_blank" rel="noopener">@caster</a>."#
        );
    }

    #[test]
    fn test_handles_not_linked_inside_urls() {
        let html = linkify_html("https://x.test/@someone", HandleRule::General);
        assert_eq!(
            html,
            r#"<a href="https://x.test/@someone" target="_blank" rel="noopener">https://x.test/@someone</a>"#
        );
    }

    #[test]
    fn test_existing_links_untouched() {
        let spans = vec![
            Inline::link("https://x.test", "@label_here"),
            Inline::text(" and @other_one"),
        ];
        let linked = linkify(spans, HandleRule::General);
        assert_eq!(linked[0], Inline::link("https://x.test", "@label_here"));
        assert_eq!(
            linked[2],
            Inline::link("https://t.me/other_one", "@other_one")
        );
    }
}
