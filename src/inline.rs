//! Typed inline spans.
//!
//! Text is parsed into this representation once and every later stage
//! (autolinking, embed injection) works on it instead of on HTML strings.
//! [`write_html`] is the only place spans become markup.

use crate::embed::{EmbedSource, TWITCH_EMBED_CLASS};
use crate::escape::{escape_attribute, escape_text};
use std::fmt::Write;

pub const EMBED_WIDTH: u32 = 640;
pub const EMBED_HEIGHT: u32 = 360;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Raw, unescaped text.
    Text(String),
    Break,
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Link { href: String, children: Vec<Inline> },
    Embed(EmbedSource),
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }

    /// A link whose visible text is `label`.
    pub fn link(href: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        let children = if label.is_empty() {
            vec![]
        } else {
            vec![Inline::Text(label)]
        };

        Inline::Link {
            href: href.into(),
            children,
        }
    }

    /// Is this a link whose visible text is its own href?
    pub fn is_bare_link(&self) -> bool {
        match self {
            Inline::Link { href, children } => {
                let href = href.trim();
                !href.is_empty() && plain_text(children).trim() == href
            }
            _ => false,
        }
    }
}

/// Append text, merging into a trailing text span.
pub fn push_text(out: &mut Vec<Inline>, s: &str) {
    if s.is_empty() {
        return;
    }

    if let Some(Inline::Text(last)) = out.last_mut() {
        last.push_str(s);
    } else {
        out.push(Inline::Text(s.to_owned()));
    }
}

/// Append a span, merging adjacent text.
pub fn push(out: &mut Vec<Inline>, span: Inline) {
    match span {
        Inline::Text(s) => push_text(out, &s),
        other => out.push(other),
    }
}

/// Visible text of a span list. Breaks count as a space, embeds as nothing.
pub fn plain_text(spans: &[Inline]) -> String {
    let mut out = String::new();
    collect_plain_text(spans, &mut out);
    out
}

fn collect_plain_text(spans: &[Inline], out: &mut String) {
    for span in spans {
        match span {
            Inline::Text(s) => out.push_str(s),
            Inline::Break => out.push(' '),
            Inline::Strong(children)
            | Inline::Emphasis(children)
            | Inline::Link { children, .. } => collect_plain_text(children, out),
            Inline::Embed(_) => {}
        }
    }
}

/// Apply `f` to every text span outside of links, splicing in its output.
pub fn map_text<F>(spans: Vec<Inline>, f: &F) -> Vec<Inline>
where
    F: Fn(&str) -> Vec<Inline>,
{
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        match span {
            Inline::Text(s) => {
                for produced in f(&s) {
                    push(&mut out, produced);
                }
            }
            Inline::Strong(children) => out.push(Inline::Strong(map_text(children, f))),
            Inline::Emphasis(children) => out.push(Inline::Emphasis(map_text(children, f))),
            other => out.push(other),
        }
    }
    out
}

/// Turn `\n` inside text spans into explicit line breaks.
pub fn break_lines(spans: Vec<Inline>) -> Vec<Inline> {
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        match span {
            Inline::Text(s) => {
                for (i, line) in s.split('\n').enumerate() {
                    if i > 0 {
                        out.push(Inline::Break);
                    }
                    push_text(&mut out, line);
                }
            }
            Inline::Strong(children) => out.push(Inline::Strong(break_lines(children))),
            Inline::Emphasis(children) => out.push(Inline::Emphasis(break_lines(children))),
            Inline::Link { href, children } => out.push(Inline::Link {
                href,
                children: break_lines(children),
            }),
            other => out.push(other),
        }
    }
    out
}

/// Hrefs the writer (and the sanitizer) let through unchanged.
pub fn is_allowed_href(href: &str) -> bool {
    let lower = href.get(..7).unwrap_or(href).to_ascii_lowercase();
    lower.starts_with("http:")
        || lower.starts_with("https:")
        || lower.starts_with("mailto:")
        || href.starts_with('#')
        || href.starts_with('/')
}

pub fn to_html(spans: &[Inline]) -> String {
    let mut out = String::new();
    write_html(spans, &mut out);
    out
}

pub fn write_html(spans: &[Inline], out: &mut String) {
    write_spans(spans, false, out);
}

fn write_spans(spans: &[Inline], in_link: bool, out: &mut String) {
    for span in spans {
        match span {
            Inline::Text(s) => out.push_str(&escape_text(s)),
            Inline::Break => out.push_str("<br>"),
            Inline::Strong(children) => {
                out.push_str("<strong>");
                write_spans(children, in_link, out);
                out.push_str("</strong>");
            }
            Inline::Emphasis(children) => {
                out.push_str("<em>");
                write_spans(children, in_link, out);
                out.push_str("</em>");
            }
            // anchors never nest
            Inline::Link { children, .. } if in_link => write_spans(children, true, out),
            Inline::Link { href, children } => {
                let href = if is_allowed_href(href) { href.as_str() } else { "#" };
                if href.starts_with('#') {
                    let _ = write!(out, r#"<a href="{}">"#, escape_attribute(href));
                } else {
                    let _ = write!(
                        out,
                        r#"<a href="{}" target="_blank" rel="noopener">"#,
                        escape_attribute(href)
                    );
                }
                write_spans(children, true, out);
                out.push_str("</a>");
            }
            Inline::Embed(source) => write_iframe(source, out),
        }
    }
}

/// 16:9 player iframe. Twitch gets a `data-channel` placeholder without a
/// `src`; the page fills it in with its own hostname as `parent`.
pub fn write_iframe(source: &EmbedSource, out: &mut String) {
    match source {
        EmbedSource::Player(src) => {
            let _ = write!(
                out,
                r#"<iframe src="{}" width="{EMBED_WIDTH}" height="{EMBED_HEIGHT}" frameborder="0" allow="autoplay; fullscreen; picture-in-picture" allowfullscreen></iframe>"#,
                escape_attribute(src)
            );
        }
        EmbedSource::TwitchChannel(channel) => {
            let _ = write!(
                out,
                r#"<iframe class="{TWITCH_EMBED_CLASS}" data-channel="{}" width="{EMBED_WIDTH}" height="{EMBED_HEIGHT}" frameborder="0" allowfullscreen></iframe>"#,
                escape_attribute(channel)
            );
        }
    }
}
