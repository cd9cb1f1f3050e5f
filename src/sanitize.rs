//! Allowlist sanitizer. This is the trust boundary: it assumes nothing about
//! its input.
//!
//! The fragment is parsed with html5ever (through `scraper`) and walked into
//! inline spans. The walk reads attributes as written, so an iframe that
//! carries any `src` is judged by that `src`, and only allowlisted tags,
//! attributes and players come out. The spans are written by the one HTML
//! writer and passed through `ammonia` with the same allowlist, then read
//! back once more. Sanitizing sanitized output changes nothing.
//!
//! Elements nested deeper than [`MAX_NESTING`] lose their formatting and
//! links: only their text, line breaks and players are kept.

use crate::embed::{self, EmbedSource, TWITCH_EMBED_CLASS};
use crate::inline::{self, Inline};
use ammonia::UrlRelative;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

/// Element depth past which formatting is flattened.
pub const MAX_NESTING: usize = 64;

/// Elements whose content is never text the reader should see.
const DROP_CONTENT_TAGS: &[&str] = &[
    "script", "style", "template", "noscript", "textarea", "title", "xmp", "noembed",
    "noframes", "object", "svg", "math",
];

static SANITIZER: LazyLock<Sanitizer> = LazyLock::new(Sanitizer::new);

pub struct Sanitizer {
    cleaner: ammonia::Builder<'static>,
}

impl Sanitizer {
    pub fn new() -> Self {
        let tags: HashSet<&str> = ["a", "strong", "em", "br", "iframe"].into_iter().collect();
        let tag_attributes: HashMap<&str, HashSet<&str>> = [
            ("a", ["href"].into_iter().collect()),
            (
                "iframe",
                ["src", "class", "data-channel"].into_iter().collect(),
            ),
        ]
        .into_iter()
        .collect();

        let mut cleaner = ammonia::Builder::default();
        cleaner
            .tags(tags)
            .tag_attributes(tag_attributes)
            .generic_attributes(HashSet::new())
            .url_schemes(["http", "https", "mailto"].into_iter().collect())
            .url_relative(UrlRelative::PassThrough)
            .link_rel(None)
            .strip_comments(true)
            .clean_content_tags(DROP_CONTENT_TAGS.iter().copied().collect())
            .attribute_filter(filter_attribute);

        Self { cleaner }
    }

    pub fn clean(&self, html: &str) -> String {
        inline::to_html(&self.parse(html))
    }

    /// Sanitize `html` into inline spans.
    pub fn parse(&self, html: &str) -> Vec<Inline> {
        let spans = walk_fragment(html);
        let cleaned = self.cleaner.clean(&inline::to_html(&spans)).to_string();
        walk_fragment(&cleaned)
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Sanitize an HTML fragment with the shared allowlist.
pub fn sanitize(html: &str) -> String {
    SANITIZER.clean(html)
}

/// Sanitize `html` and return it as inline spans.
pub fn parse_fragment(html: &str) -> Vec<Inline> {
    SANITIZER.parse(html)
}

fn filter_attribute<'u>(element: &str, attribute: &str, value: &'u str) -> Option<Cow<'u, str>> {
    match (element, attribute) {
        ("a", "href") if inline::is_allowed_href(value) => Some(Cow::Borrowed(value)),
        ("a", "href") => {
            debug!("rewriting disallowed href to #");
            Some(Cow::Borrowed("#"))
        }
        // an emptied src still marks the iframe as a player, which the walk drops
        ("iframe", "src") if embed::is_allowed_player_src(value) => Some(Cow::Borrowed(value)),
        ("iframe", "src") => Some(Cow::Borrowed("")),
        ("iframe", "data-channel") => {
            embed::is_valid_twitch_channel(value).then_some(Cow::Borrowed(value))
        }
        ("iframe", "class") => value
            .split_ascii_whitespace()
            .any(|class| class == TWITCH_EMBED_CLASS)
            .then_some(Cow::Borrowed(TWITCH_EMBED_CLASS)),
        _ => None,
    }
}

fn walk_fragment(html: &str) -> Vec<Inline> {
    let doc = Html::parse_fragment(html);
    let mut out = Vec::new();
    collect_children(doc.root_element(), 0, false, &mut out);
    out
}

fn collect_children(parent: ElementRef<'_>, depth: usize, in_link: bool, out: &mut Vec<Inline>) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => inline::push_text(out, text),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    collect_element(element, depth, in_link, out);
                }
            }
            _ => {}
        }
    }
}

fn children_of(element: ElementRef<'_>, depth: usize, in_link: bool) -> Vec<Inline> {
    let mut children = Vec::new();
    collect_children(element, depth + 1, in_link, &mut children);
    children
}

fn collect_element(element: ElementRef<'_>, depth: usize, in_link: bool, out: &mut Vec<Inline>) {
    let el = element.value();
    match el.name() {
        "br" => out.push(Inline::Break),
        "iframe" => push_iframe(el, out),
        name if DROP_CONTENT_TAGS.contains(&name) => {}
        _ if depth >= MAX_NESTING => flatten_children(element, out),
        "strong" => out.push(Inline::Strong(children_of(element, depth, in_link))),
        "em" => out.push(Inline::Emphasis(children_of(element, depth, in_link))),
        "a" if in_link => collect_children(element, depth + 1, true, out),
        "a" => {
            let href = el
                .attr("href")
                .filter(|href| inline::is_allowed_href(href))
                .unwrap_or("#");
            out.push(Inline::Link {
                href: href.to_owned(),
                children: children_of(element, depth, true),
            });
        }
        _ => collect_children(element, depth + 1, in_link, out),
    }
}

/// Text, breaks and players below `element`, without recursing.
fn flatten_children(element: ElementRef<'_>, out: &mut Vec<Inline>) {
    let mut stack: Vec<_> = element.children().rev().collect();

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => inline::push_text(out, text),
            Node::Element(el) => match el.name() {
                "br" => out.push(Inline::Break),
                "iframe" => push_iframe(el, out),
                name if DROP_CONTENT_TAGS.contains(&name) => {}
                _ => stack.extend(node.children().rev()),
            },
            _ => {}
        }
    }
}

fn push_iframe(el: &Element, out: &mut Vec<Inline>) {
    let source = iframe_source(el.attr("src"), el.attr("data-channel"), || {
        el.classes().any(|class| class == TWITCH_EMBED_CLASS)
    });

    match source {
        Some(source) => out.push(Inline::Embed(source)),
        None => {
            debug!("dropping iframe without a recognized player");
            metrics::counter!("sanitizer_iframes_dropped_total").increment(1);
        }
    }
}

/// A player `src` must match a canonical shape. Without a `src`, only a
/// Twitch placeholder (marker class plus a valid channel) is kept.
fn iframe_source(
    src: Option<&str>,
    channel: Option<&str>,
    has_twitch_class: impl FnOnce() -> bool,
) -> Option<EmbedSource> {
    match (src, channel) {
        (Some(src), _) => {
            embed::is_allowed_player_src(src).then(|| EmbedSource::Player(src.to_owned()))
        }
        (None, Some(channel)) if embed::is_valid_twitch_channel(channel) && has_twitch_class() => {
            Some(EmbedSource::TwitchChannel(channel.to_owned()))
        }
        _ => None,
    }
}
