//! Per-field rendering: choosing the pipeline for a field and wrapping its
//! blocks in containers.

use crate::autolink::{self, HandleRule};
use crate::blocks;
use crate::inject;
use crate::inline::{self, Inline};
use crate::markup;
use crate::sanitize;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Which dialect a text field is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Achievement,
    Perc,
    #[default]
    #[serde(other)]
    Default,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Achievement => "achievement",
            FieldKind::Perc => "perc",
            FieldKind::Default => "default",
        }
    }

    /// Achievement and feedback text understands `[b]`/`[url=..]` markup.
    pub fn uses_markup(&self) -> bool {
        matches!(self, FieldKind::Achievement | FieldKind::Perc)
    }

    pub fn handle_rule(&self) -> HandleRule {
        if self.uses_markup() {
            HandleRule::Telegram
        } else {
            HandleRule::General
        }
    }
}

/// A text field as the data layer hands it over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<FieldKind>,
}

impl FieldRecord {
    pub fn new(text: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            text: Some(text.into()),
            kind: Some(kind),
        }
    }
}

/// Render one field to a sanitized HTML fragment. Absent text renders as
/// nothing.
pub fn render_field(text: Option<&str>, kind: FieldKind) -> String {
    let mut out = String::new();

    for block in blocks::segment(text.unwrap_or_default()) {
        let tag = block.kind.tag();
        let inner = render_inline(&block.content, kind);
        let _ = write!(out, "<{tag}>{inner}</{tag}>");
    }

    out
}

pub fn render_record(record: &FieldRecord) -> String {
    render_field(record.text.as_deref(), record.kind.unwrap_or_default())
}

/// Render the content of a single block, without a container.
pub fn render_inline(text: &str, kind: FieldKind) -> String {
    let spans = if kind.uses_markup() {
        markup::parse(text)
    } else {
        vec![Inline::text(text)]
    };

    let spans = autolink::linkify(spans, kind.handle_rule());
    let spans = inline::break_lines(spans);
    let spans = inject::inject_embeds(spans);

    sanitize::sanitize(&inline::to_html(&spans))
}

/// Embed injection followed by sanitization, for content that is already
/// HTML. Running it on its own output changes nothing.
pub fn finish_html(html: &str) -> String {
    sanitize::sanitize(&inject::inject_embeds_html(html))
}
