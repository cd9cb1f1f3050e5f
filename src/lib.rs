//! Rendering of tournament text fields (descriptions, achievements,
//! operator feedback) into safe HTML fragments with video embeds.
//!
//! Text is split into paragraph and quote blocks, parsed into typed inline
//! spans (with the `[b]`/`[url=..]` dialect for achievement and feedback
//! fields), autolinked, given player embeds for bare video links, written
//! out as HTML and passed through an allowlist sanitizer.
//!
//! ```
//! use tourneytext::{render_field, FieldKind};
//!
//! let html = render_field(Some("[b]Win[/b] vs @caster_one"), FieldKind::Achievement);
//! assert!(html.starts_with("<p><strong>Win</strong> vs "));
//! ```

pub mod abbrev;
pub mod autolink;
pub mod blocks;
pub mod embed;
pub mod escape;
pub mod inject;
pub mod inline;
pub mod markup;
pub mod render;
pub mod sanitize;
pub mod twitch;

pub use autolink::HandleRule;
pub use embed::{classify, EmbedCandidate, EmbedSource, Provider};
pub use inline::Inline;
pub use render::{finish_html, render_field, render_inline, render_record, FieldKind, FieldRecord};
pub use sanitize::sanitize;
