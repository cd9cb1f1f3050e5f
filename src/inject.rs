//! Replacing bare pasted video links with player embeds.
//!
//! Only links whose visible text is their own href are candidates. A link
//! with custom text stays a link. Repeated URLs embed at every occurrence.

use crate::embed;
use crate::inline::{self, Inline};
use crate::sanitize;
use tracing::debug;

pub fn inject_embeds(spans: Vec<Inline>) -> Vec<Inline> {
    spans.into_iter().map(inject_span).collect()
}

fn inject_span(span: Inline) -> Inline {
    match span {
        Inline::Strong(children) => Inline::Strong(inject_embeds(children)),
        Inline::Emphasis(children) => Inline::Emphasis(inject_embeds(children)),
        link @ Inline::Link { .. } if link.is_bare_link() => {
            let Inline::Link { href, .. } = &link else {
                return link;
            };

            match embed::classify(href) {
                Some(candidate) => {
                    debug!(
                        "embedding {} link {}",
                        candidate.provider.as_str(),
                        candidate.url
                    );
                    metrics::counter!("embeds_injected_total", "provider" => candidate.provider.as_str())
                        .increment(1);
                    Inline::Embed(candidate.source)
                }
                None => link,
            }
        }
        other => other,
    }
}

/// Inject embeds into an HTML fragment. The fragment is read through the
/// sanitizer's parser, so the result only holds allowlisted markup.
pub fn inject_embeds_html(html: &str) -> String {
    let spans = sanitize::parse_fragment(html);
    inline::to_html(&inject_embeds(spans))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::EmbedSource;

    #[test]
    fn test_bare_youtube_link_embeds() {
        let spans = inject_embeds(vec![Inline::link(
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
        )]);
        assert_eq!(
            spans,
            vec![Inline::Embed(EmbedSource::Player(
                "https://www.youtube.com/embed/dQw4w9WgXcQ".into()
            ))]
        );
    }

    #[test]
    fn test_labelled_link_stays_a_link() {
        let link = Inline::link("https://youtu.be/dQw4w9WgXcQ", "highlights");
        assert_eq!(inject_embeds(vec![link.clone()]), vec![link]);
    }

    #[test]
    fn test_unknown_bare_link_stays_a_link() {
        let link = Inline::link("https://x.test/clip", "https://x.test/clip");
        assert_eq!(inject_embeds(vec![link.clone()]), vec![link]);
    }

    #[test]
    fn test_repeats_embed_every_time() {
        let link = Inline::link("https://twitch.tv/caster", "https://twitch.tv/caster");
        let spans = inject_embeds(vec![
            link.clone(),
            Inline::Strong(vec![link]),
        ]);
        let channel = Inline::Embed(EmbedSource::TwitchChannel("caster".into()));
        assert_eq!(spans, vec![channel.clone(), Inline::Strong(vec![channel])]);
    }

    #[test]
    fn test_inject_html() {
        let html = inject_embeds_html(
            r#"<a href="https://youtu.be/dQw4w9WgXcQ">https://youtu.be/dQw4w9WgXcQ</a> and <a href="https://youtu.be/dQw4w9WgXcQ">label</a>"#,
        );
        assert!(html.starts_with(r#"<iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ""#));
        assert!(html.ends_with(
            r#" and <a href="https://youtu.be/dQw4w9WgXcQ" target="_blank" rel="noopener">label</a>"#
        ));
    }
}
