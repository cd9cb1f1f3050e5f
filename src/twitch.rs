//! Finishing Twitch embeds.
//!
//! Twitch refuses to play unless the player URL names the embedding page's
//! hostname as `parent`, so rendered fragments only carry a `data-channel`
//! placeholder. Pages either include [`BOOTSTRAP_JS`] once, or build the
//! URL with [`player_src`] when they know their hostname at request time.

use crate::embed;
use url::{Host, Url};

const PLAYER_URL: &str = "https://player.twitch.tv/";

/// Fills in `src` on every placeholder that doesn't have one yet, using
/// the current page's hostname.
pub const BOOTSTRAP_JS: &str = r#"(function () {
  "use strict";
  var CHANNEL_RE = /^[A-Za-z0-9_]{2,30}$/;

  function fill() {
    var parent = window.location.hostname;
    var frames = document.querySelectorAll("iframe.js-twitch-embed[data-channel]");
    for (var i = 0; i < frames.length; i++) {
      var frame = frames[i];
      var channel = frame.getAttribute("data-channel");
      if (frame.getAttribute("src") || !CHANNEL_RE.test(channel)) {
        continue;
      }
      frame.setAttribute(
        "src",
        "https://player.twitch.tv/?channel=" + encodeURIComponent(channel) +
          "&parent=" + encodeURIComponent(parent)
      );
    }
  }

  if (document.readyState === "loading") {
    document.addEventListener("DOMContentLoaded", fill);
  } else {
    fill();
  }
})();
"#;

/// Player URL for `channel` embedded on `parent_host`. `None` if either is
/// not usable.
pub fn player_src(channel: &str, parent_host: &str) -> Option<String> {
    if !embed::is_valid_twitch_channel(channel) {
        return None;
    }
    let parent = Host::parse(parent_host.trim()).ok()?;

    let mut url = Url::parse(PLAYER_URL).ok()?;
    url.query_pairs_mut()
        .append_pair("channel", channel)
        .append_pair("parent", &parent.to_string());

    Some(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_src() {
        assert_eq!(
            player_src("caster", "cups.example.org").as_deref(),
            Some("https://player.twitch.tv/?channel=caster&parent=cups.example.org")
        );
        assert_eq!(
            player_src("caster", "localhost").as_deref(),
            Some("https://player.twitch.tv/?channel=caster&parent=localhost")
        );
    }

    #[test]
    fn test_player_src_rejects_bad_input() {
        assert_eq!(player_src("c", "cups.example.org"), None);
        assert_eq!(player_src("bad channel", "cups.example.org"), None);
        assert_eq!(player_src("caster", ""), None);
        assert_eq!(player_src("caster", "evil host/path"), None);
    }

    #[test]
    fn test_script_targets_placeholders() {
        let selector = format!("iframe.{}[data-channel]", embed::TWITCH_EMBED_CLASS);
        assert!(BOOTSTRAP_JS.contains(&selector));
        assert!(BOOTSTRAP_JS.contains(PLAYER_URL));
    }
}
