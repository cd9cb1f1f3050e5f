//! Video provider URL classification.
//!
//! Turns a user-facing video URL into the canonical form the provider's
//! embeddable player expects. The same shape predicates are used by the
//! sanitizer to decide which iframes survive, so anything recognized here
//! is guaranteed to be kept there.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use url::Url;

/// Class carried by Twitch placeholders. The client runtime fills in `src`.
pub const TWITCH_EMBED_CLASS: &str = "js-twitch-embed";

static YOUTUBE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());
static TWITCH_CHANNEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{2,30}$").unwrap());
static VK_VIDEO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/?video(-?\d+)_(\d+)").unwrap());
static RUTUBE_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{32}$").unwrap());

static YOUTUBE_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://www\.youtube\.com/embed/[A-Za-z0-9_-]{11}$").unwrap()
});
static VK_VIDEO_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://vk\.com/video_ext\.php\?oid=-?\d+&id=\d+&hd=2$").unwrap()
});
static RUTUBE_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://rutube\.ru/play/embed/[0-9a-f]{32}$").unwrap());
static VK_PLAY_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^https?://(?:[a-z0-9-]+\.)*vkplay\.(?:live|ru)(?:[/?#][^\s"'<>\\]*)?$"#)
        .unwrap()
});

/// First path segments on twitch.tv that are site sections, not channels.
const TWITCH_RESERVED: &[&str] = &[
    "directory",
    "downloads",
    "jobs",
    "p",
    "search",
    "settings",
    "subscriptions",
    "turbo",
    "videos",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    YouTube,
    Twitch,
    VkVideo,
    VkPlay,
    RuTube,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::YouTube => "youtube",
            Provider::Twitch => "twitch",
            Provider::VkVideo => "vk-video",
            Provider::VkPlay => "vk-play",
            Provider::RuTube => "rutube",
        }
    }
}

/// Where an embed points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedSource {
    /// A complete player URL, usable as an iframe `src`.
    Player(String),

    /// A Twitch channel. The player URL needs a `parent` parameter bound to
    /// the serving hostname, which is only known when the page is served.
    TwitchChannel(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedCandidate {
    pub url: String,
    pub provider: Provider,
    pub source: EmbedSource,
}

impl EmbedCandidate {
    /// The canonical player URL. `None` for Twitch, whose URL is completed
    /// at render time.
    pub fn canonical_embed_url(&self) -> Option<&str> {
        match &self.source {
            EmbedSource::Player(src) => Some(src),
            EmbedSource::TwitchChannel(_) => None,
        }
    }
}

/// Classify a URL as a known video embed.
///
/// URLs without a scheme are parsed as `https://`. Providers are tried in a
/// fixed order (YouTube, Twitch, VK Video, RuTube, VK Play) and the first
/// match wins. Anything unparseable is simply not an embed.
pub fn classify(url: &str) -> Option<EmbedCandidate> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let full: Cow<str> = if has_http_scheme(url) {
        Cow::Borrowed(url)
    } else {
        Cow::Owned(format!("https://{url}"))
    };

    let parsed = Url::parse(&full).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();

    let (provider, source) = if let Some(src) = youtube(&parsed, &host) {
        (Provider::YouTube, EmbedSource::Player(src))
    } else if let Some(channel) = twitch(&parsed, &host) {
        (Provider::Twitch, EmbedSource::TwitchChannel(channel))
    } else if let Some(src) = vk_video(&parsed, &host) {
        (Provider::VkVideo, EmbedSource::Player(src))
    } else if let Some(src) = rutube(&parsed, &host) {
        (Provider::RuTube, EmbedSource::Player(src))
    } else if is_vk_play_host(&host) {
        (Provider::VkPlay, EmbedSource::Player(full.to_string()))
    } else {
        return None;
    };

    if !is_allowed_source(&source) {
        return None;
    }

    Some(EmbedCandidate {
        url: url.to_owned(),
        provider,
        source,
    })
}

/// Is `src` one of the canonical player URL shapes?
pub fn is_allowed_player_src(src: &str) -> bool {
    YOUTUBE_SRC_RE.is_match(src)
        || VK_VIDEO_SRC_RE.is_match(src)
        || RUTUBE_SRC_RE.is_match(src)
        || VK_PLAY_SRC_RE.is_match(src)
}

pub fn is_valid_twitch_channel(channel: &str) -> bool {
    TWITCH_CHANNEL_RE.is_match(channel)
}

pub fn is_allowed_source(source: &EmbedSource) -> bool {
    match source {
        EmbedSource::Player(src) => is_allowed_player_src(src),
        EmbedSource::TwitchChannel(channel) => is_valid_twitch_channel(channel),
    }
}

fn has_http_scheme(url: &str) -> bool {
    let prefix = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    prefix.starts_with("http://") || prefix.starts_with("https://")
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

fn youtube(url: &Url, host: &str) -> Option<String> {
    let id = if host == "youtu.be" || host == "www.youtu.be" {
        path_segments(url).first()?.to_string()
    } else if host.contains("youtube.com") {
        match query_param(url, "v") {
            Some(v) => v,
            None => match path_segments(url).as_slice() {
                ["shorts" | "embed" | "live", id, ..] => id.to_string(),
                _ => return None,
            },
        }
    } else {
        return None;
    };

    YOUTUBE_ID_RE
        .is_match(&id)
        .then(|| format!("https://www.youtube.com/embed/{id}"))
}

fn twitch(url: &Url, host: &str) -> Option<String> {
    if !matches!(host, "twitch.tv" | "www.twitch.tv" | "m.twitch.tv") {
        return None;
    }

    let channel = *path_segments(url).first()?;
    if TWITCH_RESERVED.contains(&channel.to_ascii_lowercase().as_str()) {
        return None;
    }

    is_valid_twitch_channel(channel).then(|| channel.to_owned())
}

fn vk_video(url: &Url, host: &str) -> Option<String> {
    let is_vk = host == "vk.com" || host.ends_with(".vk.com") || host.ends_with("vkvideo.ru");
    if !is_vk {
        return None;
    }

    let from_path = VK_VIDEO_RE.captures(url.path());
    let z = query_param(url, "z");
    let caps = match from_path {
        Some(caps) => caps,
        None => VK_VIDEO_RE.captures(z.as_deref()?)?,
    };

    Some(format!(
        "https://vk.com/video_ext.php?oid={}&id={}&hd=2",
        &caps[1], &caps[2]
    ))
}

fn rutube(url: &Url, host: &str) -> Option<String> {
    if host != "rutube.ru" && host != "www.rutube.ru" {
        return None;
    }

    match path_segments(url).as_slice() {
        ["video", id, ..] => {
            let id = id.to_ascii_lowercase();
            RUTUBE_ID_RE
                .is_match(&id)
                .then(|| format!("https://rutube.ru/play/embed/{id}"))
        }
        _ => None,
    }
}

fn is_vk_play_host(host: &str) -> bool {
    ["vkplay.live", "vkplay.ru"]
        .iter()
        .any(|base| host == *base || host.ends_with(&format!(".{base}")))
}
