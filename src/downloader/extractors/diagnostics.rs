// Extractor failure diagnostics
//
// Maps yt-dlp stderr to the reason a video could not be resolved, so the
// status line can say something more useful than the raw error.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockingReason {
    /// DRM / paid content, never downloadable
    DrmProtected,
    MembersOnly,
    AgeRestricted,
    PrivateVideo,
    /// Deleted, removed or malformed ID
    VideoUnavailable,
    GeoBlocked,
    /// 429 or similar
    RateLimited,
    BotDetection,
    Http403Forbidden,
    NetworkTimeout,
    Unknown,
}

// Checked in order; earlier entries are more specific.
const PATTERNS: &[(BlockingReason, &[&str])] = &[
    (
        BlockingReason::DrmProtected,
        &["drm", "widevine", "playready", "fairplay", "requires purchase", "rental"],
    ),
    (
        BlockingReason::MembersOnly,
        &["members only", "members-only", "join this channel", "available to members"],
    ),
    (
        BlockingReason::AgeRestricted,
        &["age-restricted", "sign in to confirm your age", "age_verification"],
    ),
    (
        BlockingReason::PrivateVideo,
        &["private video", "video is private", "granted access"],
    ),
    (
        BlockingReason::VideoUnavailable,
        &[
            "video unavailable",
            "video has been removed",
            "no longer available",
            "video is unavailable",
            "incomplete youtube id",
            "not a valid url",
            "unsupported url",
            "does not exist",
        ],
    ),
    (
        BlockingReason::GeoBlocked,
        &["not available in your country", "blocked in your country", "geo restrict"],
    ),
    (
        BlockingReason::RateLimited,
        &["429", "rate limit", "too many requests"],
    ),
    (
        BlockingReason::BotDetection,
        &["not a bot", "captcha", "unusual traffic"],
    ),
    (BlockingReason::Http403Forbidden, &["403", "forbidden"]),
    (
        BlockingReason::NetworkTimeout,
        &[
            "timed out",
            "timeout",
            "connection refused",
            "network is unreachable",
            "name or service not known",
            "getaddrinfo failed",
        ],
    ),
];

impl BlockingReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::DrmProtected => "DRM-protected content",
            Self::MembersOnly => "members-only content",
            Self::AgeRestricted => "age-restricted content",
            Self::PrivateVideo => "private video",
            Self::VideoUnavailable => "video unavailable",
            Self::GeoBlocked => "not available in this region",
            Self::RateLimited => "rate limited by YouTube",
            Self::BotDetection => "bot detection triggered",
            Self::Http403Forbidden => "access denied (HTTP 403)",
            Self::NetworkTimeout => "network failure",
            Self::Unknown => "extractor error",
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RateLimited | Self::BotDetection | Self::Http403Forbidden => {
                Some("Wait a while or try again through a proxy (YTDL_PROXY)")
            }
            Self::GeoBlocked => Some("Try a proxy located in a region where the video is available"),
            Self::NetworkTimeout => Some("Check the internet connection and try again"),
            Self::Unknown => Some("Check the link, or update yt-dlp (pip install -U yt-dlp)"),
            _ => None,
        }
    }
}

/// Analyze extractor output and return the blocking reason, if any
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    if error.trim().is_empty() {
        return None;
    }

    let lower = error.to_lowercase();

    let reason = PATTERNS
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
        .map(|(reason, _)| *reason)
        .unwrap_or(BlockingReason::Unknown);

    Some(reason)
}
