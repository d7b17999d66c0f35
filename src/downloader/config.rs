// Runtime configuration for the download pipeline

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What to do when the encoder fails on a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncoderFailurePolicy {
    /// Count the video as failed
    Report,
    /// Log a warning and count the video as downloaded
    Tolerate,
}

#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// SOCKS5/HTTP proxy URL, used by yt-dlp and the HTTP fetcher
    pub proxy: Option<String>,
    /// yt-dlp `--socket-timeout`, and connect timeout for fetches
    pub socket_timeout_secs: u32,
    /// Upper bound for one yt-dlp/ffmpeg invocation
    pub process_timeout_secs: u64,
    /// Explicit yt-dlp binary, skips detection
    pub ytdlp_path: Option<PathBuf>,
    /// Explicit ffmpeg binary, skips detection
    pub ffmpeg_path: Option<PathBuf>,
    pub on_merge_failure: EncoderFailurePolicy,
    pub on_transcode_failure: EncoderFailurePolicy,
    /// Playlist members processed at once; 1 keeps playlists strictly sequential
    pub max_concurrent_videos: usize,
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            socket_timeout_secs: 30,
            process_timeout_secs: 3600,
            ytdlp_path: None,
            ffmpeg_path: None,
            on_merge_failure: EncoderFailurePolicy::Report,
            on_transcode_failure: EncoderFailurePolicy::Tolerate,
            max_concurrent_videos: 1,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36".to_string(),
        }
    }
}

impl DownloaderConfig {
    /// Defaults overlaid with `YTDL_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("YTDL_YTDLP_PATH") {
            config.ytdlp_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("YTDL_FFMPEG_PATH") {
            config.ffmpeg_path = Some(PathBuf::from(path));
        }
        if let Ok(proxy) = std::env::var("YTDL_PROXY") {
            if !proxy.trim().is_empty() {
                config.proxy = Some(proxy.trim().to_string());
            }
        }
        if let Ok(n) = std::env::var("YTDL_MAX_CONCURRENT") {
            match n.trim().parse::<usize>() {
                Ok(n) => config = config.with_max_concurrent_videos(n),
                Err(_) => tracing::warn!(value = %n, "ignoring invalid YTDL_MAX_CONCURRENT"),
            }
        }

        config
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_socket_timeout(mut self, seconds: u32) -> Self {
        self.socket_timeout_secs = seconds;
        self
    }

    pub fn with_process_timeout(mut self, seconds: u64) -> Self {
        self.process_timeout_secs = seconds;
        self
    }

    pub fn with_ytdlp_path(mut self, path: Option<PathBuf>) -> Self {
        self.ytdlp_path = path;
        self
    }

    pub fn with_ffmpeg_path(mut self, path: Option<PathBuf>) -> Self {
        self.ffmpeg_path = path;
        self
    }

    pub fn with_merge_failure_policy(mut self, policy: EncoderFailurePolicy) -> Self {
        self.on_merge_failure = policy;
        self
    }

    pub fn with_transcode_failure_policy(mut self, policy: EncoderFailurePolicy) -> Self {
        self.on_transcode_failure = policy;
        self
    }

    /// Clamped to at least 1
    pub fn with_max_concurrent_videos(mut self, n: usize) -> Self {
        self.max_concurrent_videos = n.max(1);
        self
    }
}

/// Where the form should point its directory picker first
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DownloaderConfig::default();
        assert_eq!(config.max_concurrent_videos, 1);
        assert_eq!(config.on_merge_failure, EncoderFailurePolicy::Report);
        assert_eq!(config.on_transcode_failure, EncoderFailurePolicy::Tolerate);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_builder_clamps_concurrency() {
        let config = DownloaderConfig::default()
            .with_max_concurrent_videos(0)
            .with_proxy(Some("socks5h://127.0.0.1:1080".to_string()))
            .with_merge_failure_policy(EncoderFailurePolicy::Tolerate);
        assert_eq!(config.max_concurrent_videos, 1);
        assert_eq!(config.proxy.as_deref(), Some("socks5h://127.0.0.1:1080"));
        assert_eq!(config.on_merge_failure, EncoderFailurePolicy::Tolerate);
    }
}
