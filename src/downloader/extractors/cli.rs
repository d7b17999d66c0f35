// yt-dlp backed stream resolver
//
// Runs the native `yt-dlp` binary in JSON mode and maps its format list to
// stream descriptors. Only formats with a direct HTTP url are kept, since the
// fetcher downloads a single body per stream.

use std::ffi::OsString;
use std::path::PathBuf;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use crate::downloader::config::DownloaderConfig;
use crate::downloader::errors::DownloadError;
use crate::downloader::filename::default_filename;
use crate::downloader::models::{PlaylistTarget, ResolvedVideo, StreamDescriptor, StreamKind};
use crate::downloader::tools::{ToolManager, ToolType};
use crate::downloader::traits::StreamResolver;
use crate::downloader::utils::{get_proxy_args, get_timeout_args, run_output_with_timeout};

lazy_static! {
    static ref NOTE_RES_RE: Regex = Regex::new(r"^(\d{3,4})p").unwrap();
}

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

pub struct YtDlpResolver {
    ytdlp_path: PathBuf,
    config: DownloaderConfig,
}

impl YtDlpResolver {
    pub fn new(config: DownloaderConfig) -> Self {
        let ytdlp_path = ToolManager::from_config(&config).command_path(ToolType::YtDlp);
        Self { ytdlp_path, config }
    }

    /// Build command arguments shared by both calls
    fn base_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--no-warnings".into(),
            "--retries".into(),
            "0".into(),
            "--user-agent".into(),
            self.config.user_agent.clone().into(),
        ];
        args.extend(get_timeout_args(&self.config));
        args.extend(get_proxy_args(&self.config));
        args
    }

    async fn run_json(&self, url: &str, mode_args: &[&str]) -> Result<serde_json::Value, DownloadError> {
        let mut args: Vec<OsString> = mode_args.iter().map(OsString::from).collect();
        args.extend(self.base_args());
        args.push(url.into());

        tracing::debug!(
            ytdlp = %self.ytdlp_path.display(),
            args = ?args,
            "running extractor"
        );

        let output = run_output_with_timeout(
            &self.ytdlp_path,
            args,
            self.config.socket_timeout_secs as u64 * 4,
        )
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(%url, status = ?output.status.code(), "yt-dlp failed: {}", stderr.trim());
            return Err(DownloadError::resolution(url, &stderr));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON from yt-dlp: {}", e)))
    }

    /// Map a `--dump-json` document to a resolved video
    pub fn parse_video(json: &serde_json::Value) -> Result<ResolvedVideo, DownloadError> {
        let title = json["title"].as_str().unwrap_or("Unknown").to_string();
        let formats = json["formats"]
            .as_array()
            .ok_or_else(|| DownloadError::ParseError("No formats array in JSON".to_string()))?;

        let streams: Vec<StreamDescriptor> = formats
            .iter()
            .filter_map(|f| Self::parse_format(f, &title))
            .collect();

        let audio_only_stream = Self::best_audio(&streams).cloned();

        Ok(ResolvedVideo {
            video_id: json["id"].as_str().unwrap_or("unknown").to_string(),
            title,
            streams,
            audio_only_stream,
        })
    }

    fn parse_format(f: &serde_json::Value, title: &str) -> Option<StreamDescriptor> {
        let url = f["url"].as_str()?;
        let protocol = f["protocol"].as_str().unwrap_or("https");
        if !protocol.starts_with("http") {
            // m3u8 / dash / mhtml storyboards
            return None;
        }

        let vcodec = f["vcodec"].as_str();
        let acodec = f["acodec"].as_str();
        let height = f["height"].as_u64().map(|h| h as u32);

        let has_video = vcodec.map_or(height.is_some(), |v| v != "none");
        let has_audio = acodec.map_or(false, |a| a != "none");

        let kind = match (has_video, has_audio) {
            (true, true) => StreamKind::Progressive,
            (true, false) => StreamKind::AdaptiveVideo,
            (false, true) => StreamKind::AdaptiveAudio,
            (false, false) => return None,
        };

        let resolution = if has_video {
            Self::resolution_label(f["format_note"].as_str(), height)
        } else {
            None
        };

        let ext = f["ext"].as_str().unwrap_or("mp4").to_string();

        Some(StreamDescriptor {
            format_id: f["format_id"].as_str().unwrap_or("").to_string(),
            kind,
            resolution,
            height,
            default_filename: default_filename(title, &ext),
            extension: ext,
            url: url.to_string(),
            filesize: f["filesize"].as_u64().or_else(|| f["filesize_approx"].as_u64()),
            abr: f["abr"].as_f64().map(|a| a as f32),
            acodec: acodec.map(str::to_string),
        })
    }

    /// "2160p60" and "2160p" both label as "2160p"; falls back to the pixel height
    fn resolution_label(format_note: Option<&str>, height: Option<u32>) -> Option<String> {
        format_note
            .and_then(|note| NOTE_RES_RE.captures(note))
            .map(|caps| format!("{}p", &caps[1]))
            .or_else(|| height.map(|h| format!("{}p", h)))
    }

    /// Best audio-only stream (prefer AAC for compatibility)
    pub fn best_audio(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
        let by_bitrate = |s: &&StreamDescriptor| s.abr.map(|b| (b * 100.0) as u32).unwrap_or(0);

        let audio = || streams.iter().filter(|s| s.is_audio_only());

        audio()
            .filter(|s| s.is_aac())
            .max_by_key(by_bitrate)
            .or_else(|| audio().max_by_key(by_bitrate))
    }

    /// Map a `--flat-playlist --dump-single-json` document to member links
    pub fn parse_playlist(json: &serde_json::Value) -> Result<PlaylistTarget, DownloadError> {
        let entries = json["entries"]
            .as_array()
            .ok_or_else(|| DownloadError::ParseError("No entries array in JSON".to_string()))?;

        let member_urls = entries
            .iter()
            .filter_map(|entry| {
                let url = entry["url"].as_str().filter(|u| u.starts_with("http"));
                match url {
                    Some(u) => Some(u.to_string()),
                    None => entry["id"].as_str().map(|id| format!("{}{}", WATCH_URL, id)),
                }
            })
            .collect();

        Ok(PlaylistTarget {
            title: json["title"].as_str().unwrap_or("Untitled playlist").to_string(),
            member_urls,
        })
    }
}

#[async_trait]
impl StreamResolver for YtDlpResolver {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedVideo, DownloadError> {
        let json = self.run_json(url, &["--dump-json", "--no-playlist"]).await?;
        let video = Self::parse_video(&json)?;
        tracing::debug!(
            title = %video.title,
            streams = video.streams.len(),
            has_audio = video.audio_only_stream.is_some(),
            "resolved video"
        );
        Ok(video)
    }

    async fn expand_playlist(&self, url: &str) -> Result<PlaylistTarget, DownloadError> {
        let json = self
            .run_json(url, &["--flat-playlist", "--dump-single-json"])
            .await?;
        Self::parse_playlist(&json)
    }
}
