// Common data models for the download pipeline

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DownloadError;

/// Audio container for audio-only downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Flac,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Flac => "flac",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "wav" => Ok(Self::Wav),
            "flac" => Ok(Self::Flac),
            other => Err(format!("Unsupported audio format: {}", other)),
        }
    }
}

/// Highest resolution the user allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionCap {
    #[default]
    #[serde(rename = "4K")]
    Uhd4k,
    #[serde(rename = "1080p")]
    Hd1080,
}

impl ResolutionCap {
    /// Resolution label of the adaptive stream this cap selects
    pub fn resolution_label(&self) -> &'static str {
        match self {
            Self::Uhd4k => "2160p",
            Self::Hd1080 => "1080p",
        }
    }
}

impl fmt::Display for ResolutionCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uhd4k => write!(f, "4K"),
            Self::Hd1080 => write!(f, "1080p"),
        }
    }
}

impl FromStr for ResolutionCap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "4k" | "2160p" => Ok(Self::Uhd4k),
            "1080p" | "hd" => Ok(Self::Hd1080),
            other => Err(format!("Unsupported resolution cap: {}", other)),
        }
    }
}

/// Everything the form collects, captured once on submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub source_url: String,
    pub target_directory: PathBuf,
    pub audio_only: bool,
    pub audio_format: AudioFormat,
    pub resolution_cap: ResolutionCap,
}

impl DownloadRequest {
    pub fn new(source_url: impl Into<String>, target_directory: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into().trim().to_string(),
            target_directory: target_directory.into(),
            audio_only: false,
            audio_format: AudioFormat::default(),
            resolution_cap: ResolutionCap::default(),
        }
    }

    pub fn with_audio_only(mut self, format: AudioFormat) -> Self {
        self.audio_only = true;
        self.audio_format = format;
        self
    }

    pub fn with_resolution_cap(mut self, cap: ResolutionCap) -> Self {
        self.resolution_cap = cap;
        self
    }

    /// Same options, different video (used for playlist members)
    pub fn for_member(&self, url: &str) -> Self {
        Self {
            source_url: url.to_string(),
            ..self.clone()
        }
    }
}

/// How a stream carries its media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    /// Video and audio in one file
    Progressive,
    /// Video only, needs a separate audio stream
    AdaptiveVideo,
    /// Audio only
    AdaptiveAudio,
}

/// One retrievable stream of a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Extractor format ID (e.g., "137", "140")
    pub format_id: String,
    pub kind: StreamKind,
    /// Resolution label ("2160p", "1080p"); None for audio-only
    pub resolution: Option<String>,
    pub height: Option<u32>,
    /// File extension (mp4, webm, m4a)
    pub extension: String,
    /// Sanitized title plus extension
    pub default_filename: String,
    /// Direct media URL used to fetch the bytes
    pub url: String,
    pub filesize: Option<u64>,
    /// Audio bitrate in kbps
    pub abr: Option<f32>,
    pub acodec: Option<String>,
}

impl StreamDescriptor {
    pub fn is_progressive(&self) -> bool {
        self.kind == StreamKind::Progressive
    }

    pub fn is_audio_only(&self) -> bool {
        self.kind == StreamKind::AdaptiveAudio
    }

    /// Check if audio is AAC (m4a)
    pub fn is_aac(&self) -> bool {
        self.acodec
            .as_ref()
            .map_or(false, |a| a.starts_with("mp4a"))
            || self.extension == "m4a"
    }

    /// Audio the WebM muxer accepts (Opus or Vorbis)
    pub fn is_webm_audio(&self) -> bool {
        self.acodec
            .as_deref()
            .map_or(self.extension == "webm", |a| a.starts_with("opus") || a.starts_with("vorbis"))
    }
}

/// Output of stream resolution for one video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedVideo {
    pub video_id: String,
    pub title: String,
    pub streams: Vec<StreamDescriptor>,
    pub audio_only_stream: Option<StreamDescriptor>,
}

/// Streams chosen for one video
#[derive(Debug, Clone)]
pub struct VideoTarget {
    pub title: String,
    pub chosen_video_stream: Option<StreamDescriptor>,
    pub chosen_audio_stream: Option<StreamDescriptor>,
    pub quality: DownloadQuality,
}

/// Playlist title and its member links, in playlist order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTarget {
    pub title: String,
    pub member_urls: Vec<String>,
}

/// Which branch produced the final file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadQuality {
    Uhd4k,
    Hd1080,
    /// Highest-resolution combined stream, no merge
    Fallback,
    Audio(AudioFormat),
}

impl fmt::Display for DownloadQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uhd4k => write!(f, "4K"),
            Self::Hd1080 => write!(f, "HD"),
            Self::Fallback => write!(f, "highest available resolution"),
            Self::Audio(format) => write!(f, "audio ({})", format),
        }
    }
}

/// Result of processing a single video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub source_url: String,
    pub video_title: String,
    pub success: bool,
    pub final_path: Option<PathBuf>,
    pub quality: Option<DownloadQuality>,
    pub error: Option<String>,
}

impl DownloadOutcome {
    pub fn succeeded(
        source_url: &str,
        title: &str,
        final_path: PathBuf,
        quality: DownloadQuality,
    ) -> Self {
        Self {
            source_url: source_url.to_string(),
            video_title: title.to_string(),
            success: true,
            final_path: Some(final_path),
            quality: Some(quality),
            error: None,
        }
    }

    /// Encoder failure counted as processed; there is no final file
    pub fn tolerated(
        source_url: &str,
        title: &str,
        quality: DownloadQuality,
        error: &DownloadError,
    ) -> Self {
        Self {
            source_url: source_url.to_string(),
            video_title: title.to_string(),
            success: true,
            final_path: None,
            quality: Some(quality),
            error: Some(error.to_string()),
        }
    }

    /// `title` is empty when the video never resolved
    pub fn failed(source_url: &str, title: &str, error: &DownloadError) -> Self {
        Self {
            source_url: source_url.to_string(),
            video_title: title.to_string(),
            success: false,
            final_path: None,
            quality: None,
            error: Some(error.to_string()),
        }
    }

    /// Title if known, otherwise the link
    pub fn display_name(&self) -> &str {
        if self.video_title.is_empty() {
            &self.source_url
        } else {
            &self.video_title
        }
    }
}

/// Per-member outcomes of a playlist run, in playlist order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub title: String,
    pub outcomes: Vec<DownloadOutcome>,
}

impl PlaylistSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// What a submit produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunReport {
    Single(DownloadOutcome),
    Playlist(PlaylistSummary),
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        match self {
            Self::Single(outcome) => usize::from(outcome.success),
            Self::Playlist(summary) => summary.succeeded(),
        }
    }

    pub fn total(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Playlist(summary) => summary.total(),
        }
    }
}

/// Orchestrator lifecycle, reported with every status update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorState {
    Idle,
    Validating,
    SingleVideo,
    Playlist,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Status line for the UI collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub state: OrchestratorState,
    pub level: StatusLevel,
    pub message: String,
}
