// Capability traits the pipeline is wired from

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::errors::DownloadError;
use super::models::{
    AudioFormat, OrchestratorState, PlaylistTarget, ResolvedVideo, StatusLevel, StatusUpdate,
    StreamDescriptor,
};

/// Turns links into stream metadata (yt-dlp in production)
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Name of the resolver (for logging)
    fn name(&self) -> &'static str;

    /// Title, streams and best audio-only stream of one video
    async fn resolve(&self, url: &str) -> Result<ResolvedVideo, DownloadError>;

    /// Title and member links of a playlist
    async fn expand_playlist(&self, url: &str) -> Result<PlaylistTarget, DownloadError>;
}

/// Writes a stream's bytes to `directory/default_filename`
#[async_trait]
pub trait StreamFetcher: Send + Sync {
    async fn fetch(
        &self,
        stream: &StreamDescriptor,
        directory: &Path,
    ) -> Result<PathBuf, DownloadError>;
}

/// External encoder (ffmpeg in production)
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Combine a video-only and an audio-only file into `output`, overwriting it
    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DownloadError>;

    /// Convert `input` into `format`; returns the new file's path
    async fn transcode(&self, input: &Path, format: AudioFormat) -> Result<PathBuf, DownloadError>;
}

/// Receives status lines for the UI
pub trait StatusSink: Send + Sync {
    fn emit(&self, update: StatusUpdate);

    fn info(&self, state: OrchestratorState, message: String) {
        self.emit(StatusUpdate {
            state,
            level: StatusLevel::Info,
            message,
        });
    }

    fn warn(&self, state: OrchestratorState, message: String) {
        self.emit(StatusUpdate {
            state,
            level: StatusLevel::Warning,
            message,
        });
    }

    fn error(&self, state: OrchestratorState, message: String) {
        self.emit(StatusUpdate {
            state,
            level: StatusLevel::Error,
            message,
        });
    }
}

/// Default sink: status lines go to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn emit(&self, update: StatusUpdate) {
        match update.level {
            StatusLevel::Info => tracing::info!(state = ?update.state, "{}", update.message),
            StatusLevel::Warning => tracing::warn!(state = ?update.state, "{}", update.message),
            StatusLevel::Error => tracing::error!(state = ?update.state, "{}", update.message),
        }
    }
}

/// Keeps every update, for front-ends that render a log view
#[derive(Debug, Default)]
pub struct CollectingStatusSink {
    updates: Mutex<Vec<StatusUpdate>>,
}

impl CollectingStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.updates
            .lock()
            .map(|u| u.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.updates().into_iter().map(|u| u.message).collect()
    }
}

impl StatusSink for CollectingStatusSink {
    fn emit(&self, update: StatusUpdate) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(update);
        }
    }
}
