// Orchestrator: validate the form, classify the link, dispatch

use std::path::Path;
use std::sync::{Arc, Mutex};

use super::config::DownloaderConfig;
use super::errors::DownloadError;
use super::extractors::YtDlpResolver;
use super::ffmpeg::FfmpegEncoder;
use super::fetcher::HttpStreamFetcher;
use super::models::{DownloadRequest, OrchestratorState, RunReport};
use super::playlist::PlaylistExpander;
use super::traits::{MediaEncoder, StatusSink, StreamFetcher, StreamResolver, TracingStatusSink};
use super::video::VideoDownloader;

const PLAYLIST_PREFIX: &str = "https://www.youtube.com/playlist";
const WATCH_PREFIX: &str = "https://www.youtube.com/watch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Playlist,
    SingleVideo,
    Invalid,
}

/// Substring match, the same test the form has always applied
pub fn classify_link(url: &str) -> LinkKind {
    if url.contains(PLAYLIST_PREFIX) {
        LinkKind::Playlist
    } else if url.contains(WATCH_PREFIX) {
        LinkKind::SingleVideo
    } else {
        LinkKind::Invalid
    }
}

pub fn validate_directory(path: &Path) -> Result<(), DownloadError> {
    if path.as_os_str().is_empty() || !path.is_dir() {
        return Err(DownloadError::InvalidDirectory(path.to_path_buf()));
    }
    Ok(())
}

pub struct Orchestrator {
    resolver: Arc<dyn StreamResolver>,
    videos: VideoDownloader,
    sink: Arc<dyn StatusSink>,
    config: DownloaderConfig,
    state: Mutex<OrchestratorState>,
}

impl Orchestrator {
    /// yt-dlp for resolution, reqwest for bytes, ffmpeg for muxing
    pub fn new(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let fetcher = HttpStreamFetcher::new(&config)?;
        Ok(Self::with_components(
            Arc::new(YtDlpResolver::new(config.clone())),
            Arc::new(fetcher),
            Arc::new(FfmpegEncoder::new(&config)),
            Arc::new(TracingStatusSink),
            config,
        ))
    }

    pub fn with_components(
        resolver: Arc<dyn StreamResolver>,
        fetcher: Arc<dyn StreamFetcher>,
        encoder: Arc<dyn MediaEncoder>,
        sink: Arc<dyn StatusSink>,
        config: DownloaderConfig,
    ) -> Self {
        let videos = VideoDownloader::new(
            resolver.clone(),
            fetcher,
            encoder,
            sink.clone(),
            config.clone(),
        );
        Self {
            resolver,
            videos,
            sink,
            config,
            state: Mutex::new(OrchestratorState::Idle),
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(OrchestratorState::Idle)
    }

    fn transition(&self, state: OrchestratorState) {
        if let Ok(mut current) = self.state.lock() {
            tracing::debug!(from = ?*current, to = ?state, "orchestrator transition");
            *current = state;
        }
    }

    /// Run one submit to completion.
    ///
    /// Only a rejected form (directory or link) or an unresolvable playlist
    /// comes back as `Err`; per-video failures live in the report.
    pub async fn run_downloads(&self, request: &DownloadRequest) -> Result<RunReport, DownloadError> {
        self.transition(OrchestratorState::Validating);
        self.sink.info(
            OrchestratorState::Validating,
            format!("Checking {}", request.source_url),
        );

        let result = self.dispatch(request).await;

        match &result {
            Ok(report) => self.sink.info(
                OrchestratorState::Done,
                format!("Done: {}/{} downloaded", report.succeeded(), report.total()),
            ),
            Err(e) => {
                // A rejected form is shown as-is; anything else failed mid-download
                let mut message = if e.is_per_video() {
                    format!("Failed to download {}: {}", request.source_url, e)
                } else {
                    e.to_string()
                };
                if let Some(hint) = e.hint() {
                    message.push_str(&format!(" ({})", hint));
                }
                self.sink.error(OrchestratorState::Done, message);
            }
        }
        self.transition(OrchestratorState::Done);

        result
    }

    async fn dispatch(&self, request: &DownloadRequest) -> Result<RunReport, DownloadError> {
        validate_directory(&request.target_directory)?;

        match classify_link(&request.source_url) {
            LinkKind::Playlist => {
                self.transition(OrchestratorState::Playlist);
                self.sink.info(OrchestratorState::Playlist, "Downloading playlist".to_string());

                let expander = PlaylistExpander::new(
                    self.resolver.as_ref(),
                    &self.videos,
                    self.sink.as_ref(),
                    self.config.max_concurrent_videos,
                );
                Ok(RunReport::Playlist(expander.run(request).await?))
            }
            LinkKind::SingleVideo => {
                self.transition(OrchestratorState::SingleVideo);
                let outcome = self
                    .videos
                    .download(request, OrchestratorState::SingleVideo)
                    .await;
                Ok(RunReport::Single(outcome))
            }
            LinkKind::Invalid => Err(DownloadError::InvalidLink(request.source_url.clone())),
        }
    }
}
