// Single-video path: resolve, select, fetch, normalize, merge/transcode

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::config::{DownloaderConfig, EncoderFailurePolicy};
use super::errors::DownloadError;
use super::filename::normalize_file_name;
use super::format_selector::FormatSelector;
use super::models::{
    AudioFormat, DownloadOutcome, DownloadQuality, DownloadRequest, OrchestratorState,
    ResolvedVideo, StreamDescriptor,
};
use super::mux::{
    merge_streams, merged_container, stage_intermediate, transcode_audio, AUDIO_TEMP_PREFIX,
    VIDEO_TEMP_PREFIX,
};
use super::traits::{MediaEncoder, StatusSink, StreamFetcher, StreamResolver};

/// Processes one video. Never returns an error: every failure ends up in the
/// outcome so callers can keep going.
#[derive(Clone)]
pub struct VideoDownloader {
    resolver: Arc<dyn StreamResolver>,
    fetcher: Arc<dyn StreamFetcher>,
    encoder: Arc<dyn MediaEncoder>,
    sink: Arc<dyn StatusSink>,
    config: DownloaderConfig,
}

impl VideoDownloader {
    pub fn new(
        resolver: Arc<dyn StreamResolver>,
        fetcher: Arc<dyn StreamFetcher>,
        encoder: Arc<dyn MediaEncoder>,
        sink: Arc<dyn StatusSink>,
        config: DownloaderConfig,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            encoder,
            sink,
            config,
        }
    }

    /// `state` tags status updates (SingleVideo, or Playlist for members)
    pub async fn download(
        &self,
        request: &DownloadRequest,
        state: OrchestratorState,
    ) -> DownloadOutcome {
        let url = request.source_url.as_str();

        let video = match self.resolver.resolve(url).await {
            Ok(video) => video,
            Err(e) => return self.failed(url, "", e, state),
        };

        self.sink
            .info(state, format!("Starting download for {}", video.title));

        match self.process(&video, request, state).await {
            Ok(outcome) => outcome,
            Err(e) => self.failed(url, &video.title, e, state),
        }
    }

    fn failed(
        &self,
        url: &str,
        title: &str,
        error: DownloadError,
        state: OrchestratorState,
    ) -> DownloadOutcome {
        let outcome = DownloadOutcome::failed(url, title, &error);
        let mut message = format!("Failed to download {}: {}", outcome.display_name(), error);
        if let Some(hint) = error.hint() {
            message.push_str(&format!(" ({})", hint));
        }
        self.sink.error(state, message);
        outcome
    }

    async fn process(
        &self,
        video: &ResolvedVideo,
        request: &DownloadRequest,
        state: OrchestratorState,
    ) -> Result<DownloadOutcome, DownloadError> {
        let target = FormatSelector::select(video, request)?;
        let directory = request.target_directory.as_path();
        let url = request.source_url.as_str();

        match (target.chosen_video_stream, target.chosen_audio_stream) {
            (None, Some(audio)) => {
                self.download_audio(url, video, &audio, request.audio_format, directory, state)
                    .await
            }
            (Some(stream), Some(audio)) => {
                self.download_merged(url, video, &stream, &audio, target.quality, directory, state)
                    .await
            }
            (Some(stream), None) => {
                let final_path = self.fetch_normalized(&stream, directory).await?;
                let message = match target.quality {
                    DownloadQuality::Fallback => format!(
                        "Couldn't find a 4K or HD version, downloaded '{}' to {}",
                        video.title,
                        directory.display()
                    ),
                    quality => format!(
                        "Successfully downloaded '{}' in {} to {}",
                        video.title,
                        quality,
                        directory.display()
                    ),
                };
                self.sink.info(state, message);
                Ok(DownloadOutcome::succeeded(url, &video.title, final_path, target.quality))
            }
            (None, None) => Err(DownloadError::NoSuitableStream(video.title.clone())),
        }
    }

    /// Fetch, then strip spaces from the name. Nothing is left behind on error.
    async fn fetch_normalized(
        &self,
        stream: &StreamDescriptor,
        directory: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let fetched = self.fetcher.fetch(stream, directory).await?;
        match normalize_file_name(&fetched) {
            Ok(path) => Ok(path),
            Err(e) => {
                let _ = tokio::fs::remove_file(&fetched).await;
                Err(e)
            }
        }
    }

    async fn download_audio(
        &self,
        url: &str,
        video: &ResolvedVideo,
        audio: &StreamDescriptor,
        format: AudioFormat,
        directory: &Path,
        state: OrchestratorState,
    ) -> Result<DownloadOutcome, DownloadError> {
        let source = self.fetch_normalized(audio, directory).await?;

        let final_path = match transcode_audio(self.encoder.as_ref(), &source, format).await {
            Ok(path) => path,
            Err(e) if self.config.on_transcode_failure == EncoderFailurePolicy::Tolerate => {
                self.sink.warn(
                    state,
                    format!(
                        "Could not convert '{}' to {}, kept {}: {}",
                        video.title,
                        format,
                        source.display(),
                        e
                    ),
                );
                source
            }
            Err(e) => return Err(e),
        };

        self.sink.info(
            state,
            format!(
                "Successfully downloaded the audio from {} to {}",
                video.title,
                directory.display()
            ),
        );
        Ok(DownloadOutcome::succeeded(
            url,
            &video.title,
            final_path,
            DownloadQuality::Audio(format),
        ))
    }

    #[allow(clippy::too_many_arguments)]
    async fn download_merged(
        &self,
        url: &str,
        video: &ResolvedVideo,
        stream: &StreamDescriptor,
        audio: &StreamDescriptor,
        quality: DownloadQuality,
        directory: &Path,
        state: OrchestratorState,
    ) -> Result<DownloadOutcome, DownloadError> {
        let fetched = self.fetch_normalized(stream, directory).await?;
        let video_temp = match stage_intermediate(&fetched, VIDEO_TEMP_PREFIX).await {
            Ok(path) => path,
            Err(e) => {
                let _ = tokio::fs::remove_file(&fetched).await;
                return Err(e);
            }
        };
        // Normalized video name, in a container that takes both codecs as-is
        let output = fetched.with_extension(merged_container(stream, audio));

        let audio_temp = match self.fetch_normalized(audio, directory).await {
            Ok(path) => stage_intermediate(&path, AUDIO_TEMP_PREFIX).await,
            Err(e) => Err(e),
        };
        let audio_temp = match audio_temp {
            Ok(path) => path,
            Err(e) => {
                let _ = tokio::fs::remove_file(&video_temp).await;
                return Err(e);
            }
        };

        match merge_streams(self.encoder.as_ref(), &video_temp, &audio_temp, &output).await {
            Ok(final_path) => {
                self.sink.info(
                    state,
                    format!(
                        "Successfully downloaded '{}' in {} to {}",
                        video.title,
                        quality,
                        directory.display()
                    ),
                );
                Ok(DownloadOutcome::succeeded(url, &video.title, final_path, quality))
            }
            Err(e) if self.config.on_merge_failure == EncoderFailurePolicy::Tolerate => {
                self.sink.warn(
                    state,
                    format!("Merge failed for '{}', counted as processed: {}", video.title, e),
                );
                Ok(DownloadOutcome::tolerated(url, &video.title, quality, &e))
            }
            Err(e) => Err(e),
        }
    }
}
