// In-memory capabilities for tests

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::errors::DownloadError;
use super::filename::default_filename;
use super::models::{AudioFormat, PlaylistTarget, ResolvedVideo, StreamDescriptor, StreamKind};
use super::traits::{MediaEncoder, StreamFetcher, StreamResolver};

pub fn make_stream(
    title: &str,
    id: &str,
    kind: StreamKind,
    height: Option<u32>,
    ext: &str,
) -> StreamDescriptor {
    StreamDescriptor {
        format_id: id.to_string(),
        kind,
        resolution: height.map(|h| format!("{}p", h)),
        height,
        extension: ext.to_string(),
        default_filename: default_filename(title, ext),
        url: format!("https://media.example/{}", id),
        filesize: None,
        abr: (kind == StreamKind::AdaptiveAudio).then_some(128.0),
        acodec: (kind != StreamKind::AdaptiveVideo).then(|| "mp4a.40.2".to_string()),
    }
}

/// Adaptive video at each of `heights`, a 720p progressive stream and an m4a audio stream
pub fn make_video(title: &str, heights: &[u32]) -> ResolvedVideo {
    let mut streams: Vec<StreamDescriptor> = heights
        .iter()
        .map(|h| make_stream(title, &format!("v{}", h), StreamKind::AdaptiveVideo, Some(*h), "mp4"))
        .collect();
    streams.push(make_stream(title, "p720", StreamKind::Progressive, Some(720), "mp4"));

    let audio = make_stream(title, "a140", StreamKind::AdaptiveAudio, None, "m4a");
    streams.push(audio.clone());

    ResolvedVideo {
        video_id: title.to_lowercase().replace(' ', "-"),
        title: title.to_string(),
        streams,
        audio_only_stream: Some(audio),
    }
}

#[derive(Default)]
pub struct ScriptedResolver {
    videos: HashMap<String, ResolvedVideo>,
    playlists: HashMap<String, PlaylistTarget>,
    resolve_calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, url: &str, video: ResolvedVideo) -> Self {
        self.videos.insert(url.to_string(), video);
        self
    }

    pub fn with_playlist(mut self, url: &str, title: &str, members: &[&str]) -> Self {
        self.playlists.insert(
            url.to_string(),
            PlaylistTarget {
                title: title.to_string(),
                member_urls: members.iter().map(|m| m.to_string()).collect(),
            },
        );
        self
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamResolver for ScriptedResolver {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedVideo, DownloadError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.videos.get(url).cloned().ok_or_else(|| {
            DownloadError::resolution(url, "ERROR: [youtube] Video unavailable")
        })
    }

    async fn expand_playlist(&self, url: &str) -> Result<PlaylistTarget, DownloadError> {
        self.playlists.get(url).cloned().ok_or_else(|| {
            DownloadError::resolution(url, "ERROR: [youtube:tab] The playlist does not exist.")
        })
    }
}

/// Writes the format ID as the file body; fails for IDs in `failing`
#[derive(Default)]
pub struct CountingFetcher {
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, format_id: &str) -> Self {
        self.failing.insert(format_id.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamFetcher for CountingFetcher {
    async fn fetch(
        &self,
        stream: &StreamDescriptor,
        directory: &Path,
    ) -> Result<PathBuf, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&stream.format_id) {
            return Err(DownloadError::Fetch(format!("connection reset fetching {}", stream.format_id)));
        }

        let path = directory.join(&stream.default_filename);
        tokio::fs::write(&path, stream.format_id.as_bytes()).await?;
        Ok(path)
    }
}

/// Writes output files like ffmpeg would; can be told to fail
#[derive(Default)]
pub struct FakeEncoder {
    fail_merge: bool,
    fail_transcode: bool,
    merge_calls: AtomicUsize,
    transcode_calls: AtomicUsize,
}

impl FakeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_merge() -> Self {
        Self {
            fail_merge: true,
            ..Self::default()
        }
    }

    pub fn failing_transcode() -> Self {
        Self {
            fail_transcode: true,
            ..Self::default()
        }
    }

    pub fn merge_calls(&self) -> usize {
        self.merge_calls.load(Ordering::SeqCst)
    }

    pub fn transcode_calls(&self) -> usize {
        self.transcode_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaEncoder for FakeEncoder {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DownloadError> {
        self.merge_calls.fetch_add(1, Ordering::SeqCst);
        let mut body = tokio::fs::read(video).await?;
        body.extend(tokio::fs::read(audio).await?);

        if self.fail_merge {
            // Leave a truncated output behind, like an interrupted encoder
            tokio::fs::write(output, b"partial").await?;
            return Err(DownloadError::Merge("ffmpeg exited with Some(1)".to_string()));
        }

        tokio::fs::write(output, body).await?;
        Ok(())
    }

    async fn transcode(&self, input: &Path, format: AudioFormat) -> Result<PathBuf, DownloadError> {
        self.transcode_calls.fetch_add(1, Ordering::SeqCst);
        let output = input.with_extension(format.extension());

        if self.fail_transcode {
            tokio::fs::write(&output, b"partial").await?;
            return Err(DownloadError::Transcode("ffmpeg exited with Some(1)".to_string()));
        }

        tokio::fs::copy(input, &output).await?;
        Ok(output)
    }
}
