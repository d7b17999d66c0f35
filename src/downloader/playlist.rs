// Playlist expansion: one single-video run per member, outcomes in playlist order

use futures::stream::{self, StreamExt};

use super::errors::DownloadError;
use super::models::{DownloadRequest, OrchestratorState, PlaylistSummary};
use super::traits::{StatusSink, StreamResolver};
use super::video::VideoDownloader;

pub struct PlaylistExpander<'a> {
    resolver: &'a dyn StreamResolver,
    videos: &'a VideoDownloader,
    sink: &'a dyn StatusSink,
    max_concurrent: usize,
}

impl<'a> PlaylistExpander<'a> {
    pub fn new(
        resolver: &'a dyn StreamResolver,
        videos: &'a VideoDownloader,
        sink: &'a dyn StatusSink,
        max_concurrent: usize,
    ) -> Self {
        Self {
            resolver,
            videos,
            sink,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Fails only when the playlist itself cannot be resolved; member
    /// failures are recorded in the summary and never stop the run.
    pub async fn run(&self, request: &DownloadRequest) -> Result<PlaylistSummary, DownloadError> {
        let state = OrchestratorState::Playlist;
        let playlist = self.resolver.expand_playlist(&request.source_url).await?;

        self.sink.info(
            state,
            format!(
                "Found {} videos in {}",
                playlist.member_urls.len(),
                playlist.title
            ),
        );

        let members: Vec<DownloadRequest> = playlist
            .member_urls
            .iter()
            .map(|url| request.for_member(url))
            .collect();

        // `buffered` keeps results in member order even when several run at once
        let outcomes = stream::iter(members.iter())
            .map(|member| self.videos.download(member, state))
            .buffered(self.max_concurrent)
            .collect::<Vec<_>>()
            .await;

        let summary = PlaylistSummary {
            title: playlist.title,
            outcomes,
        };

        self.sink.info(
            state,
            format!(
                "Exported {}/{} videos from {}",
                summary.succeeded(),
                summary.total(),
                summary.title
            ),
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::downloader::config::DownloaderConfig;
    use crate::downloader::testing::{make_video, CountingFetcher, FakeEncoder, ScriptedResolver};
    use crate::downloader::traits::CollectingStatusSink;

    const PLAYLIST: &str = "https://www.youtube.com/playlist?list=xyz";
    const FIRST: &str = "https://www.youtube.com/watch?v=one";
    const SECOND: &str = "https://www.youtube.com/watch?v=two";
    const MISSING: &str = "https://www.youtube.com/watch?v=gone";
    const THIRD: &str = "https://www.youtube.com/watch?v=three";

    fn resolver() -> Arc<ScriptedResolver> {
        Arc::new(
            ScriptedResolver::new()
                .with_video(FIRST, make_video("First Song", &[1080]))
                .with_video(SECOND, make_video("Second Song", &[2160, 1080]))
                .with_video(THIRD, make_video("Third Song", &[1080]))
                .with_playlist(PLAYLIST, "Road Trip", &[FIRST, SECOND, MISSING, THIRD]),
        )
    }

    async fn run_with(
        concurrency: usize,
        fetcher: CountingFetcher,
        dir: &std::path::Path,
    ) -> (PlaylistSummary, Arc<CollectingStatusSink>) {
        let resolver = resolver();
        let sink = Arc::new(CollectingStatusSink::new());
        let videos = VideoDownloader::new(
            resolver.clone(),
            Arc::new(fetcher),
            Arc::new(FakeEncoder::new()),
            sink.clone(),
            DownloaderConfig::default(),
        );
        let request = DownloadRequest::new(PLAYLIST, dir)
            .with_resolution_cap(crate::downloader::models::ResolutionCap::Hd1080);

        let summary = PlaylistExpander::new(resolver.as_ref(), &videos, sink.as_ref(), concurrency)
            .run(&request)
            .await
            .unwrap();
        (summary, sink)
    }

    #[tokio::test]
    async fn test_member_failure_does_not_stop_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let (summary, sink) = run_with(1, CountingFetcher::new(), dir.path()).await;

        assert_eq!(summary.title, "Road Trip");
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.succeeded(), 3);
        assert!(!summary.outcomes[2].success);
        assert_eq!(summary.outcomes[2].source_url, MISSING);
        assert!(sink
            .messages()
            .contains(&"Exported 3/4 videos from Road Trip".to_string()));
    }

    #[tokio::test]
    async fn test_success_count_matches_error_free_members() {
        let dir = tempfile::tempdir().unwrap();
        // Every resolvable member picks its 1080p stream, and that fetch fails
        let (summary, _) = run_with(1, CountingFetcher::new().failing_on("v1080"), dir.path()).await;

        let error_free = summary.outcomes.iter().filter(|o| o.error.is_none()).count();
        assert_eq!(summary.succeeded(), error_free);
        assert_eq!(summary.succeeded(), 0);
        assert!(summary.succeeded() <= summary.total());
    }

    #[tokio::test]
    async fn test_concurrent_run_keeps_member_order() {
        let dir = tempfile::tempdir().unwrap();
        let (summary, _) = run_with(3, CountingFetcher::new(), dir.path()).await;

        let urls: Vec<&str> = summary.outcomes.iter().map(|o| o.source_url.as_str()).collect();
        assert_eq!(urls, vec![FIRST, SECOND, MISSING, THIRD]);
        assert_eq!(summary.succeeded(), 3);
    }

    #[tokio::test]
    async fn test_unknown_playlist_is_resolution_error() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver();
        let sink = CollectingStatusSink::new();
        let videos = VideoDownloader::new(
            resolver.clone(),
            Arc::new(CountingFetcher::new()),
            Arc::new(FakeEncoder::new()),
            Arc::new(CollectingStatusSink::new()),
            DownloaderConfig::default(),
        );
        let request = DownloadRequest::new("https://www.youtube.com/playlist?list=nope", dir.path());

        let result = PlaylistExpander::new(resolver.as_ref(), &videos, &sink, 1)
            .run(&request)
            .await;
        assert!(matches!(result, Err(DownloadError::Resolution { .. })));
    }
}
