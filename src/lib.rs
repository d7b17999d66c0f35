pub mod downloader;

pub use downloader::{
    AudioFormat, DownloadError, DownloadOutcome, DownloadRequest, DownloaderConfig,
    Orchestrator, ResolutionCap, RunReport, StatusSink, StatusUpdate,
};

use downloader::tools::{ToolInfo, ToolManager};

/// Install the fmt subscriber. `RUST_LOG` wins over the `info` default;
/// calling this again after a subscriber is set is a no-op.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// One submit with the default components and environment config
pub async fn run_downloads(request: DownloadRequest) -> Result<RunReport, DownloadError> {
    let orchestrator = Orchestrator::new(DownloaderConfig::from_env())?;
    orchestrator.run_downloads(&request).await
}

/// yt-dlp and ffmpeg availability, for the settings screen
pub fn get_tools_status() -> Vec<ToolInfo> {
    ToolManager::from_config(&DownloaderConfig::from_env()).get_all_tools()
}
