// Downloader module - link orchestration, stream selection, fetch and mux

pub mod config;
pub mod errors;
pub mod extractors;
pub mod fetcher;
pub mod ffmpeg;
pub mod filename;
pub mod format_selector;
pub mod models;
pub mod mux;
pub mod orchestrator;
pub mod playlist;
pub mod tools;
pub mod traits;
pub mod utils;
pub mod video;

#[cfg(test)]
mod testing;

pub use config::{default_download_dir, DownloaderConfig, EncoderFailurePolicy};
pub use errors::DownloadError;
pub use extractors::{BlockingReason, YtDlpResolver};
pub use fetcher::HttpStreamFetcher;
pub use ffmpeg::FfmpegEncoder;
pub use models::{
    AudioFormat, DownloadOutcome, DownloadQuality, DownloadRequest, OrchestratorState,
    PlaylistSummary, ResolutionCap, RunReport, StatusLevel, StatusUpdate,
};
pub use orchestrator::{classify_link, LinkKind, Orchestrator};
pub use tools::{ToolInfo, ToolManager, ToolType};
pub use traits::{
    CollectingStatusSink, MediaEncoder, StatusSink, StreamFetcher, StreamResolver,
    TracingStatusSink,
};
