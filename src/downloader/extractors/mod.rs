// Stream resolution backends
//
// `YtDlpResolver` shells out to the yt-dlp binary. The diagnostics module
// turns its stderr into a blocking reason for user-facing messages.

mod cli;
mod diagnostics;

pub use cli::YtDlpResolver;
pub use diagnostics::{diagnose_error, BlockingReason};
