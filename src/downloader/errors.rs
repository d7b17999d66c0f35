// Error types for the download pipeline

use std::path::PathBuf;

use thiserror::Error;

use super::extractors::{diagnose_error, BlockingReason};
use super::tools::ToolType;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Target directory is missing or not a directory
    #[error("Invalid directory: {}", .0.display())]
    InvalidDirectory(PathBuf),

    /// Link is neither a playlist nor a single-video link
    #[error("Invalid link, please provide a YouTube link to a playlist or video: {0}")]
    InvalidLink(String),

    /// Extractor could not turn the URL into video/playlist metadata
    #[error("Could not resolve {url}: {} ({message})", .reason.description())]
    Resolution {
        url: String,
        reason: BlockingReason,
        message: String,
    },

    /// Neither the capped quality branches nor the progressive fallback had a stream
    #[error("No suitable stream found for '{0}'")]
    NoSuitableStream(String),

    /// Network or disk failure while fetching a stream
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Encoder failed to combine video and audio
    #[error("Merge failed: {0}")]
    Merge(String),

    /// Encoder failed to convert the audio file
    #[error("Transcode failed: {0}")]
    Transcode(String),

    /// yt-dlp or ffmpeg not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Command execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Build a resolution error from raw extractor output
    pub fn resolution(url: &str, stderr: &str) -> Self {
        let message = stderr
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with("ERROR:"))
            .or_else(|| stderr.lines().map(str::trim).find(|l| !l.is_empty()))
            .unwrap_or("no output from extractor")
            .to_string();

        Self::Resolution {
            url: url.to_string(),
            reason: diagnose_error(stderr).unwrap_or(BlockingReason::Unknown),
            message,
        }
    }

    /// Errors that only fail the current video; a playlist moves on to the next member.
    pub fn is_per_video(&self) -> bool {
        !matches!(self, Self::InvalidDirectory(_) | Self::InvalidLink(_))
    }

    /// Hint for the status line, when the failure has a known remedy
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Resolution { reason, .. } => reason.hint(),
            Self::ToolNotFound(msg) if msg.contains("ffmpeg") => {
                Some(ToolType::Ffmpeg.install_hint())
            }
            Self::ToolNotFound(_) => Some(ToolType::YtDlp.install_hint()),
            _ => None,
        }
    }
}

// Classify raw process output that has no URL context
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("not found")
            || lower.contains("no such file")
            || lower.contains("command not found")
        {
            return Self::ToolNotFound(s);
        }

        if lower.contains("invalid json") || lower.contains("parse") {
            return Self::ParseError(s);
        }

        Self::ExecutionError(s)
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        Self::Fetch(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_picks_error_line() {
        let stderr = "WARNING: something\nERROR: [youtube] abc: Private video. Sign in if you've been granted access\n";
        match DownloadError::resolution("https://www.youtube.com/watch?v=abc", stderr) {
            DownloadError::Resolution { reason, message, .. } => {
                assert_eq!(reason, BlockingReason::PrivateVideo);
                assert!(message.starts_with("ERROR:"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_link_and_directory_errors_are_request_level() {
        assert!(!DownloadError::InvalidLink("x".into()).is_per_video());
        assert!(!DownloadError::InvalidDirectory(PathBuf::from("/nope")).is_per_video());
        assert!(DownloadError::Merge("exit 1".into()).is_per_video());
        assert!(DownloadError::Fetch("reset".into()).is_per_video());
    }

    #[test]
    fn test_tool_not_found_hint_names_the_tool() {
        let ffmpeg = DownloadError::ToolNotFound("ffmpeg: No such file or directory".into());
        assert_eq!(ffmpeg.hint(), Some(ToolType::Ffmpeg.install_hint()));
        assert!(ffmpeg.hint().unwrap().contains("YTDL_FFMPEG_PATH"));

        let ytdlp = DownloadError::ToolNotFound("yt-dlp: No such file or directory".into());
        assert_eq!(ytdlp.hint(), Some(ToolType::YtDlp.install_hint()));
    }

    #[test]
    fn test_from_string_classification() {
        assert!(matches!(
            DownloadError::from("ffmpeg: command not found".to_string()),
            DownloadError::ToolNotFound(_)
        ));
        assert!(matches!(
            DownloadError::from("Invalid JSON at line 1".to_string()),
            DownloadError::ParseError(_)
        ));
        assert!(matches!(
            DownloadError::from("exit status 2".to_string()),
            DownloadError::ExecutionError(_)
        ));
    }
}
