// ffmpeg-backed encoder

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::config::DownloaderConfig;
use super::errors::DownloadError;
use super::models::AudioFormat;
use super::tools::{ToolManager, ToolType};
use super::traits::MediaEncoder;
use super::utils::{run_output_with_timeout, stderr_tail};

pub struct FfmpegEncoder {
    ffmpeg_path: PathBuf,
    timeout_secs: u64,
}

impl FfmpegEncoder {
    pub fn new(config: &DownloaderConfig) -> Self {
        Self {
            ffmpeg_path: ToolManager::from_config(config).command_path(ToolType::Ffmpeg),
            timeout_secs: config.process_timeout_secs,
        }
    }

    /// `-y` overwrites the output, the log level keeps the console quiet
    fn quiet_args() -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
        ]
    }

    pub fn merge_args(video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
        let inputs: Vec<OsString> = vec![
            "-i".into(),
            video.into(),
            "-i".into(),
            audio.into(),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "1:a:0".into(),
            "-c".into(),
            "copy".into(),
            output.into(),
        ];
        let mut args = Self::quiet_args();
        args.extend(inputs);
        args
    }

    pub fn transcode_args(input: &Path, output: &Path) -> Vec<OsString> {
        let inputs: Vec<OsString> = vec!["-i".into(), input.into(), "-vn".into(), output.into()];
        let mut args = Self::quiet_args();
        args.extend(inputs);
        args
    }

    /// Non-zero exit becomes `on_failure(message)`; spawn errors pass through
    async fn run(
        &self,
        args: Vec<OsString>,
        on_failure: fn(String) -> DownloadError,
    ) -> Result<(), DownloadError> {
        let output = run_output_with_timeout(&self.ffmpeg_path, args, self.timeout_secs).await?;

        if output.status.success() {
            return Ok(());
        }

        Err(on_failure(format!(
            "ffmpeg exited with {:?}: {}",
            output.status.code(),
            stderr_tail(&output.stderr, 5)
        )))
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DownloadError> {
        tracing::debug!(
            video = %video.display(),
            audio = %audio.display(),
            output = %output.display(),
            "merging streams"
        );
        self.run(Self::merge_args(video, audio, output), DownloadError::Merge)
            .await
    }

    async fn transcode(&self, input: &Path, format: AudioFormat) -> Result<PathBuf, DownloadError> {
        let output = input.with_extension(format.extension());
        tracing::debug!(input = %input.display(), output = %output.display(), "transcoding audio");
        self.run(Self::transcode_args(input, &output), DownloadError::Transcode)
            .await?;
        Ok(output)
    }
}
