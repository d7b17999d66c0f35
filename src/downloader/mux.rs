// Merge and transcode steps, including intermediate file handling

use std::path::{Path, PathBuf};

use super::errors::DownloadError;
use super::filename::prefixed;
use super::models::{AudioFormat, StreamDescriptor};
use super::traits::MediaEncoder;

pub const VIDEO_TEMP_PREFIX: &str = "temp_video_";
pub const AUDIO_TEMP_PREFIX: &str = "temp_audio_";

/// Container for a stream-copy merge of `video` and `audio`.
///
/// mp4 takes AAC and webm takes Opus/Vorbis; any other pairing goes to
/// Matroska, which accepts them all.
pub fn merged_container(video: &StreamDescriptor, audio: &StreamDescriptor) -> &'static str {
    match video.extension.as_str() {
        "mp4" if audio.is_aac() => "mp4",
        "webm" if audio.is_webm_audio() => "webm",
        _ => "mkv",
    }
}

/// Move a fetched file to `<prefix><name>` in the same directory
pub async fn stage_intermediate(path: &Path, prefix: &str) -> Result<PathBuf, DownloadError> {
    let staged = prefixed(path, prefix);
    tokio::fs::rename(path, &staged).await?;
    Ok(staged)
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), "could not remove intermediate file: {}", e);
        }
    }
}

/// Merge the two intermediates into `output`.
///
/// The intermediates are deleted whatever the result. On failure a partially
/// written `output` is removed as well, so the directory holds either the
/// finished container or nothing.
pub async fn merge_streams(
    encoder: &dyn MediaEncoder,
    video_temp: &Path,
    audio_temp: &Path,
    output: &Path,
) -> Result<PathBuf, DownloadError> {
    let result = encoder.merge(video_temp, audio_temp, output).await;

    remove_quietly(video_temp).await;
    remove_quietly(audio_temp).await;

    match result {
        Ok(()) if tokio::fs::metadata(output).await.is_ok() => Ok(output.to_path_buf()),
        Ok(()) => Err(DownloadError::Merge(format!(
            "{} reported success but {} was not written",
            encoder.name(),
            output.display()
        ))),
        Err(e) => {
            remove_quietly(output).await;
            Err(e)
        }
    }
}

/// Convert `input` to `format` and delete the source on success.
///
/// On failure the source is kept and any partial output removed.
pub async fn transcode_audio(
    encoder: &dyn MediaEncoder,
    input: &Path,
    format: AudioFormat,
) -> Result<PathBuf, DownloadError> {
    let already_target = input
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(format.extension()));
    if already_target {
        return Ok(input.to_path_buf());
    }

    match encoder.transcode(input, format).await {
        Ok(output) => {
            remove_quietly(input).await;
            Ok(output)
        }
        Err(e) => {
            remove_quietly(&input.with_extension(format.extension())).await;
            Err(e)
        }
    }
}
