// File naming: titles to safe file names, and space-free names on disk

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use super::errors::DownloadError;

/// Most filesystems cap a single path component at 255 bytes
const MAX_FILENAME_BYTES: usize = 255;
/// `temp_video_` / `temp_audio_`, added while a merge is pending
const TEMP_PREFIX_BYTES: usize = 11;
/// The extension can be swapped later (wav, flac, mkv, webm)
const MIN_EXTENSION_BYTES: usize = 4;

lazy_static! {
    // Control characters plus punctuation that breaks paths or shell quoting
    static ref UNSAFE_CHARS: Regex =
        Regex::new(r##"[\x00-\x1f"#$%'*,./:;<>?\\^|~]"##).unwrap();
}

/// Longest prefix of `s` that fits in `max_bytes` without splitting a character
fn truncate_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Bytes left for the title once the temp prefix and `.{ext}` are accounted for
fn stem_budget(extension: &str) -> usize {
    MAX_FILENAME_BYTES
        .saturating_sub(TEMP_PREFIX_BYTES + 1 + extension.len().max(MIN_EXTENSION_BYTES))
        .max(1)
}

fn sanitize(title: &str, max_bytes: usize) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(title, "");
    let cleaned = truncate_bytes(cleaned.trim(), max_bytes).trim();

    if cleaned.is_empty() {
        "video".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Strip characters that are not allowed (or are awkward) in file names
pub fn safe_filename(title: &str) -> String {
    sanitize(title, stem_budget(""))
}

/// `{safe title}.{ext}`, short enough to survive the temp prefix
pub fn default_filename(title: &str, extension: &str) -> String {
    format!("{}.{}", sanitize(title, stem_budget(extension)), extension)
}

/// Name with every space replaced by an underscore
pub fn underscored(name: &str) -> String {
    name.replace(' ', "_")
}

/// Rename the file in place if its name contains spaces.
///
/// Only the last path component is rewritten. Returns the (possibly new) path;
/// calling it again on the result is a no-op.
pub fn normalize_file_name(path: &Path) -> Result<PathBuf, DownloadError> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(path.to_path_buf());
    };

    if !name.contains(' ') {
        return Ok(path.to_path_buf());
    }

    let renamed = path.with_file_name(underscored(name));
    std::fs::rename(path, &renamed)?;
    tracing::debug!(from = %path.display(), to = %renamed.display(), "normalized file name");

    Ok(renamed)
}

/// Same file name with a prefix, e.g. `temp_video_<name>`
pub fn prefixed(path: &Path, prefix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}", prefix, name))
}
