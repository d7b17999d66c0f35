// Locating the external tools the pipeline shells out to

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use super::config::DownloaderConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "--version",
            ToolType::Ffmpeg => "-version", // ffmpeg uses a single dash
        }
    }

    fn binary_name(&self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.as_str())
        } else {
            self.as_str().to_string()
        }
    }

    pub fn install_hint(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "Install yt-dlp (pip install -U yt-dlp) or set YTDL_YTDLP_PATH",
            ToolType::Ffmpeg => {
                "Install ffmpeg and make sure it is on PATH (or set YTDL_FFMPEG_PATH)"
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    ytdlp_override: Option<PathBuf>,
    ffmpeg_override: Option<PathBuf>,
}

impl ToolManager {
    pub fn from_config(config: &DownloaderConfig) -> Self {
        Self {
            ytdlp_override: config.ytdlp_path.clone(),
            ffmpeg_override: config.ffmpeg_path.clone(),
        }
    }

    /// Path to run the tool with. Falls back to the bare name so a spawn
    /// failure surfaces as `ToolNotFound` at the call site.
    pub fn command_path(&self, tool_type: ToolType) -> PathBuf {
        self.locate(tool_type)
            .unwrap_or_else(|| PathBuf::from(tool_type.binary_name()))
    }

    pub fn locate(&self, tool_type: ToolType) -> Option<PathBuf> {
        let overridden = match tool_type {
            ToolType::YtDlp => self.ytdlp_override.as_ref(),
            ToolType::Ffmpeg => self.ffmpeg_override.as_ref(),
        };
        if let Some(path) = overridden {
            return Some(path.clone());
        }

        let binary_name = tool_type.binary_name();

        // 1. Try common paths first
        let common_dirs: &[&str] = if cfg!(windows) {
            &["C:\\ffmpeg\\bin", "C:\\Program Files\\ffmpeg\\bin"]
        } else {
            &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"]
        };

        for dir in common_dirs {
            let candidate = Path::new(dir).join(&binary_name);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        // 2. Try PATH
        let finder = if cfg!(windows) { "where" } else { "which" };
        if let Ok(output) = Command::new(finder).arg(&binary_name).output() {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if let Some(first) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
                    return Some(PathBuf::from(first));
                }
            }
        }

        None
    }

    pub fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let path = self.locate(tool_type);
        let version = path.as_deref().and_then(|p| self.get_version(p, tool_type));

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            is_available: version.is_some(),
            version,
            path,
        }
    }

    pub fn get_all_tools(&self) -> Vec<ToolInfo> {
        vec![
            self.get_tool_info(ToolType::YtDlp),
            self.get_tool_info(ToolType::Ffmpeg),
        ]
    }

    fn get_version(&self, path: &Path, tool_type: ToolType) -> Option<String> {
        match Command::new(path).arg(tool_type.version_arg()).output() {
            Ok(output) if output.status.success() => {
                // ffmpeg prints a banner; the first line carries the version
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .map(|l| l.trim().to_string())
            }
            _ => None,
        }
    }
}
