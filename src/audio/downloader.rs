//! Audio download utilities.
//!
//! Downloads the best available audio stream with yt-dlp, transcoded to a
//! fixed container and quality, into a per-request scratch directory.

use crate::error::{Result, SkrivError};
use crate::link::VideoLink;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// How audio is fetched and transcoded.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// yt-dlp executable.
    pub program: String,
    /// Target container, e.g. `mp3`.
    pub audio_format: String,
    /// Quality target, e.g. `192K`.
    pub audio_quality: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            audio_format: "mp3".to_string(),
            audio_quality: "192K".to_string(),
        }
    }
}

/// A scratch directory owned by a single request.
///
/// Named after a fresh request id so concurrent requests for the same video
/// never share files. Removed with its contents when dropped.
pub struct ScratchDir {
    request_id: Uuid,
    dir: tempfile::TempDir,
}

impl ScratchDir {
    /// Create a new request directory under `root`.
    pub fn create(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let request_id = Uuid::new_v4();
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", request_id))
            .tempdir_in(root)?;
        debug!("Created scratch directory {:?}", dir.path());
        Ok(Self { request_id, dir })
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Downloads the audio of `link` into `output_dir`.
///
/// Returns the path of a verified, non-empty audio file.
#[instrument(skip(output_dir, options), fields(link = %link))]
pub async fn download_audio(
    link: &VideoLink,
    output_dir: &Path,
    options: &DownloadOptions,
) -> Result<PathBuf> {
    info!("Downloading audio from {}", link);

    let template = output_dir.join("%(id)s.%(ext)s");

    let result = Command::new(&options.program)
        .arg("--format").arg("bestaudio/best")
        .arg("--extract-audio")
        .arg("--audio-format").arg(&options.audio_format)
        .arg("--audio-quality").arg(&options.audio_quality)
        .arg("--output").arg(&template)
        .arg("--no-playlist")
        .arg("--no-warnings")
        .arg("--print").arg("after_move:id")
        .arg(link.as_str())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SkrivError::ToolNotFound(options.program.clone()));
        }
        Err(e) => {
            return Err(SkrivError::AudioDownload(format!("yt-dlp execution failed: {e}")));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SkrivError::AudioDownload(format!("yt-dlp failed: {}", stderr.trim())));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let video_id = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).last();
    if video_id.is_none() {
        warn!("yt-dlp did not report a video id; scanning the scratch directory");
    }

    let path = locate_audio(output_dir, video_id, &options.audio_format)?;
    info!("Audio ready at {:?}", path);
    Ok(path)
}

/// Locates a downloaded audio file and checks that it is non-empty.
///
/// Tries the exact `<id>.<ext>` name first, then any file starting with the
/// id and ending in the extension, then any file with the extension.
pub fn locate_audio(dir: &Path, video_id: Option<&str>, extension: &str) -> Result<PathBuf> {
    let suffix = format!(".{}", extension);

    let found = video_id
        .map(|id| dir.join(format!("{}{}", id, suffix)))
        .filter(|candidate| candidate.is_file())
        .or_else(|| scan_dir(dir, video_id.unwrap_or_default(), &suffix));

    let path = found.ok_or_else(|| {
        SkrivError::AudioDownload("Audio file not found after download".into())
    })?;

    let size = std::fs::metadata(&path)?.len();
    if size == 0 {
        return Err(SkrivError::AudioDownload(format!(
            "Downloaded audio file is empty: {}",
            path.display()
        )));
    }

    debug!("Located audio {:?} ({} bytes)", path, size);
    Ok(path)
}

/// Fallback: scan directory for matching prefix and suffix.
fn scan_dir(dir: &Path, prefix: &str, suffix: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;

    let mut matches: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(prefix) && name.ends_with(suffix)
        })
        .map(|entry| entry.path())
        .collect();

    matches.sort();
    matches.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_exact_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.mp3"), b"ID3").unwrap();
        std::fs::write(dir.path().join("abc-other.mp3"), b"ID3").unwrap();

        let path = locate_audio(dir.path(), Some("abc"), "mp3").unwrap();
        assert_eq!(path, dir.path().join("abc.mp3"));
    }

    #[test]
    fn test_locate_falls_back_to_prefix_scan() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.f251.mp3"), b"ID3").unwrap();
        std::fs::write(dir.path().join("abc.webm.part"), b"x").unwrap();

        let path = locate_audio(dir.path(), Some("abc"), "mp3").unwrap();
        assert_eq!(path, dir.path().join("abc.f251.mp3"));
    }

    #[test]
    fn test_locate_without_id_takes_any_matching_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("xyz.mp3"), b"ID3").unwrap();

        let path = locate_audio(dir.path(), None, "mp3").unwrap();
        assert_eq!(path, dir.path().join("xyz.mp3"));
    }

    #[test]
    fn test_locate_rejects_missing_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            locate_audio(dir.path(), Some("abc"), "mp3"),
            Err(SkrivError::AudioDownload(_))
        ));

        std::fs::write(dir.path().join("abc.mp3"), b"").unwrap();
        assert!(matches!(
            locate_audio(dir.path(), Some("abc"), "mp3"),
            Err(SkrivError::AudioDownload(_))
        ));
    }

    #[test]
    fn test_scratch_dirs_are_unique_and_removed() {
        let root = tempfile::tempdir().unwrap();
        let first = ScratchDir::create(root.path()).unwrap();
        let second = ScratchDir::create(root.path()).unwrap();

        assert_ne!(first.path(), second.path());
        assert!(first
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(&first.request_id().to_string()));

        let kept = first.path().to_path_buf();
        drop(first);
        assert!(!kept.exists());
    }
}
