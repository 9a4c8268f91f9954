//! File sink — writes the digest to a UTF-8 text file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use digestr_core::channel::{DeliveryReport, DigestSink};
use digestr_core::error::ChannelError;
use tracing::info;

/// Writes to an explicit path, or to an auto-named file in `dir`.
pub struct FileSink {
    path: Option<PathBuf>,
    dir: Option<PathBuf>,
}

impl FileSink {
    /// Write to exactly this path.
    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            dir: None,
        }
    }

    /// Write `digest_YYYY-MM-DD_HH-MM-SS.txt` into `dir` (current directory if `None`).
    pub fn auto_named(dir: Option<PathBuf>) -> Self {
        Self { path: None, dir }
    }

    pub fn default_file_name(now: DateTime<Local>) -> String {
        format!("digest_{}.txt", now.format("%Y-%m-%d_%H-%M-%S"))
    }

    /// The file that would be written at `now`.
    pub fn target_path(&self, now: DateTime<Local>) -> PathBuf {
        match (&self.path, &self.dir) {
            (Some(path), _) => path.clone(),
            (None, Some(dir)) => dir.join(Self::default_file_name(now)),
            (None, None) => PathBuf::from(Self::default_file_name(now)),
        }
    }
}

#[async_trait]
impl DigestSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn deliver(&self, digest: &str) -> Result<DeliveryReport, ChannelError> {
        let path = self.target_path(Local::now());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, digest).await?;

        let absolute = absolute(&path);
        info!(path = %absolute.display(), "Digest saved");
        Ok(DeliveryReport {
            sink: "file".into(),
            destination: absolute.display().to_string(),
            parts: 1,
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_name_has_timestamp() {
        let now = Local.with_ymd_and_hms(2025, 10, 1, 9, 5, 7).unwrap();
        assert_eq!(FileSink::default_file_name(now), "digest_2025-10-01_09-05-07.txt");
    }

    #[test]
    fn auto_named_uses_dir() {
        let now = Local.with_ymd_and_hms(2025, 10, 1, 9, 5, 7).unwrap();
        let sink = FileSink::auto_named(Some(PathBuf::from("out")));
        assert_eq!(sink.target_path(now), PathBuf::from("out/digest_2025-10-01_09-05-07.txt"));
    }

    #[tokio::test]
    async fn writes_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/digest.txt");
        let report = FileSink::to_path(&path).deliver("📊 Дайджест").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "📊 Дайджест");
        assert_eq!(report.sink, "file");
        assert!(Path::new(&report.destination).is_absolute());
        assert!(report.destination.ends_with("digest.txt"));
    }

    #[tokio::test]
    async fn auto_named_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let report = FileSink::auto_named(Some(dir.path().to_path_buf()))
            .deliver("text")
            .await
            .unwrap();
        let written = PathBuf::from(&report.destination);
        assert!(written.starts_with(dir.path()));
        let name = written.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("digest_") && name.ends_with(".txt"));
    }
}
