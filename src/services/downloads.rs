use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::core::config::Settings;

pub(crate) const DEFAULT_DOWNLOAD_NAME: &str = "download";

const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Error)]
pub(crate) enum SinkError {
    #[error("no free file name for {0}")]
    NameExhausted(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client-side save of a downloaded payload.
#[async_trait]
pub(crate) trait FileSink: Send + Sync {
    async fn save(&self, suggested_name: &str, payload: &[u8]) -> Result<PathBuf, SinkError>;
}

/// Saves downloads into one directory, never overwriting existing files.
#[derive(Debug, Clone)]
pub(crate) struct DownloadDirectory {
    root: PathBuf,
}

impl DownloadDirectory {
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        Self::new(PathBuf::from(&settings.downloads().directory))
    }

    pub(crate) fn new(root: PathBuf) -> Self {
        Self { root }
    }

    async fn free_target(&self, name: &str) -> Result<PathBuf, SinkError> {
        let (stem, extension) = split_extension(name);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = match (attempt, extension) {
                (0, _) => name.to_string(),
                (n, Some(ext)) => format!("{stem} ({n}).{ext}"),
                (n, None) => format!("{stem} ({n})"),
            };
            let path = self.root.join(candidate);
            if !fs::try_exists(&path).await? {
                return Ok(path);
            }
        }

        Err(SinkError::NameExhausted(name.to_string()))
    }
}

#[async_trait]
impl FileSink for DownloadDirectory {
    async fn save(&self, suggested_name: &str, payload: &[u8]) -> Result<PathBuf, SinkError> {
        fs::create_dir_all(&self.root).await?;

        let name = sanitized_filename(suggested_name);
        let target = self.free_target(&name).await?;
        let partial = self.root.join(format!(".{}.part", Uuid::new_v4()));

        if let Err(err) = fs::write(&partial, payload).await {
            remove_quietly(&partial).await;
            return Err(err.into());
        }
        if let Err(err) = fs::rename(&partial, &target).await {
            remove_quietly(&partial).await;
            return Err(err.into());
        }

        tracing::info!(path = %target.display(), bytes = payload.len(), "Saved download");
        Ok(target)
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                error = %err,
                path = %path.display(),
                "Failed to remove partial download"
            );
        }
    }
}

/// Reduces a suggested name to a bare, safe file name.
pub(crate) fn sanitized_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let sanitized: String = base
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '(' | ')'))
        .collect();
    let sanitized = sanitized.trim_start_matches('.');

    if sanitized.is_empty() {
        DEFAULT_DOWNLOAD_NAME.to_string()
    } else {
        sanitized.to_string()
    }
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}
