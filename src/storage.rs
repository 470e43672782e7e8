use crate::config::StorageConfig;
use regex::Regex;
use rocket::fairing::AdHoc;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;
use uuid::Uuid;

const STAGING_DIR: &str = "staging";

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("invalid filename pattern"));

/// Reduce a client-supplied file name to a safe basename: the final path
/// segment with every run of characters outside `[A-Za-z0-9._-]` collapsed
/// to a single underscore and leading dots removed. Returns `None` when
/// nothing usable remains.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned = UNSAFE_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.chars().any(|c| c.is_ascii_alphanumeric()) {
        Some(cleaned.to_string())
    } else {
        None
    }
}

/// An upload that has been written to the staging area but not yet bound to
/// a song row.
#[derive(Debug)]
pub struct StagedUpload {
    pub path: PathBuf,
    pub client_name: Option<String>,
}

/// Local media directory. Committed files are namespaced by song id, so two
/// uploads with the same client name can never clobber each other.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    pub async fn init(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(self.root.join(STAGING_DIR)).await
    }

    /// A fresh path in the staging area. Staging lives under the media root
    /// so commit is a same-filesystem rename.
    pub fn staging_path(&self) -> PathBuf {
        self.root.join(STAGING_DIR).join(Uuid::new_v4().to_string())
    }

    pub fn media_path(&self, song_id: i64, file_name: &str) -> PathBuf {
        self.root.join(format!("{}_{}", song_id, file_name))
    }

    pub async fn commit(&self, staged: &Path, song_id: i64, file_name: &str) -> io::Result<PathBuf> {
        let dest = self.media_path(song_id, file_name);
        tokio::fs::rename(staged, &dest).await?;
        Ok(dest)
    }

    /// Best-effort removal of a staged file that will not be committed.
    pub async fn discard(&self, staged: &Path) {
        if let Err(e) = tokio::fs::remove_file(staged).await
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %staged.display(), error = %e, "failed to discard staged upload");
        }
    }

    /// Remove a committed media file. Missing files are treated as already
    /// removed.
    pub async fn remove(&self, song_id: i64, file_name: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.media_path(song_id, file_name)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

pub fn stage_media_store(storage_config: StorageConfig) -> AdHoc {
    AdHoc::try_on_ignite("Media store", |rocket| async move {
        let store = FileStore::new(&storage_config.media_dir);
        match store.init().await {
            Ok(()) => {
                tracing::info!(media_dir = %storage_config.media_dir, "Media store initialized");
                Ok(rocket.manage(store))
            }
            Err(e) => {
                tracing::error!("Failed to initialize media store: {}", e);
                Err(rocket)
            }
        }
    })
}
