use crate::auth::CurrentUser;
use crate::database::song::SongRepository;
use crate::error::app_error::AppError;
use crate::models::song::{Song, SongMetadata};
use crate::storage::{FileStore, StagedUpload, sanitize_file_name};
use tracing::warn;
use validator::Validate;

/// Coordinates the metadata row and the media file behind one user-facing
/// action. All ownership checks live here: the repository below trusts its
/// callers, and route handlers above never compare identities themselves.
pub struct CatalogService<'a, R> {
    repo: &'a R,
    store: &'a FileStore,
}

impl<'a, R: SongRepository> CatalogService<'a, R> {
    pub fn new(repo: &'a R, store: &'a FileStore) -> Self {
        CatalogService { repo, store }
    }

    /// Bind an already-staged upload to a new song row.
    ///
    /// Write order is file-first: the payload sits in staging before the row
    /// is inserted, and the staged file is promoted into the media directory
    /// only once the row exists. Either side failing rolls the other back, so
    /// neither an orphaned row nor an orphaned file survives the call.
    pub async fn upload(&self, owner: &CurrentUser, metadata: &SongMetadata, upload: StagedUpload) -> Result<Song, AppError> {
        if let Err(e) = metadata.validate() {
            self.store.discard(&upload.path).await;
            return Err(e.into());
        }

        let file_name = match upload.client_name.as_deref().and_then(sanitize_file_name) {
            Some(name) => name,
            None => {
                self.store.discard(&upload.path).await;
                return Err(AppError::InvalidUpload("file name has no usable characters".to_string()));
            }
        };

        let song = match self.repo.create_song(owner.id, metadata, &file_name).await {
            Ok(song) => song,
            Err(e) => {
                self.store.discard(&upload.path).await;
                return Err(e);
            }
        };

        if let Err(e) = self.store.commit(&upload.path, song.id, &file_name).await {
            if let Err(cleanup) = self.repo.delete_song(song.id).await {
                warn!(song_id = song.id, error = %cleanup, "failed to remove song row after file commit error");
            }
            self.store.discard(&upload.path).await;
            return Err(AppError::io("Failed to store uploaded file", e));
        }

        Ok(song)
    }

    pub async fn edit(&self, requester: &CurrentUser, song_id: i64, metadata: &SongMetadata) -> Result<Song, AppError> {
        metadata.validate()?;

        let song = self.owned_song(requester, song_id).await?;
        self.repo.update_song(song.id, metadata).await
    }

    /// Removes the row first; the media file follows. A failed file removal
    /// is logged rather than resurrecting the row.
    pub async fn delete(&self, requester: &CurrentUser, song_id: i64) -> Result<(), AppError> {
        let song = self.owned_song(requester, song_id).await?;
        self.repo.delete_song(song.id).await?;

        if let Err(e) = self.store.remove(song.id, &song.file_name).await {
            warn!(song_id = song.id, error = %e, "song row deleted but media file removal failed");
        }

        Ok(())
    }

    async fn owned_song(&self, requester: &CurrentUser, song_id: i64) -> Result<Song, AppError> {
        let song = self
            .repo
            .get_song_by_id(song_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Song not found".to_string()))?;

        if song.owner_id != requester.id {
            return Err(AppError::Forbidden);
        }

        Ok(song)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStore;
    use crate::test_utils::{MockSongStore, current_user, sample_metadata};
    use std::path::PathBuf;

    async fn media_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.init().await.unwrap();
        (dir, store)
    }

    fn staged(store: &FileStore, bytes: &[u8], client_name: &str) -> StagedUpload {
        let path = store.staging_path();
        std::fs::write(&path, bytes).unwrap();
        StagedUpload {
            path,
            client_name: Some(client_name.to_string()),
        }
    }

    fn staged_path(upload: &StagedUpload) -> PathBuf {
        upload.path.clone()
    }

    #[tokio::test]
    async fn upload_stores_row_and_byte_identical_file() {
        let (dir, store) = media_store().await;
        let repo = MockSongStore::new();
        let service = CatalogService::new(&repo, &store);
        let alice = current_user(1);

        let upload = staged(&store, b"mp3-payload", "file.mp3");
        let song = service.upload(&alice, &sample_metadata(), upload).await.unwrap();

        assert_eq!(song.owner_id, alice.id);
        assert_eq!(song.file_name, "file.mp3");
        assert_eq!(repo.song_count(), 1);

        let stored = dir.path().join(format!("{}_file.mp3", song.id));
        assert_eq!(std::fs::read(stored).unwrap(), b"mp3-payload");
    }

    #[tokio::test]
    async fn upload_with_empty_metadata_leaves_no_row_and_no_file() {
        let (dir, store) = media_store().await;
        let repo = MockSongStore::new();
        let service = CatalogService::new(&repo, &store);

        let mut metadata = sample_metadata();
        metadata.genre.clear();
        let upload = staged(&store, b"bytes", "file.mp3");
        let staged_at = staged_path(&upload);

        let err = service.upload(&current_user(1), &metadata, upload).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(repo.song_count(), 0);
        assert!(!staged_at.exists());
        assert!(std::fs::read_dir(dir.path().join("staging")).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn upload_with_unusable_file_name_is_rejected() {
        let (_dir, store) = media_store().await;
        let repo = MockSongStore::new();
        let service = CatalogService::new(&repo, &store);

        let upload = staged(&store, b"bytes", "????");
        let staged_at = staged_path(&upload);

        let err = service.upload(&current_user(1), &sample_metadata(), upload).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidUpload(_)));
        assert_eq!(repo.song_count(), 0);
        assert!(!staged_at.exists());
    }

    #[tokio::test]
    async fn failed_insert_discards_the_staged_file() {
        let (dir, store) = media_store().await;
        let repo = MockSongStore::failing();
        let service = CatalogService::new(&repo, &store);

        let upload = staged(&store, b"bytes", "file.mp3");
        let staged_at = staged_path(&upload);

        let err = service.upload(&current_user(1), &sample_metadata(), upload).await.unwrap_err();
        assert!(matches!(err, AppError::Db { .. }));
        assert!(!staged_at.exists());
        // nothing was promoted into the media root either
        let committed: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().is_file())
            .collect();
        assert!(committed.is_empty());
    }

    #[tokio::test]
    async fn edit_by_owner_overwrites_all_four_fields() {
        let (_dir, store) = media_store().await;
        let repo = MockSongStore::new();
        let service = CatalogService::new(&repo, &store);
        let alice = current_user(1);

        let song = repo.seed_song(alice.id, &sample_metadata(), "file.mp3");

        let updated_metadata = SongMetadata {
            songname: "Song2".to_string(),
            artist: "ArtistB".to_string(),
            genre: "Jazz".to_string(),
            album: "AlbumB".to_string(),
        };
        let updated = service.edit(&alice, song.id, &updated_metadata).await.unwrap();
        assert_eq!(updated.songname, "Song2");
        assert_eq!(updated.artist, "ArtistB");
        assert_eq!(updated.genre, "Jazz");
        assert_eq!(updated.album, "AlbumB");
    }

    #[tokio::test]
    async fn edit_of_foreign_song_is_forbidden_and_row_unchanged() {
        let (_dir, store) = media_store().await;
        let repo = MockSongStore::new();
        let service = CatalogService::new(&repo, &store);

        let alice = current_user(1);
        let bob = current_user(2);
        let song = repo.seed_song(alice.id, &sample_metadata(), "file.mp3");

        let mut metadata = sample_metadata();
        metadata.songname = "Hijacked".to_string();
        let err = service.edit(&bob, song.id, &metadata).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert_eq!(repo.get(song.id).unwrap().songname, "Song1");
    }

    #[tokio::test]
    async fn edit_of_missing_song_is_not_found() {
        let (_dir, store) = media_store().await;
        let repo = MockSongStore::new();
        let service = CatalogService::new(&repo, &store);

        let err = service.edit(&current_user(1), 999, &sample_metadata()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_row_and_media_file() {
        let (dir, store) = media_store().await;
        let repo = MockSongStore::new();
        let service = CatalogService::new(&repo, &store);
        let alice = current_user(1);

        let upload = staged(&store, b"bytes", "file.mp3");
        let song = service.upload(&alice, &sample_metadata(), upload).await.unwrap();
        let media = dir.path().join(format!("{}_file.mp3", song.id));
        assert!(media.exists());

        service.delete(&alice, song.id).await.unwrap();
        assert_eq!(repo.song_count(), 0);
        assert!(!media.exists());
    }

    #[tokio::test]
    async fn delete_of_foreign_song_is_forbidden_and_file_survives() {
        let (dir, store) = media_store().await;
        let repo = MockSongStore::new();
        let service = CatalogService::new(&repo, &store);

        let alice = current_user(1);
        let bob = current_user(2);
        let upload = staged(&store, b"bytes", "file.mp3");
        let song = service.upload(&alice, &sample_metadata(), upload).await.unwrap();

        let err = service.delete(&bob, song.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert_eq!(repo.song_count(), 1);
        assert!(dir.path().join(format!("{}_file.mp3", song.id)).exists());
    }
}
