use crate::auth::CurrentUser;
use crate::database::song::SongRepository;
use crate::error::app_error::AppError;
use crate::models::song::{Song, SongMetadata};
use crate::models::user::Role;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

pub fn sample_metadata() -> SongMetadata {
    SongMetadata {
        songname: "Song1".to_string(),
        artist: "ArtistA".to_string(),
        genre: "Rock".to_string(),
        album: "AlbumA".to_string(),
    }
}

pub fn current_user(id: i64) -> CurrentUser {
    CurrentUser {
        id,
        email: format!("user{}@example.com", id),
        role: Role::User,
    }
}

/// In-memory stand-in for the songs table, enough to drive the catalog
/// service without a database.
pub struct MockSongStore {
    songs: Mutex<HashMap<i64, Song>>,
    next_id: AtomicI64,
    fail_create: bool,
}

impl MockSongStore {
    pub fn new() -> Self {
        MockSongStore {
            songs: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            fail_create: false,
        }
    }

    /// A store whose `create_song` always fails, for exercising the
    /// compensating-cleanup path.
    pub fn failing() -> Self {
        MockSongStore {
            fail_create: true,
            ..MockSongStore::new()
        }
    }

    pub fn song_count(&self) -> usize {
        self.songs.lock().unwrap().len()
    }

    pub fn get(&self, id: i64) -> Option<Song> {
        self.songs.lock().unwrap().get(&id).cloned()
    }

    pub fn seed_song(&self, owner_id: i64, metadata: &SongMetadata, file_name: &str) -> Song {
        let song = self.build_song(owner_id, metadata, file_name);
        self.songs.lock().unwrap().insert(song.id, song.clone());
        song
    }

    fn build_song(&self, owner_id: i64, metadata: &SongMetadata, file_name: &str) -> Song {
        Song {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            songname: metadata.songname.clone(),
            artist: metadata.artist.clone(),
            genre: metadata.genre.clone(),
            album: metadata.album.clone(),
            file_name: file_name.to_string(),
            owner_id,
            created_at: Utc::now(),
        }
    }
}

impl Default for MockSongStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SongRepository for MockSongStore {
    async fn create_song(&self, owner_id: i64, metadata: &SongMetadata, file_name: &str) -> Result<Song, AppError> {
        if self.fail_create {
            return Err(AppError::db("mock insert failure", sqlx::Error::RowNotFound));
        }
        Ok(self.seed_song(owner_id, metadata, file_name))
    }

    async fn get_song_by_id(&self, id: i64) -> Result<Option<Song>, AppError> {
        Ok(self.get(id))
    }

    async fn list_songs_by_owner(&self, owner_id: i64) -> Result<Vec<Song>, AppError> {
        let mut songs: Vec<Song> = self.songs.lock().unwrap().values().filter(|s| s.owner_id == owner_id).cloned().collect();
        songs.sort_by_key(|s| s.id);
        Ok(songs)
    }

    async fn list_recent_songs(&self, limit: i64) -> Result<Vec<Song>, AppError> {
        let mut songs: Vec<Song> = self.songs.lock().unwrap().values().cloned().collect();
        songs.sort_by_key(|s| std::cmp::Reverse(s.id));
        songs.truncate(limit as usize);
        Ok(songs)
    }

    async fn update_song(&self, id: i64, metadata: &SongMetadata) -> Result<Song, AppError> {
        let mut songs = self.songs.lock().unwrap();
        let song = songs.get_mut(&id).ok_or_else(|| AppError::NotFound("Song not found".to_string()))?;
        song.songname = metadata.songname.clone();
        song.artist = metadata.artist.clone();
        song.genre = metadata.genre.clone();
        song.album = metadata.album.clone();
        Ok(song.clone())
    }

    async fn delete_song(&self, id: i64) -> Result<(), AppError> {
        self.songs.lock().unwrap().remove(&id);
        Ok(())
    }
}
