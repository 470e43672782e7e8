use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::song::{Song, SongMetadata};

/// Thin persistence layer over the songs table. Ownership checks belong to
/// the catalog service; callers of `update_song`/`delete_song` must have
/// authorized the mutation already.
#[async_trait::async_trait]
pub trait SongRepository {
    async fn create_song(&self, owner_id: i64, metadata: &SongMetadata, file_name: &str) -> Result<Song, AppError>;
    async fn get_song_by_id(&self, id: i64) -> Result<Option<Song>, AppError>;
    async fn list_songs_by_owner(&self, owner_id: i64) -> Result<Vec<Song>, AppError>;
    async fn list_recent_songs(&self, limit: i64) -> Result<Vec<Song>, AppError>;
    async fn update_song(&self, id: i64, metadata: &SongMetadata) -> Result<Song, AppError>;
    async fn delete_song(&self, id: i64) -> Result<(), AppError>;
}

#[async_trait::async_trait]
impl SongRepository for PostgresRepository {
    async fn create_song(&self, owner_id: i64, metadata: &SongMetadata, file_name: &str) -> Result<Song, AppError> {
        let song = sqlx::query_as::<_, Song>(
            r#"
            INSERT INTO songs (songname, artist, genre, album, file_name, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, songname, artist, genre, album, file_name, owner_id, created_at
            "#,
        )
        .bind(&metadata.songname)
        .bind(&metadata.artist)
        .bind(&metadata.genre)
        .bind(&metadata.album)
        .bind(file_name)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unknown_owner_error(owner_id, e))?;

        Ok(song)
    }

    async fn get_song_by_id(&self, id: i64) -> Result<Option<Song>, AppError> {
        let song = sqlx::query_as::<_, Song>(
            r#"
            SELECT id, songname, artist, genre, album, file_name, owner_id, created_at
            FROM songs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(song)
    }

    async fn list_songs_by_owner(&self, owner_id: i64) -> Result<Vec<Song>, AppError> {
        let songs = sqlx::query_as::<_, Song>(
            r#"
            SELECT id, songname, artist, genre, album, file_name, owner_id, created_at
            FROM songs
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn list_recent_songs(&self, limit: i64) -> Result<Vec<Song>, AppError> {
        let songs = sqlx::query_as::<_, Song>(
            r#"
            SELECT id, songname, artist, genre, album, file_name, owner_id, created_at
            FROM songs
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn update_song(&self, id: i64, metadata: &SongMetadata) -> Result<Song, AppError> {
        let song = sqlx::query_as::<_, Song>(
            r#"
            UPDATE songs
            SET songname = $1, artist = $2, genre = $3, album = $4
            WHERE id = $5
            RETURNING id, songname, artist, genre, album, file_name, owner_id, created_at
            "#,
        )
        .bind(&metadata.songname)
        .bind(&metadata.artist)
        .bind(&metadata.genre)
        .bind(&metadata.album)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Song not found".to_string()))?;

        Ok(song)
    }

    async fn delete_song(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM songs WHERE id = $1").bind(id).execute(&self.pool).await?;

        Ok(())
    }
}

fn unknown_owner_error(owner_id: i64, e: sqlx::Error) -> AppError {
    if e.as_database_error().is_some_and(|db_err| db_err.is_foreign_key_violation()) {
        AppError::UnknownOwner(owner_id)
    } else {
        e.into()
    }
}
