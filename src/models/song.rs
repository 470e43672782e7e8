use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use validator::Validate;

/// A catalog entry. The audio payload itself lives in the media store under
/// `{id}_{file_name}`; only the sanitized client file name is recorded here.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Song {
    pub id: i64,
    pub songname: String,
    pub artist: String,
    pub genre: String,
    pub album: String,
    pub file_name: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// The four user-supplied metadata fields, shared by upload and edit.
#[derive(Deserialize, Debug, Clone, Validate)]
pub struct SongMetadata {
    #[validate(length(min = 1))]
    pub songname: String,
    #[validate(length(min = 1))]
    pub artist: String,
    #[validate(length(min = 1))]
    pub genre: String,
    #[validate(length(min = 1))]
    pub album: String,
}

#[derive(Serialize, Debug)]
pub struct SongResponse {
    pub id: i64,
    pub songname: String,
    pub artist: String,
    pub genre: String,
    pub album: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Song> for SongResponse {
    fn from(song: &Song) -> Self {
        Self {
            id: song.id,
            songname: song.songname.clone(),
            artist: song.artist.clone(),
            genre: song.genre.clone(),
            album: song.album.clone(),
            owner_id: song.owner_id,
            created_at: song.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> SongMetadata {
        SongMetadata {
            songname: "Song1".to_string(),
            artist: "ArtistA".to_string(),
            genre: "Rock".to_string(),
            album: "AlbumA".to_string(),
        }
    }

    #[test]
    fn complete_metadata_passes() {
        assert!(metadata().validate().is_ok());
    }

    #[test]
    fn any_empty_field_is_rejected() {
        for field in ["songname", "artist", "genre", "album"] {
            let mut m = metadata();
            match field {
                "songname" => m.songname.clear(),
                "artist" => m.artist.clear(),
                "genre" => m.genre.clear(),
                _ => m.album.clear(),
            }
            let err = m.validate().expect_err("empty field must fail validation");
            assert!(err.field_errors().contains_key(field));
        }
    }
}
