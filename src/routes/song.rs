use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::song::SongRepository;
use crate::error::app_error::AppError;
use crate::models::song::{SongMetadata, SongResponse};
use crate::service::catalog::CatalogService;
use crate::storage::{FileStore, StagedUpload};
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::{FromForm, State};
use rocket::http::Status;
use rocket::routes;
use rocket::serde::json::Json;
use sqlx::PgPool;

#[derive(FromForm)]
pub struct SongUploadForm<'r> {
    pub songname: String,
    pub artist: String,
    pub genre: String,
    pub album: String,
    pub file: TempFile<'r>,
}

#[rocket::post("/", data = "<form>")]
pub async fn post_song(
    pool: &State<PgPool>,
    store: &State<FileStore>,
    current_user: CurrentUser,
    mut form: Form<SongUploadForm<'_>>,
) -> Result<(Status, Json<SongResponse>), AppError> {
    let metadata = SongMetadata {
        songname: form.songname.clone(),
        artist: form.artist.clone(),
        genre: form.genre.clone(),
        album: form.album.clone(),
    };
    let client_name = form.file.raw_name().map(|name| name.dangerous_unsafe_unsanitized_raw().as_str().to_string());

    let staged_path = store.staging_path();
    form.file
        .move_copy_to(&staged_path)
        .await
        .map_err(|e| AppError::io("Failed to stage uploaded file", e))?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = CatalogService::new(&repo, store.inner());
    let song = service
        .upload(&current_user, &metadata, StagedUpload { path: staged_path, client_name })
        .await?;

    Ok((Status::Created, Json(SongResponse::from(&song))))
}

#[rocket::get("/<id>")]
pub async fn get_song(pool: &State<PgPool>, _current_user: CurrentUser, id: i64) -> Result<Json<SongResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };

    if let Some(song) = repo.get_song_by_id(id).await? {
        Ok(Json(SongResponse::from(&song)))
    } else {
        Err(AppError::NotFound("Song not found".to_string()))
    }
}

#[rocket::put("/<id>", data = "<payload>")]
pub async fn put_song(
    pool: &State<PgPool>,
    store: &State<FileStore>,
    current_user: CurrentUser,
    id: i64,
    payload: Json<SongMetadata>,
) -> Result<Json<SongResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = CatalogService::new(&repo, store.inner());
    let song = service.edit(&current_user, id, &payload).await?;

    Ok(Json(SongResponse::from(&song)))
}

#[rocket::delete("/<id>")]
pub async fn delete_song(pool: &State<PgPool>, store: &State<FileStore>, current_user: CurrentUser, id: i64) -> Result<Status, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = CatalogService::new(&repo, store.inner());
    service.delete(&current_user, id).await?;

    Ok(Status::Ok)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![post_song, get_song, put_song, delete_song]
}
