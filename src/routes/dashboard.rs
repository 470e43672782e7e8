use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::song::SongRepository;
use crate::error::app_error::AppError;
use crate::models::song::SongResponse;
use rocket::State;
use rocket::routes;
use rocket::serde::json::Json;
use sqlx::PgPool;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 50;

/// The most recently uploaded songs across all users. The feed size is
/// capped; clients asking for more get `MAX_LIMIT` rows.
#[rocket::get("/?<limit>")]
pub async fn get_dashboard(pool: &State<PgPool>, _current_user: CurrentUser, limit: Option<i64>) -> Result<Json<Vec<SongResponse>>, AppError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let songs = repo.list_recent_songs(limit).await?;

    Ok(Json(songs.iter().map(SongResponse::from).collect()))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![get_dashboard]
}
