use crate::auth::{CurrentUser, SESSION_COOKIE, parse_session_cookie_value};
use crate::database::postgres_repository::PostgresRepository;
use crate::database::song::SongRepository;
use crate::database::user::{UserRepository, dummy_verify, verify_password};
use crate::error::app_error::AppError;
use crate::models::song::SongResponse;
use crate::models::user::{CreateUserRequest, LoginRequest, Role, UserResponse};
use rocket::State;
use rocket::http::{Cookie, CookieJar, Status};
use rocket::serde::Serialize;
use rocket::serde::json::Json;
use rocket::routes;
use sqlx::PgPool;
use validator::Validate;

#[derive(Serialize, Debug)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub songs: Vec<SongResponse>,
}

#[rocket::post("/", data = "<payload>")]
pub async fn post_user(pool: &State<PgPool>, payload: Json<CreateUserRequest>) -> Result<(Status, Json<UserResponse>), AppError> {
    payload.validate()?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = repo.create_user(&payload.name, &payload.email, &payload.password, Role::User).await?;

    Ok((Status::Created, Json(UserResponse::from(&user))))
}

#[rocket::post("/login", data = "<payload>")]
pub async fn post_user_login(pool: &State<PgPool>, cookies: &CookieJar<'_>, payload: Json<LoginRequest>) -> Result<Json<UserResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };

    let Some(user) = repo.get_user_by_email(&payload.email).await? else {
        dummy_verify(&payload.password);
        return Err(AppError::InvalidCredentials);
    };

    verify_password(&user.password_hash, &payload.password)?;
    start_session(&repo, user.id, cookies).await?;

    Ok(Json(UserResponse::from(&user)))
}

#[rocket::post("/logout")]
pub async fn post_user_logout(pool: &State<PgPool>, cookies: &CookieJar<'_>) -> Result<Status, AppError> {
    end_session(pool, cookies).await?;
    Ok(Status::Ok)
}

#[rocket::get("/profile")]
pub async fn get_profile(pool: &State<PgPool>, current_user: CurrentUser) -> Result<Json<ProfileResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };

    let user = repo
        .get_user_by_id(current_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let songs = repo.list_songs_by_owner(current_user.id).await?;

    Ok(Json(ProfileResponse {
        user: UserResponse::from(&user),
        songs: songs.iter().map(SongResponse::from).collect(),
    }))
}

pub(crate) async fn start_session(repo: &PostgresRepository, user_id: i64, cookies: &CookieJar<'_>) -> Result<(), AppError> {
    let session = repo.create_session(user_id).await?;
    let value = format!("{}:{}", session.id, user_id);
    cookies.add_private(Cookie::build((SESSION_COOKIE, value)).path("/").build());

    Ok(())
}

pub(crate) async fn end_session(pool: &State<PgPool>, cookies: &CookieJar<'_>) -> Result<(), AppError> {
    if let Some(cookie) = cookies.get_private(SESSION_COOKIE)
        && let Some((session_id, _)) = parse_session_cookie_value(cookie.value())
    {
        let repo = PostgresRepository { pool: pool.inner().clone() };
        repo.delete_session(&session_id).await?;
    }

    cookies.remove_private(Cookie::build(SESSION_COOKIE).build());
    Ok(())
}

pub fn routes() -> Vec<rocket::Route> {
    routes![post_user, post_user_login, post_user_logout, get_profile]
}
