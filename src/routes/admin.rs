use crate::auth::AdminUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::user::{UserRepository, dummy_verify, verify_password};
use crate::error::app_error::AppError;
use crate::models::user::{LoginRequest, Role, UserResponse};
use crate::routes::user::{end_session, start_session};
use rocket::State;
use rocket::http::{CookieJar, Status};
use rocket::routes;
use rocket::serde::json::Json;
use sqlx::PgPool;

/// Admin login runs the same credential verification as a regular login and
/// then requires the admin role; there is no separate credential path.
#[rocket::post("/login", data = "<payload>")]
pub async fn post_admin_login(pool: &State<PgPool>, cookies: &CookieJar<'_>, payload: Json<LoginRequest>) -> Result<Json<UserResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };

    let Some(user) = repo.get_user_by_email(&payload.email).await? else {
        dummy_verify(&payload.password);
        return Err(AppError::InvalidCredentials);
    };

    verify_password(&user.password_hash, &payload.password)?;
    if user.role != Role::Admin {
        return Err(AppError::Forbidden);
    }

    start_session(&repo, user.id, cookies).await?;

    Ok(Json(UserResponse::from(&user)))
}

#[rocket::get("/users")]
pub async fn list_all_users(pool: &State<PgPool>, _admin: AdminUser) -> Result<Json<Vec<UserResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let users = repo.list_users().await?;

    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

#[rocket::post("/logout")]
pub async fn post_admin_logout(pool: &State<PgPool>, cookies: &CookieJar<'_>) -> Result<Status, AppError> {
    end_session(pool, cookies).await?;
    Ok(Status::Ok)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![post_admin_login, list_all_users, post_admin_logout]
}
