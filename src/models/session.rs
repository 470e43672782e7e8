use crate::models::user::Role;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Server-side session row. There is no expiry column: a session lives until
/// logout deletes it.
#[derive(Debug, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// The identity a session resolves to, joined from the users table.
#[derive(Debug, sqlx::FromRow)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}
