use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::user::{Role, User};
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::LazyLock;

/// A real Argon2 hash generated once at startup, used as a timing decoy
/// so that login requests for non-existent users take the same time as
/// requests for existing users.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"dummy-never-matches", &salt)
        .expect("failed to generate dummy hash")
        .to_string()
});

#[async_trait::async_trait]
pub trait UserRepository {
    async fn create_user(&self, name: &str, email: &str, password: &str, role: Role) -> Result<User, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
}

#[async_trait::async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, name: &str, email: &str, password: &str, role: Role) -> Result<User, AppError> {
        let password_hash = hash_password(password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, role, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_email_error(email, e))?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM users
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

/// The uniqueness constraint on `users.email` is the source of truth for
/// duplicate registration; the violation is surfaced as a distinct error
/// rather than a generic database failure.
fn duplicate_email_error(email: &str, e: sqlx::Error) -> AppError {
    if e.as_database_error().is_some_and(|db_err| db_err.is_unique_violation()) {
        AppError::UserAlreadyExists(email.to_string())
    } else {
        e.into()
    }
}

pub(crate) fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = PasswordHash::generate(Argon2::default(), password.as_bytes(), &salt)
        .map_err(|e| AppError::password_hash("Failed to hash password", e))?;

    Ok(hash.to_string())
}

pub(crate) fn verify_password(stored_hash: &str, password: &str) -> Result<(), AppError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AppError::password_hash("Failed to parse stored password hash", e))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::InvalidCredentials)?;

    Ok(())
}

/// Perform a throwaway Argon2 verification to equalize response timing
/// regardless of whether the target account exists.
pub(crate) fn dummy_verify(password: &str) {
    let hash = PasswordHash::new(&DUMMY_HASH).expect("invalid dummy hash");
    let _ = Argon2::default().verify_password(password.as_bytes(), &hash);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("pw123").unwrap();
        assert!(verify_password(&hash, "pw123").is_ok());
        assert!(matches!(verify_password(&hash, "wrong"), Err(AppError::InvalidCredentials)));
    }

    #[test]
    fn identical_passwords_hash_differently() {
        let first = hash_password("pw123").unwrap();
        let second = hash_password("pw123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn plaintext_never_appears_in_hash() {
        let hash = hash_password("super-secret-password").unwrap();
        assert!(!hash.contains("super-secret-password"));
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn garbage_stored_hash_fails_closed() {
        assert!(verify_password("not-a-phc-string", "pw123").is_err());
    }
}
