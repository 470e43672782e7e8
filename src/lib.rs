mod auth;
mod config;
mod database;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod service;
mod storage;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;

use crate::config::{AdminConfig, CorsConfig};
use crate::database::postgres_repository::PostgresRepository;
use crate::database::user::UserRepository;
use crate::middleware::RequestLogger;
use crate::models::user::Role;
use crate::routes as app_routes;
use rocket::fairing::AdHoc;
use rocket::{Build, Rocket, catchers, http::Method};
use rocket_cors::{AllowedOrigins, CorsOptions};
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG overrides the configured level, with per-module granularity
    // (e.g. RUST_LOG=info,groovebox::routes=debug).
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    if json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn ensure_rocket_secret_key() {
    let profile = std::env::var("ROCKET_PROFILE").unwrap_or_else(|_| "debug".to_string());

    // Session cookies are private cookies; outside debug they need a stable key.
    if profile != "debug" && std::env::var("ROCKET_SECRET_KEY").is_err() {
        panic!(
            "ROCKET_SECRET_KEY is required for profile '{}'. Generate one with: openssl rand -base64 32",
            profile
        );
    }
}

fn build_cors(cors_config: &CorsConfig) -> CorsOptions {
    let is_wildcard = cors_config.allowed_origins.len() == 1 && cors_config.allowed_origins[0] == "*";

    if is_wildcard && cors_config.allow_credentials {
        panic!(
            "Invalid CORS configuration: Cannot use wildcard origins (*) with credentials enabled. \
            Either set specific origins or disable credentials."
        );
    }

    let allowed_origins = if cors_config.allowed_origins.is_empty() {
        AllowedOrigins::some_exact::<&str>(&[])
    } else if is_wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&cors_config.allowed_origins.iter().map(String::as_str).collect::<Vec<_>>())
    };

    CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Post, Method::Put, Method::Delete, Method::Options]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::some(&["Content-Type", "Accept"]),
        allow_credentials: cors_config.allow_credentials,
        ..Default::default()
    }
}

/// Create the configured admin account if it does not exist yet, hashed
/// through the same path as every other registration.
fn stage_admin_account(admin: AdminConfig) -> AdHoc {
    AdHoc::try_on_ignite("Admin account", |rocket| async move {
        let Some(pool) = rocket.state::<PgPool>().cloned() else {
            tracing::error!("Admin provisioning requires an initialized database pool");
            return Err(rocket);
        };

        let repo = PostgresRepository { pool };
        match repo.get_user_by_email(&admin.email).await {
            Ok(Some(_)) => Ok(rocket),
            Ok(None) => match repo.create_user(&admin.name, &admin.email, &admin.password, Role::Admin).await {
                Ok(user) => {
                    tracing::info!(user_id = user.id, "Provisioned admin account");
                    Ok(rocket)
                }
                Err(e) => {
                    tracing::error!("Failed to provision admin account: {}", e);
                    Err(rocket)
                }
            },
            Err(e) => {
                tracing::error!("Failed to look up admin account: {}", e);
                Err(rocket)
            }
        }
    })
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    init_tracing(&config.logging.level, config.logging.json_format);
    ensure_rocket_secret_key();

    let cors = build_cors(&config.cors).to_cors().expect("Failed to create CORS fairing");

    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port))
        .merge(("limits.file", "40MiB"))
        .merge(("limits.data-form", "48MiB"));

    let mut rocket = rocket::custom(figment)
        .attach(cors)
        .attach(RequestLogger)
        .attach(db::stage_db(config.database))
        .attach(storage::stage_media_store(config.storage));

    if let Some(admin) = config.admin {
        rocket = rocket.attach(stage_admin_account(admin));
    }

    rocket
        .mount("/api/users", app_routes::user::routes())
        .mount("/api/songs", app_routes::song::routes())
        .mount("/api/dashboard", app_routes::dashboard::routes())
        .mount("/api/admin", app_routes::admin::routes())
        .mount("/api/health", app_routes::health::routes())
        .register(
            "/api",
            catchers![
                app_routes::error::unauthorized,
                app_routes::error::forbidden,
                app_routes::error::not_found,
                app_routes::error::conflict
            ],
        )
}
