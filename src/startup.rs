use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AccessTokenCodec, AuthorizationGuard, PasswordHasher, RefreshTokenStore, SessionService};
use crate::clock::Clock;
use crate::configuration::Settings;
use crate::error::AppError;
use crate::middleware::{CountHits, FileServerHits};
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, health_check, list_chirps, login, metrics,
    polka_webhook, refresh, reset, revoke, update_user,
};
use crate::storage::Stores;

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{}: {}", context, err))
}

/// Build the auth components from `settings` and start serving on `listener`.
///
/// `clock` drives token issuance and expiry checks everywhere.
pub fn run(
    listener: TcpListener,
    settings: &Settings,
    stores: Stores,
    clock: Arc<dyn Clock>,
) -> Result<Server, std::io::Error> {
    let auth = &settings.auth;

    let hasher = PasswordHasher::new(&auth.hashing).map_err(|e| io_error("password hasher", e))?;
    let codec = AccessTokenCodec::new(&auth.jwt_secret, auth.access_token_ttl(), clock.clone());
    let refresh_tokens = RefreshTokenStore::new(
        stores.refresh_tokens.clone(),
        clock,
        auth.refresh_token_ttl(),
    );
    let sessions = SessionService::new(
        stores.accounts.clone(),
        hasher.clone(),
        codec.clone(),
        refresh_tokens,
    );
    let guard = AuthorizationGuard::new(codec, auth.polka_key.clone());
    let hits = Arc::new(FileServerHits::default());

    let hasher = web::Data::new(hasher);
    let sessions = web::Data::new(sessions);
    let guard = web::Data::new(guard);
    let platform = web::Data::new(settings.application.platform);
    let hits_data = web::Data::from(hits.clone());
    let accounts = web::Data::from(stores.accounts);
    let chirps = web::Data::from(stores.chirps);
    let static_dir = settings.application.static_dir.clone();

    tracing::info!(
        platform = ?settings.application.platform,
        static_dir = %static_dir,
        access_token_ttl_seconds = auth.access_token_ttl_seconds,
        refresh_token_ttl_days = auth.refresh_token_ttl_days,
        "Application components initialised"
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            // Malformed bodies and queries share the JSON error envelope
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::InvalidInput(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::InvalidInput(err.to_string()).into()
            }))
            .app_data(hasher.clone())
            .app_data(sessions.clone())
            .app_data(guard.clone())
            .app_data(platform.clone())
            .app_data(hits_data.clone())
            .app_data(accounts.clone())
            .app_data(chirps.clone())
            .service(
                web::scope("/api")
                    .route("/healthz", web::get().to(health_check))
                    .route("/users", web::post().to(create_user))
                    .route("/users", web::put().to(update_user))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/revoke", web::post().to(revoke))
                    .route("/chirps", web::post().to(create_chirp))
                    .route("/chirps", web::get().to(list_chirps))
                    .route("/chirps/{chirp_id}", web::get().to(get_chirp))
                    .route("/chirps/{chirp_id}", web::delete().to(delete_chirp))
                    .route("/polka/webhooks", web::post().to(polka_webhook)),
            )
            .service(
                web::scope("/admin")
                    .route("/metrics", web::get().to(metrics))
                    .route("/reset", web::post().to(reset)),
            )
            .service(
                web::scope("/app")
                    .wrap(CountHits::new(hits.clone()))
                    .service(fs::Files::new("", &static_dir).index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
