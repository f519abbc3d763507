use actix_web::{web, HttpResponse};

use crate::configuration::Platform;
use crate::error::AppError;
use crate::middleware::FileServerHits;
use crate::storage::AccountRepository;

/// GET /admin/metrics
pub async fn metrics(hits: web::Data<FileServerHits>) -> HttpResponse {
    let body = format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        hits.get()
    );

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// POST /admin/reset
///
/// Zeroes the hit counter and deletes every account. Only allowed on the
/// `dev` platform.
#[tracing::instrument(name = "Resetting state", skip(platform, hits, accounts))]
pub async fn reset(
    platform: web::Data<Platform>,
    hits: web::Data<FileServerHits>,
    accounts: web::Data<dyn AccountRepository>,
) -> Result<HttpResponse, AppError> {
    if *platform.get_ref() != Platform::Dev {
        tracing::warn!("Reset attempted outside the dev platform");
        return Err(AppError::Forbidden);
    }

    hits.reset();
    accounts.delete_all_accounts().await?;

    tracing::info!("Hit counter and accounts reset");
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Hits reset to 0 and database reset to initial state."))
}
