/// Chirp routes
///
/// Handlers that need a caller take [`AuthContext`] as their first argument, so
/// authentication runs before the chirp is loaded. Deletion then checks
/// existence (404) before ownership (403).

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AuthContext, AuthorizationGuard};
use crate::error::AppError;
use crate::models::{NewChirp, SortOrder};
use crate::storage::{ChirpRepository, StorageError};
use crate::validators::is_valid_chirp;

#[derive(Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

#[derive(Deserialize)]
pub struct ListChirpsQuery {
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub sort: SortOrder,
}

fn chirp_not_found(err: StorageError) -> AppError {
    match err {
        StorageError::NotFound => AppError::NotFound("chirp not found".to_string()),
        other => other.into(),
    }
}

/// POST /api/chirps
#[tracing::instrument(name = "Creating chirp", skip(caller, form, chirps), fields(user_id = %caller.account_id))]
pub async fn create_chirp(
    caller: AuthContext,
    form: web::Json<CreateChirpRequest>,
    chirps: web::Data<dyn ChirpRepository>,
) -> Result<HttpResponse, AppError> {
    let body = is_valid_chirp(&form.body)?;

    let chirp = chirps
        .create_chirp(NewChirp {
            body,
            user_id: caller.account_id,
        })
        .await?;

    tracing::info!(chirp_id = %chirp.id, "Chirp created");
    Ok(HttpResponse::Created().json(chirp))
}

/// GET /api/chirps?author_id=<uuid>&sort=asc|desc
pub async fn list_chirps(
    query: web::Query<ListChirpsQuery>,
    chirps: web::Data<dyn ChirpRepository>,
) -> Result<HttpResponse, AppError> {
    let list = chirps.list_chirps(query.author_id, query.sort).await?;
    Ok(HttpResponse::Ok().json(list))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    path: web::Path<Uuid>,
    chirps: web::Data<dyn ChirpRepository>,
) -> Result<HttpResponse, AppError> {
    let chirp = chirps
        .get_chirp(path.into_inner())
        .await
        .map_err(chirp_not_found)?;
    Ok(HttpResponse::Ok().json(chirp))
}

/// DELETE /api/chirps/{chirp_id}
///
/// # Errors
/// - 401: missing or invalid access token, whether or not the chirp exists
/// - 404: no such chirp
/// - 403: chirp belongs to another account
#[tracing::instrument(name = "Deleting chirp", skip(caller, path, chirps, guard), fields(user_id = %caller.account_id))]
pub async fn delete_chirp(
    caller: AuthContext,
    path: web::Path<Uuid>,
    chirps: web::Data<dyn ChirpRepository>,
    guard: web::Data<AuthorizationGuard>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = path.into_inner();
    let chirp = chirps.get_chirp(chirp_id).await.map_err(chirp_not_found)?;

    guard.authorize(&caller, chirp.user_id)?;

    chirps.delete_chirp(chirp_id).await.map_err(chirp_not_found)?;
    tracing::info!(chirp_id = %chirp_id, "Chirp deleted");
    Ok(HttpResponse::NoContent().finish())
}
