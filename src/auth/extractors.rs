/// Actix extractors that gate handlers on credentials.
///
/// Extractors run before the handler body, so authentication always happens
/// before any resource lookup. Declare them as the first handler argument.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

use crate::auth::guard::{AuthContext, AuthorizationGuard};
use crate::error::AppError;

fn guard(req: &HttpRequest) -> Result<&AuthorizationGuard, AppError> {
    req.app_data::<web::Data<AuthorizationGuard>>()
        .map(|data| data.get_ref())
        .ok_or_else(|| AppError::Internal("authorization guard is not registered".to_string()))
}

impl FromRequest for AuthContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = guard(req).and_then(|guard| {
            guard.authenticate(req.headers()).map_err(AppError::from)
        });

        if let Ok(ctx) = &result {
            tracing::debug!(user_id = %ctx.account_id, "Access token validated");
        }
        ready(result)
    }
}

/// Proof that the request carried the configured service `ApiKey`
#[derive(Debug, Clone, Copy)]
pub struct ServiceCaller;

impl FromRequest for ServiceCaller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = guard(req).and_then(|guard| {
            guard
                .authorize_service(req.headers())
                .map(|_| ServiceCaller)
                .map_err(AppError::from)
        });
        ready(result)
    }
}
