//! Actix extractor that turns the `Authorization: Bearer` header into a
//! [`CurrentUser`], so handlers declare the authenticated caller as an
//! argument instead of re-validating tokens by hand.

use std::future::Future;
use std::pin::Pin;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};

use crate::auth::service::CurrentUser;
use crate::error::{AppError, AuthError};
use crate::AppState;

fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .ok_or_else(|| AuthError::MissingToken.into())
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, AppError>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::Internal("application state missing".to_string()))?;

            let token = bearer_token(&req)?;
            let user = state.auth_service.verify(&token).await?;

            if !state.rate_limiter.check_rate_limit(user.id).await {
                return Err(AuthError::RateLimited.into());
            }

            Ok(user)
        })
    }
}
