use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::User;
use crate::AppState;
use crate::Result;

/// Profile payload returned to the account owner. Never includes the
/// password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

pub async fn me(user: CurrentUser, state: web::Data<AppState>) -> Result<HttpResponse> {
    let profile = state.user_service.profile(user.id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(&profile)))
}

#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    pub url: String,
}

pub async fn update_avatar(
    user: CurrentUser,
    req: web::Json<AvatarRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let updated = state.user_service.update_avatar(user.id, &req.url).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(&updated)))
}
