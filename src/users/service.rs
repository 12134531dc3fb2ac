use std::sync::Arc;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::user_cache_key;
use crate::cache::UserCache;
use crate::db::{User, UserRepository};
use crate::error::AppError;
use crate::Result;

/// Default avatar for a fresh account, derived from the email address the
/// Gravatar way (hash of the trimmed, lowercased address).
pub fn gravatar_url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?d=identicon",
        hex::encode(digest)
    )
}

/// Profile operations for the authenticated user. Writes invalidate the
/// user's cache entry so stale projections never outlive a change.
pub struct UserService {
    users: UserRepository,
    cache: Arc<UserCache>,
}

impl UserService {
    pub fn new(users: UserRepository, cache: Arc<UserCache>) -> Self {
        Self { users, cache }
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    pub async fn update_avatar(&self, user_id: Uuid, url: &str) -> Result<User> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AppError::Validation(
                "avatar must be an http(s) URL".to_string(),
            ));
        }

        let user = self.users.update_avatar(user_id, url).await?;
        self.cache.invalidate(&user_cache_key(user_id)).await;
        Ok(user)
    }
}
