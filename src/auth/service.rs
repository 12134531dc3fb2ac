use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::cache::UserCache;
use crate::config::AuthConfig;
use crate::db::{User, UserRepository};
use crate::error::{AppError, AuthError};
use crate::users::gravatar_url;
use crate::validate;
use crate::Result;

/// What a token is good for. Access tokens authenticate API requests;
/// the other scopes are single-purpose links handed out by email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    Access,
    EmailVerify,
    PasswordReset,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    pub scope: TokenScope,
}

/// The authenticated caller's identity, resolved from a bearer token.
/// Also the projection stored in the cache layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            is_verified: user.is_verified,
            is_active: user.is_active,
        }
    }
}

pub fn user_cache_key(user_id: Uuid) -> String {
    format!("user:{}", user_id)
}

pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    scope: TokenScope,
    ttl_secs: i64,
) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + ttl_secs,
        iat: now,
        scope,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token encoding failed: {}", e)))
}

pub fn decode_token(secret: &str, token: &str) -> std::result::Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

pub struct AuthService {
    users: UserRepository,
    cache: Arc<UserCache>,
    config: AuthConfig,
    user_cache_ttl_secs: u64,
}

impl AuthService {
    pub fn new(
        users: UserRepository,
        cache: Arc<UserCache>,
        config: AuthConfig,
        user_cache_ttl_secs: u64,
    ) -> Self {
        Self {
            users,
            cache,
            config,
            user_cache_ttl_secs,
        }
    }

    /// Creates a new account and returns it together with an email
    /// verification token. Delivering the token is the mailer's job.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String)> {
        validate::username(username)?;
        validate::email(email)?;
        validate::password(password)?;

        if self.users.get_by_email(email).await?.is_some() {
            return Err(AppError::Conflict(
                "user with this email already exists".to_string(),
            ));
        }
        if self.users.get_by_username(username).await?.is_some() {
            return Err(AppError::Conflict(
                "user with this username already exists".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let user = User::new(
            username.trim().to_string(),
            email.trim().to_string(),
            password_hash,
            Some(gravatar_url(email)),
        );
        let user = self.users.create(&user).await?;

        let verify_token = issue_token(
            &self.config.jwt_secret,
            user.id,
            TokenScope::EmailVerify,
            self.config.email_token_expiry_secs,
        )?;

        Ok((user, verify_token))
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String> {
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }
        if !user.is_active {
            return Err(AuthError::Disabled.into());
        }

        issue_token(
            &self.config.jwt_secret,
            user.id,
            TokenScope::Access,
            self.config.access_token_expiry_secs,
        )
    }

    /// Resolves a bearer token to its user. The token's signature and
    /// expiry are checked before the cache is consulted, so an expired
    /// token is rejected even while a cache entry for the user exists.
    pub async fn verify(&self, token: &str) -> Result<CurrentUser> {
        let claims = decode_token(&self.config.jwt_secret, token)?;
        if claims.scope != TokenScope::Access {
            return Err(AuthError::InvalidToken.into());
        }
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let cache_key = user_cache_key(user_id);

        if let Some(cached) = self.cache.get(&cache_key).await {
            match serde_json::from_str::<CurrentUser>(&cached) {
                Ok(user) => {
                    if !user.is_active {
                        return Err(AuthError::Disabled.into());
                    }
                    return Ok(user);
                }
                Err(e) => {
                    warn!(key = %cache_key, error = %e, "dropping undecodable cache entry");
                    self.cache.invalidate(&cache_key).await;
                }
            }
        }

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if !user.is_active {
            return Err(AuthError::Disabled.into());
        }
        let current = CurrentUser::from(&user);

        // The cache entry must not outlive the token that produced it.
        let remaining = claims.exp - Utc::now().timestamp();
        let ttl = (self.user_cache_ttl_secs as i64).min(remaining);
        if ttl > 0 {
            if let Ok(json) = serde_json::to_string(&current) {
                self.cache.set(&cache_key, &json, ttl as u64).await;
            }
        }

        Ok(current)
    }

    /// Consumes an email-verification token. Idempotent: confirming an
    /// already-verified account is not an error.
    pub async fn confirm_email(&self, token: &str) -> Result<()> {
        let claims = decode_token(&self.config.jwt_secret, token)?;
        if claims.scope != TokenScope::EmailVerify {
            return Err(AuthError::InvalidToken.into());
        }
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if user.is_verified {
            return Ok(());
        }

        self.users.set_verified(user.id).await?;
        self.cache.invalidate(&user_cache_key(user.id)).await;
        Ok(())
    }

    /// Returns a reset token when the account exists, `None` otherwise.
    /// The handler reports the same message either way so the endpoint
    /// cannot be used to probe for registered addresses.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>> {
        let Some(user) = self.users.get_by_email(email).await? else {
            return Ok(None);
        };

        let token = issue_token(
            &self.config.jwt_secret,
            user.id,
            TokenScope::PasswordReset,
            self.config.email_token_expiry_secs,
        )?;
        Ok(Some(token))
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        validate::password(new_password)?;

        let claims = decode_token(&self.config.jwt_secret, token)?;
        if claims.scope != TokenScope::PasswordReset {
            return Err(AuthError::InvalidToken.into());
        }
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let password_hash = hash_password(new_password)?;
        self.users.update_password(user.id, &password_hash).await?;
        self.cache.invalidate(&user_cache_key(user.id)).await;
        Ok(())
    }
}
