//! Authentication module: password hashing, token issue/verify, the
//! request extractor for the authenticated caller, and per-user rate
//! limiting.

pub mod extractor;
pub mod handlers;
pub mod password;
mod rate_limit;
mod service;

pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use service::{
    decode_token, issue_token, user_cache_key, AuthService, Claims, CurrentUser, TokenScope,
};
