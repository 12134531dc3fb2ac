//! Persistence layer: data models and per-entity repositories over a shared
//! Postgres pool. Owner scoping is enforced in the SQL, not in callers.

pub mod contacts;
pub mod models;
pub mod users;

pub use contacts::{BirthdayWindow, ContactRepository};
pub use models::{Contact, ContactData, ContactFilter, ContactPage, Page, User};
pub use users::UserRepository;

use crate::error::{AppError, DatabaseError};
use crate::Result;
use sqlx::PgPool;

/// Applies pending schema migrations. Called once at startup; a failure here
/// is fatal and the process must not serve traffic.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Database(DatabaseError::Migration(e.to_string())))
}
