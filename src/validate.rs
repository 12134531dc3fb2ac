//! Field-level input checks shared by the service layer. All failures map
//! to [`AppError::Validation`] and surface as 400s.

use crate::error::AppError;
use crate::Result;

pub fn required(field: &str, value: &str, max_len: usize) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    if trimmed.len() > max_len {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

/// Shape check only; deliverability is the mail system's problem.
pub fn email(value: &str) -> Result<()> {
    required("email", value, 255)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation("email is not a valid address".to_string()));
    }
    Ok(())
}

pub fn username(value: &str) -> Result<()> {
    required("username", value, 50)?;
    if value.trim().len() < 3 {
        return Err(AppError::Validation(
            "username must be at least 3 characters".to_string(),
        ));
    }
    Ok(())
}

pub fn password(value: &str) -> Result<()> {
    if value.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}
