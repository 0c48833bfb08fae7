//! Input validation shared by every route that writes.

use crate::error::{AppError, Result};

pub const MAX_HOUSE_NAME_LEN: usize = 64;
pub const MAX_TITLE_LEN: usize = 128;
pub const MAX_NICKNAME_LEN: usize = 64;
pub const MAX_CONTENT_LEN: usize = 8000;

/// Trims `value` and checks it is non-empty and at most `max_len` characters.
pub fn required(field: &str, value: &str, max_len: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn house_name(value: &str) -> Result<String> {
    required("name", value, MAX_HOUSE_NAME_LEN)
}

pub fn title(value: &str) -> Result<String> {
    required("title", value, MAX_TITLE_LEN)
}

pub fn nickname(value: &str) -> Result<String> {
    required("nickname", value, MAX_NICKNAME_LEN)
}

pub fn content(value: &str) -> Result<String> {
    required("content", value, MAX_CONTENT_LEN)
}
