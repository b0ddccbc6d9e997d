//! # 请求参数校验

use regex::Regex;
use std::sync::LazyLock;

use crate::auth::password::MAX_PASSWORD_BYTES;
use crate::auth::{LoginInput, RegisterInput};
use crate::error::{AppError, Result};
use crate::store::ProfileUpdate;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 32;
const EMAIL_MAX_LEN: usize = 254;

static EMAIL_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]+$").ok());

pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let valid = email.len() <= EMAIL_MAX_LEN
        && EMAIL_REGEX
            .as_ref()
            .is_some_and(|regex| regex.is_match(email));
    if valid {
        Ok(())
    } else {
        Err(AppError::validation("invalid email address", Some("email".to_string())))
    }
}

/// 密码下限按字符计算，上限按字节计算（bcrypt 限制）
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() >= PASSWORD_MIN_LEN && password.len() <= MAX_PASSWORD_BYTES {
        Ok(())
    } else {
        Err(AppError::validation(
            format!(
                "password must be at least {PASSWORD_MIN_LEN} characters and at most {MAX_PASSWORD_BYTES} bytes"
            ),
            Some("password".to_string()),
        ))
    }
}

fn validate_name(field: &str, value: Option<&str>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    let len = value.trim().chars().count();
    if (NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        Ok(())
    } else {
        Err(AppError::validation(
            format!("{field} must be {NAME_MIN_LEN}-{NAME_MAX_LEN} characters"),
            Some(field.to_string()),
        ))
    }
}

pub fn validate_register(input: &RegisterInput) -> Result<()> {
    validate_email(&input.email)?;
    validate_password(&input.password)?;
    validate_name("first_name", input.first_name.as_deref())?;
    validate_name("last_name", input.last_name.as_deref())
}

pub fn validate_login(input: &LoginInput) -> Result<()> {
    validate_email(&input.email)?;
    validate_password(&input.password)
}

pub fn validate_profile_update(update: &ProfileUpdate) -> Result<()> {
    validate_name("first_name", update.first_name.as_deref())?;
    validate_name("last_name", update.last_name.as_deref())
}
