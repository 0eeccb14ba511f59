//! Client-side input checks, applied before any request leaves the process.

use std::path::Path;

use super::error::ValidationError;

const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_SPECIALS: &str = "!@#$%^&*()_+-=[]{};:'\",.<>?/\\|`~";
const TITLE_MAX_LEN: usize = 255;

pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Password policy enforced by the backend on registration and password change.
pub fn password_strength(password: &str) -> Result<(), ValidationError> {
    let rule = |message: &str| -> Result<(), ValidationError> {
        Err(ValidationError::invalid("password", message))
    };

    if password.chars().count() < PASSWORD_MIN_LEN {
        return rule("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return rule("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return rule("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return rule("Password must contain at least one number");
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return rule("Password must contain at least one special character");
    }
    Ok(())
}

pub fn registration(
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    require("username", username)?;
    require("email", email)?;
    email_shape(email)?;
    password_strength(password)?;
    if password != confirm_password {
        return Err(ValidationError::invalid(
            "confirm_password",
            "Passwords do not match",
        ));
    }
    Ok(())
}

pub fn email_shape(email: &str) -> Result<(), ValidationError> {
    let trimmed = email.trim();
    let valid = trimmed
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(ValidationError::invalid(
            "email",
            "Please enter a valid email address",
        ));
    }
    Ok(())
}

pub fn account_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    require("email", email)?;
    email_shape(email)?;
    require("password", password)
}

pub fn post_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::invalid("title", "Title is required"));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(ValidationError::invalid(
            "title",
            "Title must be at most 255 characters",
        ));
    }
    Ok(())
}

pub fn post_description(description: &str) -> Result<(), ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::invalid(
            "description",
            "Description is required",
        ));
    }
    Ok(())
}

pub fn post_price(price: &str) -> Result<(), ValidationError> {
    match price.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(()),
        _ => Err(ValidationError::invalid("price", "Please enter a valid price")),
    }
}

pub fn upload_extension(path: &Path, expected: &'static str) -> Result<(), ValidationError> {
    let matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(expected));
    if !matches {
        return Err(ValidationError::invalid(
            "file",
            format!("Only .{expected} files are allowed"),
        ));
    }
    Ok(())
}
