//! Input validation for API requests.
//!
//! Field checks return `Result<(), String>` so handlers can feed them into a
//! `ValidationErrorBuilder` and report every bad field at once.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Item codes: alphanumeric start, then alphanumerics, dots, dashes, underscores, slashes
    static ref ITEM_CODE_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9][A-Za-z0-9._/-]*$"
    ).unwrap();

    /// Branch codes: short uppercase-or-digit identifiers with dashes
    static ref BRANCH_CODE_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?$"
    ).unwrap();

    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^@\s]+@[^@\s]+\.[^@\s]+$"
    ).unwrap();

    static ref PHONE_REGEX: Regex = Regex::new(
        r"^\+?[0-9()\-. ]{5,30}$"
    ).unwrap();

    static ref USERNAME_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9_.-]{3,32}$"
    ).unwrap();
}

/// Validate a required display name (location, category, supplier, item)
pub fn validate_name(name: &str, label: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err(format!("{} is required", label));
    }

    if name.len() > 200 {
        return Err(format!("{} is too long (max 200 characters)", label));
    }

    Ok(())
}

/// Validate an optional free-text field
pub fn validate_text(value: &Option<String>, label: &str, max: usize) -> Result<(), String> {
    if let Some(v) = value {
        if v.len() > max {
            return Err(format!("{} is too long (max {} characters)", label, max));
        }
    }
    Ok(())
}

pub fn validate_item_code(code: &str) -> Result<(), String> {
    if code.is_empty() {
        return Err("Item code is required".to_string());
    }

    if code.len() > 50 {
        return Err("Item code is too long (max 50 characters)".to_string());
    }

    if !ITEM_CODE_REGEX.is_match(code) {
        return Err("Item code may only contain letters, digits, '.', '-', '_' and '/'".to_string());
    }

    Ok(())
}

pub fn validate_branch_code(code: &Option<String>) -> Result<(), String> {
    if let Some(c) = code {
        if c.len() > 16 {
            return Err("Branch code is too long (max 16 characters)".to_string());
        }
        if !BRANCH_CODE_REGEX.is_match(c) {
            return Err("Branch code must be alphanumeric with dashes".to_string());
        }
    }
    Ok(())
}

pub fn validate_email(email: &Option<String>) -> Result<(), String> {
    if let Some(e) = email {
        if e.is_empty() {
            return Ok(()); // Empty string treated as no email
        }
        if e.len() > 254 || !EMAIL_REGEX.is_match(e) {
            return Err("Invalid email address".to_string());
        }
    }
    Ok(())
}

pub fn validate_phone(phone: &Option<String>) -> Result<(), String> {
    if let Some(p) = phone {
        if p.is_empty() {
            return Ok(());
        }
        if !PHONE_REGEX.is_match(p) {
            return Err("Invalid phone number".to_string());
        }
    }
    Ok(())
}

pub fn validate_quantity(quantity: i64) -> Result<(), String> {
    if quantity < 0 {
        return Err("Quantity cannot be negative".to_string());
    }
    Ok(())
}

/// Purchases must buy at least one unit
pub fn validate_purchase_quantity(quantity: i64) -> Result<(), String> {
    if quantity < 1 {
        return Err("Quantity must be at least 1".to_string());
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() {
        return Err("Price must be a number".to_string());
    }
    if price < 0.0 {
        return Err("Price cannot be negative".to_string());
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if !USERNAME_REGEX.is_match(username) {
        return Err(
            "Username must be 3-32 characters of letters, digits, '.', '-' or '_'".to_string(),
        );
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }

    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_letter || !has_digit {
        return Err("Password must contain at least one letter and one digit".to_string());
    }

    Ok(())
}

/// Coerce an ISO 8601 date or date-time into `YYYY-MM-DD`.
///
/// Accepts `2024-03-01`, `2024-03-01T10:00:00Z`, `2024-03-01T10:00:00+02:00`
/// and `2024-03-01 10:00:00`.
pub fn normalize_date(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Date is required".to_string());
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.format("%Y-%m-%d").to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive().format("%Y-%m-%d").to_string());
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.date().format("%Y-%m-%d").to_string());
        }
    }

    Err(format!("Invalid date '{}': expected YYYY-MM-DD", value))
}

/// Normalize an optional date in place, recording a failure under `field`.
pub fn normalize_optional_date(
    value: &mut Option<String>,
    field: &str,
    errors: &mut super::error::ValidationErrorBuilder,
) {
    if let Some(v) = value.as_mut() {
        match normalize_date(v) {
            Ok(date) => *v = date,
            Err(e) => {
                errors.add(field, e);
            }
        }
    }
}

/// Trim surrounding whitespace; blank strings become `None`.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
