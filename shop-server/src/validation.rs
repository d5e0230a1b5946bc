//! Input validation helpers
//!
//! Every check here runs before a transaction opens.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Short identifiers: payment method, sku, session id
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Review titles
pub const MAX_TITLE_LEN: usize = 200;

/// Order notes
pub const MAX_NOTE_LEN: usize = 500;

/// Review bodies
pub const MAX_COMMENT_LEN: usize = 5000;

// ── Presence ────────────────────────────────────────────────────────

/// Unwrap a required payload field.
pub fn require<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::required(field))
}

// ── Text ────────────────────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Minimal shape check: non-empty, one `@` with text on both sides.
pub fn validate_email(value: &str) -> Result<(), AppError> {
    validate_required_text(value, "email", MAX_EMAIL_LEN)?;
    match value.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(AppError::validation("email is not a valid address").with_detail("field", "email")),
    }
}

// ── Numbers ─────────────────────────────────────────────────────────

/// Unit counts must be at least 1.
pub fn validate_quantity(quantity: i32, field: &str) -> Result<(), AppError> {
    if quantity < 1 {
        return Err(
            AppError::invalid_request(format!("{field} must be at least 1"))
                .with_detail("field", field)
                .with_detail("value", quantity),
        );
    }
    Ok(())
}

/// Exclusive upper bound of a stored money amount (`NUMERIC(12, 2)`), 10^10
pub const MONEY_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

fn amount_out_of_range(field: &str, amount: Decimal, reason: String) -> AppError {
    AppError::with_message(ErrorCode::ValueOutOfRange, reason)
        .with_detail("field", field)
        .with_detail("value", amount.to_string())
}

/// Money amounts supplied by the caller must be non-negative and storable.
pub fn validate_amount(amount: Decimal, field: &str) -> Result<(), AppError> {
    if amount < Decimal::ZERO {
        return Err(amount_out_of_range(
            field,
            amount,
            format!("{field} must not be negative"),
        ));
    }
    ensure_storable(amount, field)?;
    Ok(())
}

/// Computed amounts (line totals, order totals) must fit the stored precision.
pub fn ensure_storable(amount: Decimal, field: &str) -> Result<Decimal, AppError> {
    if amount.abs() >= MONEY_LIMIT {
        return Err(amount_out_of_range(
            field,
            amount,
            format!("{field} must be below {MONEY_LIMIT}"),
        ));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert_eq!(require(Some(3), "quantity").unwrap(), 3);
        let err = require::<i32>(None, "quantity").unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
    }

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("card", "payment_method", 10).is_ok());
        assert!(validate_required_text("   ", "payment_method", 10).is_err());
        assert!(validate_required_text("a very long method", "payment_method", 10).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "notes", 3).is_ok());
        assert!(validate_optional_text(&Some("abc".into()), "notes", 3).is_ok());
        assert!(validate_optional_text(&Some("abcd".into()), "notes", 3).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("a@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn test_quantity() {
        assert!(validate_quantity(1, "quantity").is_ok());
        let err = validate_quantity(0, "quantity").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert!(validate_quantity(-4, "quantity").is_err());
    }

    #[test]
    fn test_amount() {
        assert!(validate_amount(Decimal::ZERO, "tax_amount").is_ok());
        assert!(validate_amount(Decimal::new(150, 2), "tax_amount").is_ok());
        let err = validate_amount(Decimal::new(-1, 2), "tax_amount").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);

        let largest = Decimal::new(999_999_999_999, 2);
        assert!(validate_amount(largest, "tax_amount").is_ok());
        let err = validate_amount(MONEY_LIMIT, "tax_amount").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert!(validate_amount(Decimal::MAX, "shipping_amount").is_err());
    }

    #[test]
    fn test_money_limit() {
        assert_eq!(MONEY_LIMIT, Decimal::new(10_000_000_000, 0));
        assert!(ensure_storable(Decimal::new(-999_999_999_999, 2), "total").is_ok());
        assert!(ensure_storable(Decimal::new(-10_000_000_000, 0), "total").is_err());
    }
}
