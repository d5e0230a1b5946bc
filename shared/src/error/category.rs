//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: User errors
/// - 2xxx: Cart errors
/// - 4xxx: Order errors
/// - 6xxx: Product / stock errors
/// - 7xxx: Review errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// User errors (1xxx)
    User,
    /// Cart errors (2xxx)
    Cart,
    /// Order errors (4xxx)
    Order,
    /// Product and stock errors (6xxx)
    Product,
    /// Review errors (7xxx)
    Review,
    /// System errors (3xxx, 5xxx, 8xxx and 9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::User,
            2000..3000 => Self::Cart,
            4000..5000 => Self::Order,
            6000..7000 => Self::Product,
            7000..8000 => Self::Review,
            _ => Self::System,
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
