//! Unified service-layer error type for shop-server
//!
//! `ServiceError` bridges the gap between storage errors (`StoreError`) and
//! the API-layer error (`AppError`). It enables `?` propagation on both
//! without manual `.map_err(|e| { tracing::error!(...); AppError::new(...) })`
//! boilerplate.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::db::StoreError;

/// Service-layer error
///
/// - `Store`: storage/infrastructure errors (logged, mapped to Conflict,
///   DatabaseError or InternalError)
/// - `App`: business-rule errors (transparent pass-through to client)
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    App(#[from] AppError),
}

impl ServiceError {
    /// The client-visible error code this error resolves to
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::App(e) => e.code,
            ServiceError::Store(e) => store_code(e),
        }
    }
}

fn store_code(err: &StoreError) -> ErrorCode {
    match err {
        StoreError::Conflict => ErrorCode::Conflict,
        StoreError::Database(_) | StoreError::Migrate(_) => ErrorCode::DatabaseError,
        StoreError::UniqueViolation(_) | StoreError::Corrupted(_) => ErrorCode::InternalError,
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Store(StoreError::Conflict) => {
                tracing::warn!("Transaction aborted by a concurrent request");
                AppError::conflict("Concurrent modification, retry the operation")
            }
            ServiceError::Store(store_err) => {
                tracing::error!(error = %store_err, "Service store error");
                AppError::new(store_code(&store_err))
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UniqueKey;

    #[test]
    fn test_app_error_passes_through() {
        let err: AppError = ServiceError::from(AppError::new(ErrorCode::CartLineExists)).into();
        assert_eq!(err.code, ErrorCode::CartLineExists);
    }

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err = ServiceError::from(StoreError::Conflict);
        assert_eq!(err.code(), ErrorCode::Conflict);
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::Conflict);
    }

    #[test]
    fn test_driver_failure_maps_to_database_error() {
        let err = ServiceError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::DatabaseError);
        assert_eq!(app.message, "Database error");
    }

    #[test]
    fn test_display_is_transparent() {
        let err = ServiceError::from(AppError::with_message(ErrorCode::CartNotFound, "Cart 3 not found"));
        assert_eq!(err.to_string(), "Cart 3 not found");
        let err = ServiceError::from(StoreError::Conflict);
        assert_eq!(err.to_string(), StoreError::Conflict.to_string());
    }

    #[test]
    fn test_store_failure_maps_to_internal() {
        let err = ServiceError::from(StoreError::UniqueViolation(UniqueKey::Other));
        assert_eq!(err.code(), ErrorCode::InternalError);
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InternalError);
    }
}
