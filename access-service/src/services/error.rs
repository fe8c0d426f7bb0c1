use service_core::error::AppError;
use thiserror::Error;

use crate::storage::StoreError;

/// Error taxonomy for the access core.
///
/// Structural variants propagate to callers as typed failures. `Storage`
/// keeps its cause for logging only; denial variants deliberately carry no
/// detail about other tenants' data.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("insufficient role for the requested operation")]
    PermissionDenied,

    #[error("no active organization for this session")]
    NoActiveOrganization,

    #[error("authentication required")]
    Unauthenticated,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage failure")]
    Storage(#[source] anyhow::Error),
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => AccessError::Conflict(constraint),
            StoreError::Backend(cause) => AccessError::Storage(cause),
        }
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            AccessError::PermissionDenied => {
                AppError::Forbidden(anyhow::anyhow!("insufficient role for the requested operation"))
            }
            AccessError::NoActiveOrganization => {
                AppError::Forbidden(anyhow::anyhow!("no active organization for this session"))
            }
            AccessError::Unauthenticated => {
                AppError::Unauthorized(anyhow::anyhow!("authentication required"))
            }
            AccessError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            AccessError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            AccessError::Storage(cause) => AppError::DatabaseError(cause),
        }
    }
}

impl AccessError {
    /// Whether a retry with recomputed inputs may succeed. Only uniqueness
    /// conflicts qualify.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AccessError::Conflict(_))
    }
}
