use thiserror::Error;

/// Application-level error taxonomy shared by all fairteil services.
///
/// Structural variants (`NotFound`, `Forbidden`, `BadRequest`, validation)
/// carry text safe to show to callers. `InternalError` and `DatabaseError`
/// wrap opaque causes that are logged, never rendered to end users.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    /// Message safe to render to an end user.
    ///
    /// Internal causes are collapsed to a generic message; the full error
    /// chain stays available for logging via `Display`/`source`.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(err) => format!("Validation error: {}", err),
            AppError::BadRequest(err) => err.to_string(),
            AppError::NotFound(err) => err.to_string(),
            AppError::Unauthorized(err) => err.to_string(),
            AppError::Forbidden(err) => err.to_string(),
            AppError::Conflict(err) => err.to_string(),
            AppError::InternalError(_) | AppError::DatabaseError(_) | AppError::ConfigError(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_not_leaked() {
        let err = AppError::DatabaseError(anyhow::anyhow!("connection refused on 10.0.0.3:5432"));
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn structural_errors_keep_their_message() {
        let err = AppError::NotFound(anyhow::anyhow!("Organization not found"));
        assert_eq!(err.user_message(), "Organization not found");
    }
}
