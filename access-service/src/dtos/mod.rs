//! Boundary envelope for lifecycle operations.
//!
//! The surrounding application layer renders every operation as a tagged
//! success/failure value; raw errors never cross the boundary. Storage
//! causes are collapsed to a generic message here and preserved in logs
//! only.

use serde::Serialize;

use crate::services::AccessError;

/// Tagged operation result handed to the caller.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ActionResult<T> {
    Success {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<T>,
    },
    Failure {
        error_message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        validation_issues: Option<Vec<String>>,
    },
}

impl<T> ActionResult<T> {
    pub fn success(message: impl Into<String>) -> Self {
        ActionResult::Success {
            message: message.into(),
            data: None,
        }
    }

    pub fn success_with(message: impl Into<String>, data: T) -> Self {
        ActionResult::Success {
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(error_message: impl Into<String>) -> Self {
        ActionResult::Failure {
            error_message: error_message.into(),
            validation_issues: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success { .. })
    }
}

impl<T> From<AccessError> for ActionResult<T> {
    fn from(err: AccessError) -> Self {
        let (error_message, validation_issues) = match &err {
            AccessError::NotFound(what) => (format!("{} not found", what), None),
            AccessError::PermissionDenied => (
                "You do not have permission to perform this action".to_string(),
                None,
            ),
            AccessError::NoActiveOrganization => (
                "Join an organization before performing this action".to_string(),
                None,
            ),
            AccessError::Unauthenticated => ("Please sign in".to_string(), None),
            AccessError::Validation(issue) => (
                "Some fields are invalid".to_string(),
                Some(vec![issue.clone()]),
            ),
            AccessError::Conflict(_) => {
                ("The request conflicts with existing data".to_string(), None)
            }
            AccessError::Storage(cause) => {
                tracing::error!(error = %cause, "storage failure surfaced at boundary");
                ("Something went wrong, please try again".to_string(), None)
            }
        };
        ActionResult::Failure {
            error_message,
            validation_issues,
        }
    }
}
