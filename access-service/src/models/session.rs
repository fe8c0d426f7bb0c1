//! Session model - the credential-to-organization binding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Session entity.
///
/// The active-organization binding is computed once at creation from the
/// user's first known membership; the role itself is never stored here and
/// is resolved fresh on every permission check.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub session_token: String,
    pub user_id: Uuid,
    pub active_organization_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
}

impl Session {
    /// Create a new session with an opaque random token.
    pub fn new(user_id: Uuid, active_organization_id: Option<Uuid>) -> Self {
        Self {
            session_token: Uuid::new_v4().to_string(),
            user_id,
            active_organization_id,
            created_utc: Utc::now(),
        }
    }
}
