//! Organization model - the tenancy boundary ("Fairteiler").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Organization entity. The slug is unique and doubles as the domain part
/// of provisioned access-view emails.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub organization_id: Uuid,
    pub name: String,
    pub slug: String,
    pub disabled: bool,
    pub created_utc: DateTime<Utc>,
}

impl Organization {
    /// Create a new organization.
    pub fn new(name: String, slug: String) -> Self {
        Self {
            organization_id: Uuid::new_v4(),
            name,
            slug,
            disabled: false,
            created_utc: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.disabled
    }
}
