//! Invitation model - email-targeted offers to join an organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use super::role::OrgRole;

/// Invitation state codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationState {
    Pending,
    Accepted,
    Cancelled,
}

impl InvitationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationState::Pending => "pending",
            InvitationState::Accepted => "accepted",
            InvitationState::Cancelled => "cancelled",
        }
    }
}

/// Invitation entity.
///
/// Expiry is a virtual state: a pending invitation past `expires_utc` is
/// expired at read time. Nothing sweeps stored rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invitation {
    pub invitation_id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub role_code: String,
    pub state_code: String,
    pub expires_utc: DateTime<Utc>,
    pub accepted_utc: Option<DateTime<Utc>>,
    pub invited_by_user_id: Uuid,
    pub created_utc: DateTime<Utc>,
}

impl Invitation {
    /// Create a new pending invitation.
    pub fn new(
        organization_id: Uuid,
        email: String,
        role: OrgRole,
        invited_by_user_id: Uuid,
        expires_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            invitation_id: Uuid::new_v4(),
            organization_id,
            email,
            role_code: role.as_str().to_string(),
            state_code: InvitationState::Pending.as_str().to_string(),
            expires_utc,
            accepted_utc: None,
            invited_by_user_id,
            created_utc: Utc::now(),
        }
    }

    pub fn role(&self) -> OrgRole {
        OrgRole::from_str(&self.role_code).unwrap_or(OrgRole::Disabled)
    }

    pub fn is_pending(&self) -> bool {
        self.state_code == InvitationState::Pending.as_str()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state_code == InvitationState::Cancelled.as_str()
    }

    /// Time-expired regardless of the stored state code.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_utc
    }

    /// Pending and not time-expired.
    pub fn is_valid(&self) -> bool {
        self.is_pending() && !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invitation(expires_in: Duration) -> Invitation {
        Invitation::new(
            Uuid::new_v4(),
            "invitee@example.test".into(),
            OrgRole::Member,
            Uuid::new_v4(),
            Utc::now() + expires_in,
        )
    }

    #[test]
    fn fresh_invitation_is_valid() {
        assert!(invitation(Duration::days(7)).is_valid());
    }

    #[test]
    fn past_expiry_invalidates_even_while_pending() {
        let inv = invitation(Duration::seconds(-1));
        assert!(inv.is_pending());
        assert!(!inv.is_valid());
    }

    #[test]
    fn cancelled_is_not_valid() {
        let mut inv = invitation(Duration::days(7));
        inv.state_code = InvitationState::Cancelled.as_str().to_string();
        assert!(!inv.is_valid());
    }
}
