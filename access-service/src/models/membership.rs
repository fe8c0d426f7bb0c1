//! Membership model - the user→organization→role join.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use super::role::OrgRole;

/// Membership entity. At most one per (user, organization) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membership {
    pub membership_id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role_code: String,
    pub created_utc: DateTime<Utc>,
}

impl Membership {
    /// Create a new membership.
    pub fn new(organization_id: Uuid, user_id: Uuid, role: OrgRole) -> Self {
        Self {
            membership_id: Uuid::new_v4(),
            organization_id,
            user_id,
            role_code: role.as_str().to_string(),
            created_utc: Utc::now(),
        }
    }

    /// Stored role. Unknown codes deny: they resolve to `Disabled`.
    pub fn role(&self) -> OrgRole {
        OrgRole::from_str(&self.role_code).unwrap_or(OrgRole::Disabled)
    }
}

/// How a member is addressed for removal: by user id or by email.
#[derive(Debug, Clone)]
pub enum MemberSelector {
    Id(Uuid),
    Email(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_code_resolves_to_disabled() {
        let mut m = Membership::new(Uuid::new_v4(), Uuid::new_v4(), OrgRole::Member);
        m.role_code = "superadmin".into();
        assert_eq!(m.role(), OrgRole::Disabled);
    }
}
