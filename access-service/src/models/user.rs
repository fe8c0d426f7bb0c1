//! User model - platform-wide user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use super::role::GlobalRole;

/// User entity.
///
/// `secure` means the account carries a true credential rather than a
/// legacy/insecure one. Access-view accounts are created with
/// `is_first_login = true` and the organization slug as last name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_first_login: bool,
    pub is_anonymous: bool,
    pub secure: bool,
    pub global_role_code: String,
    pub banned: bool,
    pub ban_reason: Option<String>,
    pub ban_expiry_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl User {
    /// Whether the user is currently banned. A ban with an expiry in the
    /// past no longer counts.
    pub fn is_banned(&self) -> bool {
        self.banned && self.ban_expiry_utc.map_or(true, |expiry| expiry > Utc::now())
    }

    pub fn global_role(&self) -> GlobalRole {
        // Unknown codes deny: fall back to the non-admin role.
        GlobalRole::from_str(&self.global_role_code).unwrap_or(GlobalRole::User)
    }

    pub fn is_global_admin(&self) -> bool {
        self.global_role() == GlobalRole::Admin
    }
}

/// Fields for creating a user through the storage port.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_first_login: bool,
    pub is_anonymous: bool,
    pub secure: bool,
}

impl NewUser {
    /// Materialize the entity the storage adapter persists.
    pub fn into_user(self) -> User {
        User {
            user_id: Uuid::new_v4(),
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            is_first_login: self.is_first_login,
            is_anonymous: self.is_anonymous,
            secure: self.secure,
            global_role_code: GlobalRole::User.as_str().to_string(),
            banned: false,
            ban_reason: None,
            ban_expiry_utc: None,
            created_utc: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        NewUser {
            email: "a@b.test".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            password_hash: String::new(),
            is_first_login: false,
            is_anonymous: false,
            secure: true,
        }
        .into_user()
    }

    #[test]
    fn expired_ban_no_longer_counts() {
        let mut u = user();
        u.banned = true;
        u.ban_expiry_utc = Some(Utc::now() - Duration::hours(1));
        assert!(!u.is_banned());
    }

    #[test]
    fn ban_without_expiry_is_permanent() {
        let mut u = user();
        u.banned = true;
        assert!(u.is_banned());
    }

    #[test]
    fn unknown_global_role_code_is_not_admin() {
        let mut u = user();
        u.global_role_code = "superuser".into();
        assert!(!u.is_global_admin());
    }
}
