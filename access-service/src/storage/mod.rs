//! Storage port for the access core.
//!
//! The relational engine is an external collaborator; the core only sees
//! this narrow interface. [`postgres::PgStore`] is the production adapter,
//! [`memory::MemoryStore`] backs the tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, run_migrations, PgStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    GlobalRole, Invitation, MemberSelector, Membership, NewUser, Organization, OrgRole, Session,
    User,
};

/// Errors surfaced by storage adapters.
///
/// `Conflict` is the one distinguishable failure: the access-view
/// provisioner retries on it. Everything else is opaque to callers and
/// preserved only for logging.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("storage backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The storage collaborator consumed by every lifecycle component.
///
/// Each call is a suspension point; no in-process locking protects
/// cross-call invariants.
#[async_trait]
pub trait AccessStore: Send + Sync {
    async fn find_organization(&self, organization_id: Uuid)
        -> StoreResult<Option<Organization>>;

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Rejects a duplicate email with [`StoreError::Conflict`].
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;
    async fn delete_user(&self, user_id: Uuid) -> StoreResult<()>;

    async fn list_memberships(&self, organization_id: Uuid) -> StoreResult<Vec<Membership>>;
    /// Emails of all members of the organization (membership ⋈ user).
    async fn list_member_emails(&self, organization_id: Uuid) -> StoreResult<Vec<String>>;
    async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>>;
    /// Oldest membership of the user, used to bind a session's active
    /// organization at creation.
    async fn first_membership_for_user(&self, user_id: Uuid) -> StoreResult<Option<Membership>>;
    /// Rejects a duplicate (organization, user) pair with
    /// [`StoreError::Conflict`].
    async fn create_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> StoreResult<Membership>;
    /// Returns the updated membership, or `None` when the id is unknown.
    async fn update_membership_role(
        &self,
        membership_id: Uuid,
        role: OrgRole,
    ) -> StoreResult<Option<Membership>>;
    /// Returns whether a membership was deleted.
    async fn delete_membership(
        &self,
        organization_id: Uuid,
        selector: &MemberSelector,
    ) -> StoreResult<bool>;

    /// Create-or-resend keyed by (organization, email): a duplicate create
    /// refreshes role, inviter, and expiry in place and keeps the id.
    async fn upsert_invitation(
        &self,
        organization_id: Uuid,
        email: &str,
        role: OrgRole,
        invited_by_user_id: Uuid,
        expires_utc: DateTime<Utc>,
    ) -> StoreResult<Invitation>;
    async fn find_invitation(&self, invitation_id: Uuid) -> StoreResult<Option<Invitation>>;
    /// Returns whether a pending invitation was marked accepted.
    async fn mark_invitation_accepted(&self, invitation_id: Uuid) -> StoreResult<bool>;

    /// Returns whether the user existed.
    async fn set_user_banned(
        &self,
        user_id: Uuid,
        reason: &str,
        expiry_utc: Option<DateTime<Utc>>,
    ) -> StoreResult<bool>;
    /// Returns whether the user existed.
    async fn set_global_role(&self, user_id: Uuid, role: GlobalRole) -> StoreResult<bool>;

    async fn create_session(&self, session: &Session) -> StoreResult<()>;
    async fn find_session(&self, session_token: &str) -> StoreResult<Option<Session>>;
    async fn delete_session(&self, session_token: &str) -> StoreResult<()>;
}
