//! In-memory storage adapter.
//!
//! Backs the test suite and small embedders. Enforces the same uniqueness
//! rules as the PostgreSQL adapter and supports one-shot failure injection
//! so compensation paths can be exercised deterministically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{AccessStore, StoreError, StoreResult};
use crate::models::{
    GlobalRole, Invitation, InvitationState, MemberSelector, Membership, NewUser, Organization,
    OrgRole, Session, User,
};

#[derive(Default)]
struct Inner {
    organizations: HashMap<Uuid, Organization>,
    users: HashMap<Uuid, User>,
    memberships: Vec<Membership>,
    invitations: Vec<Invitation>,
    sessions: HashMap<String, Session>,
}

/// One-shot failure switches, consumed on first use.
#[derive(Default)]
struct FailureInjection {
    create_user_conflicts: u32,
    fail_create_membership: bool,
    fail_delete_user: bool,
    fail_set_user_banned: bool,
    fail_set_global_role: bool,
}

/// In-memory implementation of [`AccessStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    failures: Mutex<FailureInjection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn failures(&self) -> MutexGuard<'_, FailureInjection> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn backend_failure(what: &str) -> StoreError {
        StoreError::Backend(anyhow::anyhow!("injected {} failure", what))
    }

    // ==================== Seeding helpers ====================

    pub fn insert_organization(&self, organization: Organization) {
        self.lock()
            .organizations
            .insert(organization.organization_id, organization);
    }

    pub fn insert_user(&self, user: User) {
        self.lock().users.insert(user.user_id, user);
    }

    pub fn insert_membership(&self, membership: Membership) {
        self.lock().memberships.push(membership);
    }

    pub fn invitation_count(&self) -> usize {
        self.lock().invitations.len()
    }

    /// Flip an invitation to the cancelled state. Revocation is not wired
    /// into any current flow, so tests seed it directly.
    pub fn cancel_invitation(&self, invitation_id: Uuid) {
        if let Some(invitation) = self
            .lock()
            .invitations
            .iter_mut()
            .find(|i| i.invitation_id == invitation_id)
        {
            invitation.state_code = InvitationState::Cancelled.as_str().to_string();
        }
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    // ==================== Failure injection ====================

    /// Make the next `n` `create_user` calls fail with a uniqueness
    /// conflict regardless of the email.
    pub fn inject_create_user_conflicts(&self, n: u32) {
        self.failures().create_user_conflicts = n;
    }

    pub fn inject_create_membership_failure(&self) {
        self.failures().fail_create_membership = true;
    }

    pub fn inject_delete_user_failure(&self) {
        self.failures().fail_delete_user = true;
    }

    pub fn inject_set_user_banned_failure(&self) {
        self.failures().fail_set_user_banned = true;
    }

    pub fn inject_set_global_role_failure(&self) {
        self.failures().fail_set_global_role = true;
    }
}

#[async_trait]
impl AccessStore for MemoryStore {
    async fn find_organization(
        &self,
        organization_id: Uuid,
    ) -> StoreResult<Option<Organization>> {
        Ok(self.lock().organizations.get(&organization_id).cloned())
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.lock().users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        {
            let mut failures = self.failures();
            if failures.create_user_conflicts > 0 {
                failures.create_user_conflicts -= 1;
                return Err(StoreError::Conflict("users_email_key".into()));
            }
        }
        let mut inner = self.lock();
        if inner
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        let user = new_user.into_user();
        inner.users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, user_id: Uuid) -> StoreResult<()> {
        {
            let mut failures = self.failures();
            if failures.fail_delete_user {
                failures.fail_delete_user = false;
                return Err(Self::backend_failure("delete_user"));
            }
        }
        self.lock().users.remove(&user_id);
        Ok(())
    }

    async fn list_memberships(&self, organization_id: Uuid) -> StoreResult<Vec<Membership>> {
        Ok(self
            .lock()
            .memberships
            .iter()
            .filter(|m| m.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn list_member_emails(&self, organization_id: Uuid) -> StoreResult<Vec<String>> {
        let inner = self.lock();
        Ok(inner
            .memberships
            .iter()
            .filter(|m| m.organization_id == organization_id)
            .filter_map(|m| inner.users.get(&m.user_id).map(|u| u.email.clone()))
            .collect())
    }

    async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        Ok(self
            .lock()
            .memberships
            .iter()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .cloned())
    }

    async fn first_membership_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        Ok(self
            .lock()
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .min_by_key(|m| (m.created_utc, m.membership_id))
            .cloned())
    }

    async fn create_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> StoreResult<Membership> {
        {
            let mut failures = self.failures();
            if failures.fail_create_membership {
                failures.fail_create_membership = false;
                return Err(Self::backend_failure("create_membership"));
            }
        }
        let mut inner = self.lock();
        if inner
            .memberships
            .iter()
            .any(|m| m.organization_id == organization_id && m.user_id == user_id)
        {
            return Err(StoreError::Conflict("memberships_org_user_key".into()));
        }
        let membership = Membership::new(organization_id, user_id, role);
        inner.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn update_membership_role(
        &self,
        membership_id: Uuid,
        role: OrgRole,
    ) -> StoreResult<Option<Membership>> {
        let mut inner = self.lock();
        match inner
            .memberships
            .iter_mut()
            .find(|m| m.membership_id == membership_id)
        {
            Some(membership) => {
                membership.role_code = role.as_str().to_string();
                Ok(Some(membership.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_membership(
        &self,
        organization_id: Uuid,
        selector: &MemberSelector,
    ) -> StoreResult<bool> {
        let mut inner = self.lock();
        let user_id = match selector {
            MemberSelector::Id(user_id) => Some(*user_id),
            MemberSelector::Email(email) => inner
                .users
                .values()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .map(|u| u.user_id),
        };
        let Some(user_id) = user_id else {
            return Ok(false);
        };
        let before = inner.memberships.len();
        inner
            .memberships
            .retain(|m| !(m.organization_id == organization_id && m.user_id == user_id));
        Ok(inner.memberships.len() < before)
    }

    async fn upsert_invitation(
        &self,
        organization_id: Uuid,
        email: &str,
        role: OrgRole,
        invited_by_user_id: Uuid,
        expires_utc: DateTime<Utc>,
    ) -> StoreResult<Invitation> {
        let mut inner = self.lock();
        if let Some(existing) = inner
            .invitations
            .iter_mut()
            .find(|i| i.organization_id == organization_id && i.email.eq_ignore_ascii_case(email))
        {
            existing.role_code = role.as_str().to_string();
            existing.state_code = InvitationState::Pending.as_str().to_string();
            existing.expires_utc = expires_utc;
            existing.accepted_utc = None;
            existing.invited_by_user_id = invited_by_user_id;
            return Ok(existing.clone());
        }
        let invitation = Invitation::new(
            organization_id,
            email.to_string(),
            role,
            invited_by_user_id,
            expires_utc,
        );
        inner.invitations.push(invitation.clone());
        Ok(invitation)
    }

    async fn find_invitation(&self, invitation_id: Uuid) -> StoreResult<Option<Invitation>> {
        Ok(self
            .lock()
            .invitations
            .iter()
            .find(|i| i.invitation_id == invitation_id)
            .cloned())
    }

    async fn mark_invitation_accepted(&self, invitation_id: Uuid) -> StoreResult<bool> {
        let mut inner = self.lock();
        match inner
            .invitations
            .iter_mut()
            .find(|i| i.invitation_id == invitation_id && i.is_pending())
        {
            Some(invitation) => {
                invitation.state_code = InvitationState::Accepted.as_str().to_string();
                invitation.accepted_utc = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_user_banned(
        &self,
        user_id: Uuid,
        reason: &str,
        expiry_utc: Option<DateTime<Utc>>,
    ) -> StoreResult<bool> {
        {
            let mut failures = self.failures();
            if failures.fail_set_user_banned {
                failures.fail_set_user_banned = false;
                return Err(Self::backend_failure("set_user_banned"));
            }
        }
        let mut inner = self.lock();
        match inner.users.get_mut(&user_id) {
            Some(user) => {
                user.banned = true;
                user.ban_reason = Some(reason.to_string());
                user.ban_expiry_utc = expiry_utc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_global_role(&self, user_id: Uuid, role: GlobalRole) -> StoreResult<bool> {
        {
            let mut failures = self.failures();
            if failures.fail_set_global_role {
                failures.fail_set_global_role = false;
                return Err(Self::backend_failure("set_global_role"));
            }
        }
        let mut inner = self.lock();
        match inner.users.get_mut(&user_id) {
            Some(user) => {
                user.global_role_code = role.as_str().to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_session(&self, session: &Session) -> StoreResult<()> {
        self.lock()
            .sessions
            .insert(session.session_token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, session_token: &str) -> StoreResult<Option<Session>> {
        Ok(self.lock().sessions.get(session_token).cloned())
    }

    async fn delete_session(&self, session_token: &str) -> StoreResult<()> {
        self.lock().sessions.remove(session_token);
        Ok(())
    }
}
