//! Session resolution and the permission gate.
//!
//! Every lifecycle operation goes through [`Authorizer::check_permission`]
//! exactly once, so all call sites handle denial uniformly. The role is
//! resolved fresh from storage per check - a demotion takes effect on the
//! next check, never later.

use std::sync::Arc;
use uuid::Uuid;

use super::error::AccessError;
use crate::models::{Action, OrgRole, Resource, Session};
use crate::storage::AccessStore;

/// Authenticated caller identity, passed explicitly into every operation.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub active_organization_id: Option<Uuid>,
}

impl From<&Session> for AuthContext {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id,
            active_organization_id: session.active_organization_id,
        }
    }
}

/// Session resolver and permission checker.
#[derive(Clone)]
pub struct Authorizer {
    store: Arc<dyn AccessStore>,
}

impl Authorizer {
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self { store }
    }

    /// Create a session at authentication time.
    ///
    /// The active organization is bound once here, from the user's first
    /// known membership; users without memberships get an unscoped session.
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn establish_session(&self, user_id: Uuid) -> Result<Session, AccessError> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(AccessError::NotFound("user"))?;
        if user.is_banned() {
            return Err(AccessError::Unauthenticated);
        }

        let active_organization_id = self
            .store
            .first_membership_for_user(user_id)
            .await?
            .map(|m| m.organization_id);

        let session = Session::new(user_id, active_organization_id);
        self.store.create_session(&session).await?;
        Ok(session)
    }

    /// Resolve an inbound session token to a caller context.
    ///
    /// Unknown tokens and banned users both resolve to `Unauthenticated`
    /// with no further detail.
    #[tracing::instrument(skip_all)]
    pub async fn resolve_session(&self, session_token: &str) -> Result<AuthContext, AccessError> {
        let session = self
            .store
            .find_session(session_token)
            .await?
            .ok_or(AccessError::Unauthenticated)?;

        let user = self
            .store
            .find_user(session.user_id)
            .await?
            .ok_or(AccessError::Unauthenticated)?;
        if user.is_banned() {
            return Err(AccessError::Unauthenticated);
        }

        Ok(AuthContext::from(&session))
    }

    /// Destroy a session at sign-out. Idempotent.
    #[tracing::instrument(skip_all)]
    pub async fn end_session(&self, session_token: &str) -> Result<(), AccessError> {
        self.store.delete_session(session_token).await?;
        Ok(())
    }

    /// Gate an operation on the caller's role within the active
    /// organization.
    ///
    /// All requested actions must be granted. Returns the resolved role on
    /// allow; the deny variants carry no detail beyond "insufficient role"
    /// versus "no active organization".
    #[tracing::instrument(
        skip(self, ctx),
        fields(user_id = %ctx.user_id, resource = ?resource)
    )]
    pub async fn check_permission(
        &self,
        ctx: &AuthContext,
        resource: Resource,
        actions: &[Action],
    ) -> Result<OrgRole, AccessError> {
        let organization_id = ctx
            .active_organization_id
            .ok_or(AccessError::NoActiveOrganization)?;

        let membership = self
            .store
            .find_membership(organization_id, ctx.user_id)
            .await?
            .ok_or(AccessError::PermissionDenied)?;

        let role = membership.role();
        if actions.iter().all(|action| role.grants(resource, *action)) {
            Ok(role)
        } else {
            tracing::debug!(role = %role, "permission denied");
            Err(AccessError::PermissionDenied)
        }
    }
}
