//! Invitation lifecycle: create-or-resend, inspect, accept.

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::authz::{AuthContext, Authorizer};
use super::error::AccessError;
use crate::config::InvitationConfig;
use crate::models::{Action, Invitation, Membership, OrgRole, Resource};
use crate::storage::AccessStore;
use crate::utils::validate_email;

/// Read model returned by [`InvitationService::inspect`].
///
/// A cancelled invitation is indistinguishable from an unknown id; callers
/// only ever learn "invalid or expired".
#[derive(Debug)]
pub struct InvitationCheck {
    pub invitation: Option<Invitation>,
    pub user_exists: bool,
    pub is_valid: bool,
}

impl InvitationCheck {
    fn not_found() -> Self {
        Self {
            invitation: None,
            user_exists: false,
            is_valid: false,
        }
    }
}

/// Invitation state machine over the storage collaborator.
#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn AccessStore>,
    authorizer: Authorizer,
    config: InvitationConfig,
}

impl InvitationService {
    pub fn new(store: Arc<dyn AccessStore>, config: InvitationConfig) -> Self {
        let authorizer = Authorizer::new(Arc::clone(&store));
        Self {
            store,
            authorizer,
            config,
        }
    }

    /// Create an invitation, or resend an outstanding one.
    ///
    /// Keyed by (organization, email): a duplicate create refreshes the
    /// expiry window and keeps the invitation id.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id, role = %role))]
    pub async fn create(
        &self,
        ctx: &AuthContext,
        email: &str,
        role: OrgRole,
    ) -> Result<Invitation, AccessError> {
        validate_email(email)?;
        self.authorizer
            .check_permission(ctx, Resource::Invitation, &[Action::Create])
            .await?;

        // check_permission guarantees an active organization.
        let organization_id = ctx
            .active_organization_id
            .ok_or(AccessError::NoActiveOrganization)?;
        let organization = self
            .store
            .find_organization(organization_id)
            .await?
            .filter(|org| org.is_active())
            .ok_or(AccessError::NotFound("organization"))?;

        let expires_utc = Utc::now() + Duration::days(self.config.expiry_days);
        let invitation = self
            .store
            .upsert_invitation(
                organization.organization_id,
                email,
                role,
                ctx.user_id,
                expires_utc,
            )
            .await?;

        tracing::info!(
            invitation_id = %invitation.invitation_id,
            organization_id = %organization.organization_id,
            "invitation created"
        );
        Ok(invitation)
    }

    /// Inspect an invitation for the sign-in/sign-up flows.
    ///
    /// Idempotent and side-effect free. `is_valid` is false only when the
    /// invitation is unknown (which includes cancelled) or time-expired.
    #[tracing::instrument(skip(self))]
    pub async fn inspect(&self, invitation_id: Uuid) -> Result<InvitationCheck, AccessError> {
        let Some(invitation) = self.store.find_invitation(invitation_id).await? else {
            return Ok(InvitationCheck::not_found());
        };
        if invitation.is_cancelled() {
            return Ok(InvitationCheck::not_found());
        }

        let user_exists = self
            .store
            .find_user_by_email(&invitation.email)
            .await?
            .is_some();
        let is_valid = !invitation.is_expired();

        Ok(InvitationCheck {
            invitation: Some(invitation),
            user_exists,
            is_valid,
        })
    }

    /// Consume an invitation for a just-authenticated user.
    ///
    /// Creates or confirms the membership at the invitation's role; an
    /// owner-role invitation additionally flips the platform-admin flag.
    /// Callers invoking this from an authentication flow treat failures as
    /// best-effort (logged, not fatal to the sign-in).
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn accept(
        &self,
        invitation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Membership, AccessError> {
        let invitation = self
            .store
            .find_invitation(invitation_id)
            .await?
            .filter(|inv| !inv.is_cancelled())
            .ok_or(AccessError::NotFound("invitation"))?;
        if !invitation.is_valid() {
            return Err(AccessError::Validation(
                "invitation is invalid or expired".to_string(),
            ));
        }

        let organization = self
            .store
            .find_organization(invitation.organization_id)
            .await?
            .ok_or(AccessError::NotFound("organization"))?;

        let role = invitation.role();
        let membership = match self
            .store
            .find_membership(organization.organization_id, user_id)
            .await?
        {
            Some(existing) => existing,
            None => {
                self.store
                    .create_membership(organization.organization_id, user_id, role)
                    .await?
            }
        };

        if role.requires_global_admin() {
            let updated = self
                .store
                .set_global_role(user_id, crate::models::GlobalRole::Admin)
                .await?;
            if !updated {
                return Err(AccessError::NotFound("user"));
            }
        }

        self.store
            .mark_invitation_accepted(invitation.invitation_id)
            .await?;

        tracing::info!(
            invitation_id = %invitation.invitation_id,
            organization_id = %organization.organization_id,
            "invitation accepted"
        );
        Ok(membership)
    }
}
