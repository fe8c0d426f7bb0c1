//! Membership lifecycle: add, remove, role changes, access-view disabling.

use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

use super::authz::{AuthContext, Authorizer};
use super::error::AccessError;
use crate::models::{Action, GlobalRole, MemberSelector, Membership, OrgRole, Resource};
use crate::storage::AccessStore;

/// Membership lifecycle manager over the storage collaborator.
#[derive(Clone)]
pub struct MembershipService {
    store: Arc<dyn AccessStore>,
    authorizer: Authorizer,
}

impl MembershipService {
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        let authorizer = Authorizer::new(Arc::clone(&store));
        Self { store, authorizer }
    }

    /// Attach an existing user to the caller's active organization.
    #[tracing::instrument(skip(self, ctx), fields(caller = %ctx.user_id, role = %role))]
    pub async fn add_member(
        &self,
        ctx: &AuthContext,
        user_id: Uuid,
        role: OrgRole,
    ) -> Result<Membership, AccessError> {
        self.authorizer
            .check_permission(ctx, Resource::Member, &[Action::Create])
            .await?;
        let organization_id = ctx
            .active_organization_id
            .ok_or(AccessError::NoActiveOrganization)?;

        let organization = self
            .store
            .find_organization(organization_id)
            .await?
            .ok_or(AccessError::NotFound("organization"))?;
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(AccessError::NotFound("user"))?;

        let membership = self
            .store
            .create_membership(organization.organization_id, user.user_id, role)
            .await?;

        tracing::info!(
            organization_id = %organization.organization_id,
            member = %user.user_id,
            "member added"
        );
        Ok(membership)
    }

    /// Detach a member, addressed by user id or email.
    #[tracing::instrument(skip(self, ctx, selector), fields(caller = %ctx.user_id))]
    pub async fn remove_member(
        &self,
        ctx: &AuthContext,
        selector: &MemberSelector,
    ) -> Result<(), AccessError> {
        self.authorizer
            .check_permission(ctx, Resource::Member, &[Action::Delete])
            .await?;
        let organization_id = ctx
            .active_organization_id
            .ok_or(AccessError::NoActiveOrganization)?;

        let deleted = self.store.delete_membership(organization_id, selector).await?;
        if !deleted {
            return Err(AccessError::NotFound("membership"));
        }

        tracing::info!(organization_id = %organization_id, "member removed");
        Ok(())
    }

    /// Change a member's stored role.
    ///
    /// A change to owner issues the global-admin promotion as a second,
    /// independent step. The two steps are not atomic: when the promotion
    /// fails after the role update succeeded, the error is reported but the
    /// new role stands.
    #[tracing::instrument(skip(self, ctx), fields(caller = %ctx.user_id, new_role = %new_role))]
    pub async fn change_role(
        &self,
        ctx: &AuthContext,
        member_user_id: Uuid,
        new_role: OrgRole,
    ) -> Result<Membership, AccessError> {
        self.authorizer
            .check_permission(ctx, Resource::Member, &[Action::Update])
            .await?;
        let organization_id = ctx
            .active_organization_id
            .ok_or(AccessError::NoActiveOrganization)?;

        let membership = self
            .store
            .find_membership(organization_id, member_user_id)
            .await?
            .ok_or(AccessError::NotFound("membership"))?;
        let previous_role = membership.role();

        let updated = self
            .store
            .update_membership_role(membership.membership_id, new_role)
            .await?
            .ok_or(AccessError::NotFound("membership"))?;

        let direction = match new_role.cmp(&previous_role) {
            Ordering::Greater => "promotion",
            Ordering::Less => "demotion",
            Ordering::Equal => "unchanged",
        };
        tracing::info!(
            organization_id = %organization_id,
            member = %member_user_id,
            previous_role = %previous_role,
            direction,
            "membership role changed"
        );

        if new_role.requires_global_admin() {
            // Second, independent step with no rollback of the role change.
            match self
                .store
                .set_global_role(member_user_id, GlobalRole::Admin)
                .await
            {
                Ok(true) => {}
                Ok(false) => return Err(AccessError::NotFound("user")),
                Err(err) => {
                    tracing::warn!(
                        member = %member_user_id,
                        error = %err,
                        "role changed to owner but global-admin promotion failed"
                    );
                    return Err(err.into());
                }
            }
        }

        Ok(updated)
    }

    /// Disable an access-view login: ban the account, then set the
    /// membership role to disabled.
    ///
    /// Fail-fast: when the ban step fails, the role update must not run -
    /// an unbanned account in the disabled role would be meaningless in the
    /// audit trail.
    #[tracing::instrument(skip(self, ctx, reason), fields(caller = %ctx.user_id))]
    pub async fn disable_access_view(
        &self,
        ctx: &AuthContext,
        member_user_id: Uuid,
        reason: &str,
    ) -> Result<Membership, AccessError> {
        self.authorizer
            .check_permission(ctx, Resource::Member, &[Action::Update, Action::Ban])
            .await?;
        let organization_id = ctx
            .active_organization_id
            .ok_or(AccessError::NoActiveOrganization)?;

        let membership = self
            .store
            .find_membership(organization_id, member_user_id)
            .await?
            .ok_or(AccessError::NotFound("membership"))?;

        let banned = self
            .store
            .set_user_banned(member_user_id, reason, None)
            .await?;
        if !banned {
            return Err(AccessError::NotFound("user"));
        }

        let updated = self
            .store
            .update_membership_role(membership.membership_id, OrgRole::Disabled)
            .await?
            .ok_or(AccessError::NotFound("membership"))?;

        tracing::info!(
            organization_id = %organization_id,
            member = %member_user_id,
            "access view disabled"
        );
        Ok(updated)
    }
}
