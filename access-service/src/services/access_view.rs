//! Access-view provisioning: disposable role-scoped logins for shared
//! devices, created with saga-backed compensation.

use std::sync::Arc;

use super::authz::{AuthContext, Authorizer};
use super::error::AccessError;
use super::saga::Saga;
use crate::config::AccessViewConfig;
use crate::models::{Action, NewUser, Organization, OrgRole, Resource};
use crate::storage::AccessStore;
use crate::utils::{generate_password, hash_password, Password};

/// Plaintext credentials returned exactly once. The password is never
/// persisted by this component and cannot be retrieved again.
#[derive(Debug)]
pub struct AccessViewCredentials {
    pub email: String,
    pub password: Password,
}

/// Access-view provisioner.
#[derive(Clone)]
pub struct AccessViewService {
    store: Arc<dyn AccessStore>,
    authorizer: Authorizer,
    config: AccessViewConfig,
}

impl AccessViewService {
    pub fn new(store: Arc<dyn AccessStore>, config: AccessViewConfig) -> Self {
        let authorizer = Authorizer::new(Arc::clone(&store));
        Self {
            store,
            authorizer,
            config,
        }
    }

    /// Provision a disposable login for the caller's active organization.
    ///
    /// The email counter is derived from a live count of existing members
    /// with the same role prefix; concurrent calls can collide, so a
    /// storage uniqueness rejection recomputes the counter and retries
    /// exactly once.
    #[tracing::instrument(skip(self, ctx), fields(caller = %ctx.user_id, role = %role))]
    pub async fn provision(
        &self,
        ctx: &AuthContext,
        role: OrgRole,
    ) -> Result<AccessViewCredentials, AccessError> {
        if !role.is_access_view() {
            return Err(AccessError::Validation(
                "only employee and guest access views can be provisioned".to_string(),
            ));
        }
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
            .filter(|org| org.is_active())
            .ok_or(AccessError::NotFound("organization"))?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.provision_once(&organization, role).await {
                Err(err) if err.is_conflict() && attempts == 1 => {
                    tracing::warn!(
                        organization_id = %organization.organization_id,
                        "access-view email collision, recomputing counter"
                    );
                }
                other => return other,
            }
        }
    }

    async fn provision_once(
        &self,
        organization: &Organization,
        role: OrgRole,
    ) -> Result<AccessViewCredentials, AccessError> {
        let prefix = format!("{}-", role.as_str());
        let emails = self
            .store
            .list_member_emails(organization.organization_id)
            .await?;
        let n = emails.iter().filter(|email| email.starts_with(&prefix)).count() + 1;
        let email = format!(
            "{}{}@{}.{}",
            prefix, n, organization.slug, self.config.email_domain_suffix
        );

        let password = generate_password(self.config.password_length);
        let password_hash = hash_password(&password).map_err(AccessError::Storage)?;

        let mut saga = Saga::new("provision_access_view");

        let new_user = NewUser {
            email: email.clone(),
            first_name: role.as_str().to_string(),
            last_name: organization.slug.clone(),
            password_hash: password_hash.into_string(),
            is_first_login: true,
            is_anonymous: false,
            secure: true,
        };
        let user = {
            let store = Arc::clone(&self.store);
            saga.run("create_user", async move {
                store.create_user(new_user).await.map_err(AccessError::from)
            })
            .await?
        };

        {
            let store = Arc::clone(&self.store);
            let user_id = user.user_id;
            saga.register(
                "delete_user",
                Box::pin(async move { store.delete_user(user_id).await }),
            );
        }

        {
            let store = Arc::clone(&self.store);
            let organization_id = organization.organization_id;
            let user_id = user.user_id;
            saga.run("create_membership", async move {
                store
                    .create_membership(organization_id, user_id, role)
                    .await
                    .map_err(AccessError::from)
            })
            .await?;
        }

        saga.commit();

        tracing::info!(
            organization_id = %organization.organization_id,
            email = %email,
            "access view provisioned"
        );
        Ok(AccessViewCredentials { email, password })
    }
}
