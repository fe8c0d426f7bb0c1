//! access-service: organization-scoped authorization and membership
//! lifecycle core for the fairteil platform.
//!
//! Library-style component invoked in-process by the surrounding
//! application layer. Owns the permission matrix, the session-to-permission
//! resolution path, the invitation state machine, the membership lifecycle,
//! and the access-view provisioner. Storage, email delivery, and rendering
//! are external collaborators behind narrow interfaces.

pub mod config;
pub mod dtos;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

use std::sync::Arc;
use uuid::Uuid;

use config::AccessConfig;
use models::Session;
use services::{
    AccessError, AccessViewService, Authorizer, InvitationService, MembershipService,
};
use storage::AccessStore;

/// Facade wiring all lifecycle services over one storage collaborator.
#[derive(Clone)]
pub struct AccessCore {
    pub authorizer: Authorizer,
    pub invitations: InvitationService,
    pub memberships: MembershipService,
    pub access_views: AccessViewService,
}

impl AccessCore {
    pub fn new(store: Arc<dyn AccessStore>, config: &AccessConfig) -> Self {
        Self {
            authorizer: Authorizer::new(Arc::clone(&store)),
            invitations: InvitationService::new(
                Arc::clone(&store),
                config.invitations.clone(),
            ),
            memberships: MembershipService::new(Arc::clone(&store)),
            access_views: AccessViewService::new(Arc::clone(&store), config.access_views.clone()),
        }
    }

    /// Finish an authentication: consume the supplied invitation
    /// best-effort, then establish the session.
    ///
    /// Invitation acceptance failures are logged and swallowed - they must
    /// never block a successful sign-in or sign-up. Acceptance runs first
    /// so a first membership created by it becomes the session's active
    /// organization.
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn complete_authentication(
        &self,
        user_id: Uuid,
        invitation_id: Option<Uuid>,
    ) -> Result<Session, AccessError> {
        if let Some(invitation_id) = invitation_id {
            if let Err(err) = self.invitations.accept(invitation_id, user_id).await {
                tracing::warn!(
                    invitation_id = %invitation_id,
                    error = %err,
                    "invitation acceptance failed, continuing authentication"
                );
            }
        }

        self.authorizer.establish_session(user_id).await
    }

    /// Destroy the session at sign-out.
    pub async fn sign_out(&self, session_token: &str) -> Result<(), AccessError> {
        self.authorizer.end_session(session_token).await
    }
}
