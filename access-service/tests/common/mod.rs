//! Test helper module for access-service integration tests.
//!
//! Builds the core over the in-memory store with seeded organizations,
//! users, and memberships.

#![allow(dead_code)]

use std::sync::Arc;

use access_service::{
    config::AccessConfig,
    models::{Membership, NewUser, Organization, OrgRole, User},
    services::AuthContext,
    storage::{AccessStore, MemoryStore},
    AccessCore,
};
use uuid::Uuid;

pub struct TestCore {
    pub core: AccessCore,
    pub store: Arc<MemoryStore>,
}

impl TestCore {
    pub fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn AccessStore> = store.clone();
        let core = AccessCore::new(dyn_store, &AccessConfig::default());
        Self { core, store }
    }

    /// Seed an organization with the given slug.
    pub fn organization(&self, slug: &str) -> Organization {
        let organization = Organization::new(format!("{} Fairteiler", slug), slug.to_string());
        self.store.insert_organization(organization.clone());
        organization
    }

    /// Seed a user account.
    pub fn user(&self, email: &str) -> User {
        let user = NewUser {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "Person".to_string(),
            password_hash: String::new(),
            is_first_login: false,
            is_anonymous: false,
            secure: true,
        }
        .into_user();
        self.store.insert_user(user.clone());
        user
    }

    /// Seed a user plus a membership in the organization.
    pub fn member(&self, organization: &Organization, email: &str, role: OrgRole) -> User {
        let user = self.user(email);
        self.store.insert_membership(Membership::new(
            organization.organization_id,
            user.user_id,
            role,
        ));
        user
    }

    /// Caller context scoped to the organization.
    pub fn ctx(&self, user: &User, organization: &Organization) -> AuthContext {
        AuthContext {
            user_id: user.user_id,
            active_organization_id: Some(organization.organization_id),
        }
    }

    /// Caller context with no active organization.
    pub fn unscoped_ctx(&self, user: &User) -> AuthContext {
        AuthContext {
            user_id: user.user_id,
            active_organization_id: None,
        }
    }
}

pub fn random_id() -> Uuid {
    Uuid::new_v4()
}
