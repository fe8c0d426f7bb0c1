//! Access-view provisioning integration tests.

mod common;

use access_service::models::OrgRole;
use access_service::services::AccessError;
use access_service::storage::AccessStore;
use common::TestCore;

#[tokio::test]
async fn provisioning_derives_the_next_counter() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);
    app.member(&org, "employee-1@nordstadt.local", OrgRole::Employee);
    app.member(&org, "employee-2@nordstadt.local", OrgRole::Employee);

    let credentials = app
        .core
        .access_views
        .provision(&ctx, OrgRole::Employee)
        .await
        .expect("provision");

    assert_eq!(credentials.email, "employee-3@nordstadt.local");
    assert_eq!(credentials.password.as_str().len(), 12);
}

#[tokio::test]
async fn provisioned_account_is_tagged_for_first_login() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);

    let credentials = app
        .core
        .access_views
        .provision(&ctx, OrgRole::Employee)
        .await
        .expect("provision");

    let user = app
        .store
        .find_user_by_email(&credentials.email)
        .await
        .expect("lookup")
        .expect("user");
    assert!(user.is_first_login);
    assert!(!user.is_anonymous);
    assert!(user.secure);
    assert_eq!(user.last_name, "nordstadt");

    let membership = app
        .store
        .find_membership(org.organization_id, user.user_id)
        .await
        .expect("lookup")
        .expect("membership");
    assert_eq!(membership.role(), OrgRole::Employee);
}

#[tokio::test]
async fn guest_counter_is_independent_of_employee_counter() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);
    app.member(&org, "employee-1@nordstadt.local", OrgRole::Employee);

    let credentials = app
        .core
        .access_views
        .provision(&ctx, OrgRole::Guest)
        .await
        .expect("provision");

    assert_eq!(credentials.email, "guest-1@nordstadt.local");
}

#[tokio::test]
async fn compensation_deletes_the_user_when_membership_creation_fails() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);

    app.store.inject_create_membership_failure();

    let result = app.core.access_views.provision(&ctx, OrgRole::Employee).await;
    assert!(matches!(result, Err(AccessError::Storage(_))));

    let user = app
        .store
        .find_user_by_email("employee-1@nordstadt.local")
        .await
        .expect("lookup");
    assert!(user.is_none());
}

#[tokio::test]
async fn failed_compensation_surfaces_the_original_error() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);

    app.store.inject_create_membership_failure();
    app.store.inject_delete_user_failure();

    let result = app.core.access_views.provision(&ctx, OrgRole::Employee).await;

    // The membership error is what the caller sees; the orphaned account
    // stays behind for manual reconciliation.
    assert!(matches!(result, Err(AccessError::Storage(_))));
    let orphan = app
        .store
        .find_user_by_email("employee-1@nordstadt.local")
        .await
        .expect("lookup");
    assert!(orphan.is_some());
}

#[tokio::test]
async fn uniqueness_conflict_is_retried_once() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);

    app.store.inject_create_user_conflicts(1);

    let credentials = app
        .core
        .access_views
        .provision(&ctx, OrgRole::Employee)
        .await
        .expect("provision after one retry");
    assert_eq!(credentials.email, "employee-1@nordstadt.local");
}

#[tokio::test]
async fn second_uniqueness_conflict_is_fatal() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);

    app.store.inject_create_user_conflicts(2);

    let result = app.core.access_views.provision(&ctx, OrgRole::Employee).await;
    assert!(matches!(result, Err(AccessError::Conflict(_))));
}

#[tokio::test]
async fn only_employee_and_guest_can_be_provisioned() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);

    let result = app.core.access_views.provision(&ctx, OrgRole::Member).await;
    assert!(matches!(result, Err(AccessError::Validation(_))));
}

#[tokio::test]
async fn provisioning_requires_member_create() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let employee = app.member(&org, "employee-1@nordstadt.local", OrgRole::Employee);
    let ctx = app.ctx(&employee, &org);

    let result = app.core.access_views.provision(&ctx, OrgRole::Guest).await;
    assert!(matches!(result, Err(AccessError::PermissionDenied)));
}
