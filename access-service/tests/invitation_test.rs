//! Invitation state machine integration tests.

mod common;

use access_service::models::{InvitationState, OrgRole};
use access_service::services::AccessError;
use access_service::storage::AccessStore;
use chrono::{Duration, Utc};
use common::{random_id, TestCore};

#[tokio::test]
async fn create_then_inspect_roundtrips() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);

    let invitation = app
        .core
        .invitations
        .create(&ctx, "g@ex.com", OrgRole::Member)
        .await
        .expect("create invitation");

    let check = app
        .core
        .invitations
        .inspect(invitation.invitation_id)
        .await
        .expect("inspect");

    assert!(check.is_valid);
    assert!(!check.user_exists);
    let inspected = check.invitation.expect("details");
    assert_eq!(inspected.organization_id, org.organization_id);
    assert_eq!(inspected.email, "g@ex.com");
    assert_eq!(inspected.role(), OrgRole::Member);
}

#[tokio::test]
async fn member_cannot_invite_and_no_row_is_created() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let member = app.member(&org, "member@example.test", OrgRole::Member);
    let ctx = app.ctx(&member, &org);

    let result = app
        .core
        .invitations
        .create(&ctx, "g@ex.com", OrgRole::Member)
        .await;

    assert!(matches!(result, Err(AccessError::PermissionDenied)));
    assert_eq!(app.store.invitation_count(), 0);
}

#[tokio::test]
async fn malformed_email_is_rejected_before_storage() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);

    let result = app
        .core
        .invitations
        .create(&ctx, "not-an-email", OrgRole::Member)
        .await;

    assert!(matches!(result, Err(AccessError::Validation(_))));
    assert_eq!(app.store.invitation_count(), 0);
}

#[tokio::test]
async fn duplicate_create_resends_and_keeps_the_id() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);

    let first = app
        .core
        .invitations
        .create(&ctx, "g@ex.com", OrgRole::Member)
        .await
        .expect("first create");
    let second = app
        .core
        .invitations
        .create(&ctx, "g@ex.com", OrgRole::Member)
        .await
        .expect("second create");

    assert_eq!(first.invitation_id, second.invitation_id);
    assert!(second.expires_utc >= first.expires_utc);
    assert_eq!(app.store.invitation_count(), 1);
}

#[tokio::test]
async fn time_expired_invitation_is_invalid_regardless_of_state() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);

    let invitation = app
        .store
        .upsert_invitation(
            org.organization_id,
            "late@example.test",
            OrgRole::Member,
            owner.user_id,
            Utc::now() - Duration::hours(1),
        )
        .await
        .expect("seed invitation");
    assert_eq!(invitation.state_code, InvitationState::Pending.as_str());

    let check = app
        .core
        .invitations
        .inspect(invitation.invitation_id)
        .await
        .expect("inspect");

    assert!(!check.is_valid);
    assert!(check.invitation.is_some());
}

#[tokio::test]
async fn cancelled_invitation_reads_as_not_found() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);

    let invitation = app
        .core
        .invitations
        .create(&ctx, "g@ex.com", OrgRole::Member)
        .await
        .expect("create");
    app.store.cancel_invitation(invitation.invitation_id);

    let check = app
        .core
        .invitations
        .inspect(invitation.invitation_id)
        .await
        .expect("inspect");

    assert!(!check.is_valid);
    assert!(check.invitation.is_none());
}

#[tokio::test]
async fn inspect_reports_existing_user() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);
    app.user("known@example.test");

    let invitation = app
        .core
        .invitations
        .create(&ctx, "known@example.test", OrgRole::Member)
        .await
        .expect("create");

    let check = app
        .core
        .invitations
        .inspect(invitation.invitation_id)
        .await
        .expect("inspect");
    assert!(check.user_exists);
}

#[tokio::test]
async fn sign_up_with_invitation_creates_the_membership() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);

    let invitation = app
        .core
        .invitations
        .create(&ctx, "g@ex.com", OrgRole::Member)
        .await
        .expect("create");

    // The invitee signs up and authentication completes with the
    // invitation id in hand.
    let invitee = app.user("g@ex.com");
    let session = app
        .core
        .complete_authentication(invitee.user_id, Some(invitation.invitation_id))
        .await
        .expect("authentication");

    assert_eq!(session.active_organization_id, Some(org.organization_id));

    let membership = app
        .store
        .find_membership(org.organization_id, invitee.user_id)
        .await
        .expect("lookup")
        .expect("membership");
    assert_eq!(membership.role(), OrgRole::Member);

    let stored = app
        .store
        .find_invitation(invitation.invitation_id)
        .await
        .expect("lookup")
        .expect("invitation");
    assert_eq!(stored.state_code, InvitationState::Accepted.as_str());
}

#[tokio::test]
async fn owner_invitation_flips_the_platform_admin_flag() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);
    let ctx = app.ctx(&owner, &org);

    let invitation = app
        .core
        .invitations
        .create(&ctx, "next-owner@example.test", OrgRole::Owner)
        .await
        .expect("create");

    let invitee = app.user("next-owner@example.test");
    app.core
        .invitations
        .accept(invitation.invitation_id, invitee.user_id)
        .await
        .expect("accept");

    let user = app
        .store
        .find_user(invitee.user_id)
        .await
        .expect("lookup")
        .expect("user");
    assert!(user.is_global_admin());
}

#[tokio::test]
async fn failed_acceptance_does_not_block_authentication() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let user = app.member(&org, "helper@example.test", OrgRole::Member);

    // Bogus invitation id: acceptance fails, sign-in still succeeds.
    let session = app
        .core
        .complete_authentication(user.user_id, Some(random_id()))
        .await
        .expect("authentication");

    assert_eq!(session.active_organization_id, Some(org.organization_id));
}

#[tokio::test]
async fn accepting_an_expired_invitation_fails() {
    let app = TestCore::spawn();
    let org = app.organization("nordstadt");
    let owner = app.member(&org, "owner@example.test", OrgRole::Owner);

    let invitation = app
        .store
        .upsert_invitation(
            org.organization_id,
            "late@example.test",
            OrgRole::Member,
            owner.user_id,
            Utc::now() - Duration::hours(1),
        )
        .await
        .expect("seed invitation");
    let invitee = app.user("late@example.test");

    let result = app
        .core
        .invitations
        .accept(invitation.invitation_id, invitee.user_id)
        .await;

    assert!(matches!(result, Err(AccessError::Validation(_))));
    let membership = app
        .store
        .find_membership(org.organization_id, invitee.user_id)
        .await
        .expect("lookup");
    assert!(membership.is_none());
}
