//! PostgreSQL adapter for the storage port.
//!
//! Runtime-checked sqlx queries over a shared connection pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

use super::{AccessStore, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::models::{
    GlobalRole, Invitation, InvitationState, MemberSelector, Membership, NewUser, Organization,
    OrgRole, Session, User,
};

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.url)
        .await?;

    tracing::info!("Successfully connected to PostgreSQL");

    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// PostgreSQL storage adapter.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

/// Unique-constraint violations become the retryable `Conflict` variant;
/// everything else is opaque.
fn map_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let constraint = db.constraint().unwrap_or("unique").to_string();
            return StoreError::Conflict(constraint);
        }
    }
    StoreError::Backend(anyhow::Error::new(err))
}

#[async_trait]
impl AccessStore for PgStore {
    async fn find_organization(
        &self,
        organization_id: Uuid,
    ) -> StoreResult<Option<Organization>> {
        sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let password_hash = new_user.password_hash.clone();
        let user = new_user.into_user();
        sqlx::query(
            r#"
            INSERT INTO users (user_id, email, first_name, last_name, password_hash,
                               is_first_login, is_anonymous, secure, global_role_code,
                               banned, ban_reason, ban_expiry_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&password_hash)
        .bind(user.is_first_login)
        .bind(user.is_anonymous)
        .bind(user.secure)
        .bind(&user.global_role_code)
        .bind(user.banned)
        .bind(&user.ban_reason)
        .bind(user.ban_expiry_utc)
        .bind(user.created_utc)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(user)
    }

    async fn delete_user(&self, user_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn list_memberships(&self, organization_id: Uuid) -> StoreResult<Vec<Membership>> {
        sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE organization_id = $1 ORDER BY created_utc",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn list_member_emails(&self, organization_id: Uuid) -> StoreResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT u.email FROM memberships m
            JOIN users u ON u.user_id = m.user_id
            WHERE m.organization_id = $1
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.into_iter().map(|(email,)| email).collect())
    }

    async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE organization_id = $1 AND user_id = $2",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn first_membership_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT * FROM memberships WHERE user_id = $1
            ORDER BY created_utc, membership_id
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn create_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> StoreResult<Membership> {
        let membership = Membership::new(organization_id, user_id, role);
        sqlx::query(
            r#"
            INSERT INTO memberships (membership_id, organization_id, user_id, role_code, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(membership.membership_id)
        .bind(membership.organization_id)
        .bind(membership.user_id)
        .bind(&membership.role_code)
        .bind(membership.created_utc)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(membership)
    }

    async fn update_membership_role(
        &self,
        membership_id: Uuid,
        role: OrgRole,
    ) -> StoreResult<Option<Membership>> {
        sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships SET role_code = $2
            WHERE membership_id = $1
            RETURNING *
            "#,
        )
        .bind(membership_id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete_membership(
        &self,
        organization_id: Uuid,
        selector: &MemberSelector,
    ) -> StoreResult<bool> {
        let result = match selector {
            MemberSelector::Id(user_id) => {
                sqlx::query(
                    "DELETE FROM memberships WHERE organization_id = $1 AND user_id = $2",
                )
                .bind(organization_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
            }
            MemberSelector::Email(email) => {
                sqlx::query(
                    r#"
                    DELETE FROM memberships m
                    USING users u
                    WHERE m.organization_id = $1
                      AND m.user_id = u.user_id
                      AND LOWER(u.email) = LOWER($2)
                    "#,
                )
                .bind(organization_id)
                .bind(email)
                .execute(&self.pool)
                .await
            }
        };
        Ok(result.map_err(map_err)?.rows_affected() > 0)
    }

    async fn upsert_invitation(
        &self,
        organization_id: Uuid,
        email: &str,
        role: OrgRole,
        invited_by_user_id: Uuid,
        expires_utc: DateTime<Utc>,
    ) -> StoreResult<Invitation> {
        sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (invitation_id, organization_id, email, role_code,
                                     state_code, expires_utc, accepted_utc,
                                     invited_by_user_id, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, NULL, $7, $8)
            ON CONFLICT (organization_id, email) DO UPDATE SET
                role_code = EXCLUDED.role_code,
                state_code = EXCLUDED.state_code,
                expires_utc = EXCLUDED.expires_utc,
                accepted_utc = NULL,
                invited_by_user_id = EXCLUDED.invited_by_user_id
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(email)
        .bind(role.as_str())
        .bind(InvitationState::Pending.as_str())
        .bind(expires_utc)
        .bind(invited_by_user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn find_invitation(&self, invitation_id: Uuid) -> StoreResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>(
            "SELECT * FROM invitations WHERE invitation_id = $1",
        )
        .bind(invitation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn mark_invitation_accepted(&self, invitation_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE invitations SET state_code = $2, accepted_utc = $3
            WHERE invitation_id = $1 AND state_code = $4
            "#,
        )
        .bind(invitation_id)
        .bind(InvitationState::Accepted.as_str())
        .bind(Utc::now())
        .bind(InvitationState::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_user_banned(
        &self,
        user_id: Uuid,
        reason: &str,
        expiry_utc: Option<DateTime<Utc>>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET banned = TRUE, ban_reason = $2, ban_expiry_utc = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(reason)
        .bind(expiry_utc)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_global_role(&self, user_id: Uuid, role: GlobalRole) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET global_role_code = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_session(&self, session: &Session) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_token, user_id, active_organization_id, created_utc)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&session.session_token)
        .bind(session.user_id)
        .bind(session.active_organization_id)
        .bind(session.created_utc)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn find_session(&self, session_token: &str) -> StoreResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE session_token = $1")
            .bind(session_token)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn delete_session(&self, session_token: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM sessions WHERE session_token = $1")
            .bind(session_token)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}
