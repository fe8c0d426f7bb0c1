use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    /// Absent when the embedder wires its own store (tests, in-process use).
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub invitations: InvitationConfig,
    #[serde(default)]
    pub access_views: AccessViewConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationConfig {
    /// Window re-extended on every create-or-resend.
    #[serde(default = "default_invitation_expiry_days")]
    pub expiry_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessViewConfig {
    #[serde(default = "default_password_length")]
    pub password_length: usize,
    /// Suffix of derived emails: `<role>-<n>@<slug>.<suffix>`.
    #[serde(default = "default_email_domain_suffix")]
    pub email_domain_suffix: String,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_invitation_expiry_days() -> i64 {
    7
}

fn default_password_length() -> usize {
    12
}

fn default_email_domain_suffix() -> String {
    "local".to_string()
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            expiry_days: default_invitation_expiry_days(),
        }
    }
}

impl Default for AccessViewConfig {
    fn default() -> Self {
        Self {
            password_length: default_password_length(),
            email_domain_suffix: default_email_domain_suffix(),
        }
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            database: None,
            invitations: InvitationConfig::default(),
            access_views: AccessViewConfig::default(),
        }
    }
}

impl AccessConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("ACCESS").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_rules() {
        let config = AccessConfig::default();
        assert_eq!(config.invitations.expiry_days, 7);
        assert_eq!(config.access_views.password_length, 12);
        assert_eq!(config.access_views.email_domain_suffix, "local");
    }
}
