//! Organization roles, the static permission matrix, and the role hierarchy.
//!
//! The matrix is pure data: adding a role means adding one table row below.
//! No other code may branch on role identity; callers go through
//! [`OrgRole::grants`] or the table-derived properties.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Role of a user within one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Owner,
    Member,
    Viewer,
    Employee,
    Guest,
    Disabled,
}

/// Resources that organization-scoped permissions apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    User,
    Organization,
    Member,
    Preferences,
    Invitation,
    Dashboard,
    Operations,
    Contribution,
    History,
    Reporting,
}

/// Actions a role may hold on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Ban,
    Cancel,
}

impl OrgRole {
    pub const ALL: [OrgRole; 6] = [
        OrgRole::Owner,
        OrgRole::Member,
        OrgRole::Viewer,
        OrgRole::Employee,
        OrgRole::Guest,
        OrgRole::Disabled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Owner => "owner",
            OrgRole::Member => "member",
            OrgRole::Viewer => "viewer",
            OrgRole::Employee => "employee",
            OrgRole::Guest => "guest",
            OrgRole::Disabled => "disabled",
        }
    }

    /// Actions this role holds on a resource. One row per role; the match is
    /// exhaustive so a new role cannot be added without a new row.
    fn allowed(&self, resource: Resource) -> &'static [Action] {
        use Action::*;
        use Resource::*;
        match self {
            OrgRole::Owner => match resource {
                User => &[Create, Read, Update, Delete, Ban],
                Organization => &[Read, Update],
                Member => &[Create, Read, Update, Delete, Ban],
                Preferences => &[Read, Update],
                Invitation => &[Create, Read, Cancel],
                Dashboard => &[Read],
                Operations => &[Create, Read, Update, Delete, Cancel],
                Contribution => &[Create, Read, Update, Delete],
                History => &[Read],
                Reporting => &[Create, Read],
            },
            OrgRole::Member => match resource {
                User => &[Read],
                Organization => &[Read],
                Member => &[Read],
                Preferences => &[Read, Update],
                Invitation => &[],
                Dashboard => &[Read],
                Operations => &[Read, Update],
                Contribution => &[Create, Read, Update],
                History => &[Read],
                Reporting => &[Read],
            },
            OrgRole::Viewer => match resource {
                Organization => &[Read],
                Dashboard => &[Read],
                Operations => &[Read],
                History => &[Read],
                Reporting => &[Read],
                User | Member | Preferences | Invitation | Contribution => &[],
            },
            OrgRole::Employee => match resource {
                Organization => &[Read],
                Dashboard => &[Read],
                Operations => &[Read, Update],
                Contribution => &[Create, Read],
                History => &[Read],
                User | Member | Preferences | Invitation | Reporting => &[],
            },
            OrgRole::Guest => match resource {
                Dashboard => &[Read],
                Operations => &[Read],
                User | Organization | Member | Preferences | Invitation | Contribution
                | History | Reporting => &[],
            },
            // A disabled role grants nothing on any resource.
            OrgRole::Disabled => &[],
        }
    }

    /// Check a single resource/action pair against the matrix.
    pub fn grants(&self, resource: Resource, action: Action) -> bool {
        self.allowed(resource).contains(&action)
    }

    /// Hierarchy rank used only for promotion comparisons.
    fn rank(&self) -> u8 {
        match self {
            OrgRole::Owner => 5,
            OrgRole::Member => 4,
            OrgRole::Employee => 3,
            OrgRole::Viewer => 2,
            OrgRole::Guest => 1,
            OrgRole::Disabled => 0,
        }
    }

    /// Whether holding this role within an organization requires the
    /// platform-wide admin flag. Only the owner row sets this.
    pub fn requires_global_admin(&self) -> bool {
        matches!(self, OrgRole::Owner)
    }

    /// Disposable login roles the access-view provisioner may create.
    pub fn is_access_view(&self) -> bool {
        matches!(self, OrgRole::Employee | OrgRole::Guest)
    }
}

impl Ord for OrgRole {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for OrgRole {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrgRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(OrgRole::Owner),
            "member" => Ok(OrgRole::Member),
            "viewer" => Ok(OrgRole::Viewer),
            "employee" => Ok(OrgRole::Employee),
            "guest" => Ok(OrgRole::Guest),
            "disabled" => Ok(OrgRole::Disabled),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

impl Resource {
    pub const ALL: [Resource; 10] = [
        Resource::User,
        Resource::Organization,
        Resource::Member,
        Resource::Preferences,
        Resource::Invitation,
        Resource::Dashboard,
        Resource::Operations,
        Resource::Contribution,
        Resource::History,
        Resource::Reporting,
    ];
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Ban,
        Action::Cancel,
    ];
}

/// Platform-wide role, independent of any organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalRole {
    Admin,
    User,
}

impl GlobalRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalRole::Admin => "admin",
            GlobalRole::User => "user",
        }
    }
}

impl FromStr for GlobalRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(GlobalRole::Admin),
            "user" => Ok(GlobalRole::User),
            _ => Err(format!("unknown global role: {}", s)),
        }
    }
}
