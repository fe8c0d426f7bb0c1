//! Services layer for the access core.
//!
//! Business logic for session resolution, permission checking, and the
//! membership/invitation/access-view lifecycles.

mod access_view;
mod authz;
pub mod error;
mod invitation;
mod membership;
pub mod saga;

pub use access_view::{AccessViewCredentials, AccessViewService};
pub use authz::{AuthContext, Authorizer};
pub use error::AccessError;
pub use invitation::{InvitationCheck, InvitationService};
pub use membership::MembershipService;
pub use saga::{CompensationFailure, Saga};
