pub mod invitation;
pub mod membership;
pub mod organization;
pub mod role;
pub mod session;
pub mod user;

pub use invitation::{Invitation, InvitationState};
pub use membership::{MemberSelector, Membership};
pub use organization::Organization;
pub use role::{Action, GlobalRole, OrgRole, Resource};
pub use session::Session;
pub use user::{NewUser, User};
