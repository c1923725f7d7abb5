//! Covera Engine — authorization, entitlement, and workflow services.
//!
//! Every service here is generic over the `covera-core` repository traits,
//! so the engine carries no dependency on the database crate. All mutation
//! of roles, warranties, and service requests goes through these entry
//! points; the atomic check-then-act guarantees themselves live in the
//! repository implementations, and the engine supplies the decision logic
//! and the error shaping around them.

pub mod approvals;
pub mod authorizer;
pub mod entitlement;
pub mod requests;
pub mod roles;

pub use approvals::ApprovalService;
pub use authorizer::{authorize_role_change, can_change_role};
pub use entitlement::EntitlementLedger;
pub use requests::RequestService;
pub use roles::RoleService;
