//! `reclaim-auth`: authorization boundary for order operations.
//!
//! Authentication happens upstream; this crate only answers "may this session
//! perform that operation in its tenant". No HTTP, no storage.

pub mod authorize;
pub mod permissions;
pub mod policy;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize};
pub use permissions::Permission;
pub use policy::permissions_for_role;
pub use principal::{Principal, TenantMembership};
pub use roles::Role;
