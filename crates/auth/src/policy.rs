//! Static role → permission policy.

use crate::{Permission, Role};

/// Permissions granted to a role within its tenant.
///
/// Unknown roles get nothing.
pub fn permissions_for_role(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "admin" => vec![Permission::WILDCARD],
        "manager" => vec![
            Permission::ORDERS_WRITE,
            Permission::ORDERS_APPROVE,
            Permission::ORDERS_RELEASE,
        ],
        "sales" => vec![Permission::ORDERS_WRITE],
        _ => Vec::new(),
    }
}
