use serde::{Deserialize, Serialize};

use reclaim_core::{TenantId, UserId};

use crate::{Permission, Role, permissions_for_role};

/// A user's membership in a tenant: which roles and permissions apply there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

/// A fully resolved principal for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub active_tenant_id: TenantId,
    pub membership: TenantMembership,
}

impl Principal {
    /// Resolve a principal from session data using the static role policy.
    pub fn from_session(tenant_id: TenantId, user_id: UserId, role: Role) -> Self {
        let permissions = permissions_for_role(&role);
        Self {
            user_id,
            active_tenant_id: tenant_id,
            membership: TenantMembership {
                tenant_id,
                roles: vec![role],
                permissions,
            },
        }
    }
}
