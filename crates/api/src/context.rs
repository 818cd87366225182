use axum::http::HeaderMap;

use reclaim_auth::Role;
use reclaim_core::{TenantId, UserId};
use reclaim_infra::SessionContext;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-role";

/// Build the session from headers set by the upstream authentication proxy.
///
/// Tenant and user must be UUIDs; the role is passed through as-is and only
/// checked later against the operation's permission.
pub fn session_from_headers(headers: &HeaderMap) -> Result<SessionContext, String> {
    let tenant_id: TenantId = required(headers, TENANT_HEADER)?
        .parse()
        .map_err(|e| format!("{TENANT_HEADER}: {e}"))?;
    let user_id: UserId = required(headers, USER_HEADER)?
        .parse()
        .map_err(|e| format!("{USER_HEADER}: {e}"))?;
    let role = required(headers, ROLE_HEADER)?.trim().to_ascii_lowercase();
    if role.is_empty() {
        return Err(format!("{ROLE_HEADER} must not be empty"));
    }

    Ok(SessionContext::new(tenant_id, user_id, Role::new(role)))
}

fn required<'h>(headers: &'h HeaderMap, name: &str) -> Result<&'h str, String> {
    headers
        .get(name)
        .ok_or_else(|| format!("missing {name} header"))?
        .to_str()
        .map_err(|_| format!("{name} is not valid ASCII"))
}
