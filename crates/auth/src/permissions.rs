use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier (e.g. "sales.orders.approve").
///
/// `"*"` grants everything within the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));
    /// Create, edit, compute tax, submit, cancel.
    pub const ORDERS_WRITE: Permission = Permission(Cow::Borrowed("sales.orders.write"));
    pub const ORDERS_APPROVE: Permission = Permission(Cow::Borrowed("sales.orders.approve"));
    pub const ORDERS_RELEASE: Permission = Permission(Cow::Borrowed("sales.orders.release"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
