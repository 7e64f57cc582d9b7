//! Tenant + client scoping.
//!
//! Every node, edge, and chunk lives inside exactly one `(tenant_id, client_id)`
//! scope. All store queries, vector searches, and maintenance passes are
//! scope-local; nothing ever crosses a scope boundary.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant + client pair identifying one isolated graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope {
    /// The owning tenant.
    pub tenant_id: Uuid,
    /// The client within the tenant.
    pub client_id: Uuid,
}

impl Scope {
    /// Create a scope from a tenant and client ID.
    pub const fn new(tenant_id: Uuid, client_id: Uuid) -> Self {
        Self {
            tenant_id,
            client_id,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.client_id)
    }
}
