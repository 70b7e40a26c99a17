use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_ADMIN, ROLE_STAFF};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Subject claim: stable user identifier from the identity service
    pub sub: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Admins own every image for access-control purposes
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// Staff (and admins) bypass the plan assignment table and resolve to the
    /// builtin top tier
    pub fn is_staff(&self) -> bool {
        self.has_role(ROLE_STAFF) || self.is_admin()
    }

    /// Whether this user may act on the given image owner's behalf
    pub fn can_access_owned_by(&self, owner_id: &str) -> bool {
        self.sub == owner_id || self.is_admin()
    }
}
