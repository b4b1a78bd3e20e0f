use dashmap::DashMap;
use ulid::Ulid;

use crate::model::{StaffMember, StaffRole};

/// Opaque capability check for staff operations. Token issuance and
/// password handling live outside this service; the directory maps
/// already-issued bearer tokens to staff identities.
pub struct StaffDirectory {
    tokens: DashMap<String, StaffMember>,
}

impl Default for StaffDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl StaffDirectory {
    pub fn new() -> Self {
        Self {
            tokens: DashMap::new(),
        }
    }

    pub fn register(&self, token: &str, name: &str, role: StaffRole) -> StaffMember {
        let member = StaffMember {
            id: Ulid::new(),
            name: name.to_string(),
            role,
        };
        self.tokens.insert(token.to_string(), member.clone());
        member
    }

    pub fn verify_token(&self, token: &str) -> Option<StaffMember> {
        self.tokens.get(token).map(|e| e.value().clone())
    }
}
