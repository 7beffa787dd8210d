use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The four role strings recognized by the system. Tenant users carry one of
/// the first three; `super_admin` exists only in the master registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Librarian,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Librarian => "librarian",
            Role::Student => "student",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "super_admin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "librarian" => Some(Role::Librarian),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    /// Roles assignable to tenant users
    pub fn is_tenant_role(&self) -> bool {
        !matches!(self, Role::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SHA-256 hex digest used for stored passwords. Credentials arrive on every
/// request, so comparison is digest equality against the stored value.
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Constant-shape comparison of a presented password against a stored digest
pub fn verify_password(password: &str, stored_digest: &str) -> bool {
    password_digest(password) == stored_digest
}
