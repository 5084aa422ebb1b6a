use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role claim carried by a token.
///
/// Roles are free-form strings on the wire. The well-known values are
/// [`Role::ADMIN`] and [`Role::USER`]; nothing normalises case, and only
/// [`Role::is_admin`] compares case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("ADMIN"));
    pub const USER: Role = Role(Cow::Borrowed("USER"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when this role grants access to admin-restricted paths.
    pub fn is_admin(&self) -> bool {
        self.0.eq_ignore_ascii_case("ADMIN")
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self(Cow::Owned(value.to_string()))
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_check_ignores_case() {
        assert!(Role::ADMIN.is_admin());
        assert!(Role::new("admin").is_admin());
        assert!(Role::new("Admin").is_admin());
        assert!(!Role::USER.is_admin());
        assert!(!Role::new("ADMINISTRATOR").is_admin());
    }

    #[test]
    fn role_text_is_not_normalised() {
        let role = Role::from("admin");
        assert_eq!(role.as_str(), "admin");
        assert_ne!(role, Role::ADMIN);
    }
}
