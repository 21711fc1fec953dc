//! Web-portal staff roles.

use serde::{Deserialize, Serialize};

/// Role of a web-portal staff member.
///
/// A closed enum rather than free-form strings compared by equality, which
/// invites typo bugs. The serialized form keeps the exact strings the
/// frontend and the stored documents use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "SuperAdmin")]
    SuperAdmin,
    #[serde(rename = "Admin RRHH")]
    AdminRrhh,
    #[serde(rename = "Usuario RRHH")]
    UsuarioRrhh,
    #[serde(rename = "Gestor Casos")]
    GestorCasos,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::AdminRrhh => "Admin RRHH",
            Role::UsuarioRrhh => "Usuario RRHH",
            Role::GestorCasos => "Gestor Casos",
        }
    }

    /// Parse the stored role string. Unknown strings yield `None`, which the
    /// guards treat as roleless (fails closed).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SuperAdmin" => Some(Role::SuperAdmin),
            "Admin RRHH" => Some(Role::AdminRrhh),
            "Usuario RRHH" => Some(Role::UsuarioRrhh),
            "Gestor Casos" => Some(Role::GestorCasos),
            _ => None,
        }
    }

    /// Admin roles short-circuit ownership checks.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::AdminRrhh)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_stored_strings() {
        for role in [
            Role::SuperAdmin,
            Role::AdminRrhh,
            Role::UsuarioRrhh,
            Role::GestorCasos,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn unknown_role_string_is_roleless() {
        assert_eq!(Role::parse("Administrador RRHH"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn only_superadmin_and_admin_rrhh_are_admin() {
        assert!(Role::SuperAdmin.is_admin());
        assert!(Role::AdminRrhh.is_admin());
        assert!(!Role::UsuarioRrhh.is_admin());
        assert!(!Role::GestorCasos.is_admin());
    }
}
