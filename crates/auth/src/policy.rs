//! Role-gated route actions.
//!
//! One allow-list table for every role-only gate, keyed by a closed action
//! enum. Ownership gates (creator / assigned gestor) live in `guard` because
//! they also need record fields.

use crate::roles::Role;

/// Route actions whose gate is a pure role allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    /// Create a web staff account.
    WebUserCreate,
    /// List web staff accounts.
    WebUserList,
    /// Edit a web staff account.
    WebUserEdit,
    /// Delete a web staff account.
    WebUserDelete,
}

/// Roles allowed to perform `action`.
pub fn allowed_roles(action: RouteAction) -> &'static [Role] {
    match action {
        RouteAction::WebUserCreate | RouteAction::WebUserEdit | RouteAction::WebUserDelete => {
            &[Role::SuperAdmin, Role::AdminRrhh]
        }
        RouteAction::WebUserList => &[Role::SuperAdmin, Role::AdminRrhh, Role::GestorCasos],
    }
}

/// Whether a caller with `role` may perform `action`.
///
/// A caller with no stored role (`None`) is denied: role gates fail closed.
pub fn permits(action: RouteAction, role: Option<Role>) -> bool {
    match role {
        Some(role) => allowed_roles(action).contains(&role),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_user_mutations_are_admin_only() {
        for action in [
            RouteAction::WebUserCreate,
            RouteAction::WebUserEdit,
            RouteAction::WebUserDelete,
        ] {
            assert!(permits(action, Some(Role::SuperAdmin)));
            assert!(permits(action, Some(Role::AdminRrhh)));
            assert!(!permits(action, Some(Role::UsuarioRrhh)));
            assert!(!permits(action, Some(Role::GestorCasos)));
            assert!(!permits(action, None));
        }
    }

    #[test]
    fn gestor_may_list_web_users() {
        assert!(permits(RouteAction::WebUserList, Some(Role::GestorCasos)));
        assert!(!permits(RouteAction::WebUserList, Some(Role::UsuarioRrhh)));
    }
}
