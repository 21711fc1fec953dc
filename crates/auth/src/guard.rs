//! Ownership gates.
//!
//! Pure predicates over plain data: caller UID, the caller's stored role,
//! and the relevant record fields. Handlers decide existence first (404),
//! then apply these (403), so the two failure modes stay distinguishable.

use crate::roles::Role;

fn is_admin(role: Option<Role>) -> bool {
    role.is_some_and(|r| r.is_admin())
}

/// Owner-or-admin gate, used for surveys.
pub fn can_modify_owned(caller_uid: &str, role: Option<Role>, creada_por: &str) -> bool {
    creada_por == caller_uid || is_admin(role)
}

/// Case edit: creator, assigned gestor, or admin.
pub fn can_edit_case(
    caller_uid: &str,
    role: Option<Role>,
    creada_por: &str,
    gestor_asignado: Option<&str>,
) -> bool {
    creada_por == caller_uid || gestor_asignado == Some(caller_uid) || is_admin(role)
}

/// Case delete: creator or admin. The assigned gestor may edit but not delete.
pub fn can_delete_case(caller_uid: &str, role: Option<Role>, creada_por: &str) -> bool {
    creada_por == caller_uid || is_admin(role)
}

/// Observation create: only the case's assigned gestor. Admins do not
/// bypass this gate.
pub fn can_annotate_case(caller_uid: &str, gestor_asignado: Option<&str>) -> bool {
    gestor_asignado == Some(caller_uid)
}

/// Observation edit/delete: the case's assigned gestor or an admin.
///
/// Ownership is derived from the parent case, never from the observation
/// itself; callers must pass the case's current `gestorAsignado`.
pub fn can_modify_observation(
    caller_uid: &str,
    role: Option<Role>,
    gestor_asignado: Option<&str>,
) -> bool {
    gestor_asignado == Some(caller_uid) || is_admin(role)
}
