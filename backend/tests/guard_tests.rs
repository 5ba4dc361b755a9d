//! Guard ordering tests
//!
//! The access guard and cycle lock gate run before any transaction opens.
//! These tests pin the decision rules and the short-circuit order.

use proptest::prelude::*;

use shared::models::Role;

/// The access rule: admins always pass; members need a project and an
/// assignment to it (directly or via a team).
fn can_access(role: Role, has_project: bool, direct_member: bool, team_member: bool) -> bool {
    if role.is_admin() {
        return true;
    }
    has_project && (direct_member || team_member)
}

/// Update/delete pre-checks in order: original cycle lock, target cycle
/// lock, then authorization. Returns the first failure; none of them ever
/// reaches the transaction.
fn precheck(
    role: Role,
    has_project: bool,
    direct_member: bool,
    team_member: bool,
    original_cycle_locked: Option<bool>,
    target_cycle_locked: Option<bool>,
) -> Result<(), &'static str> {
    if original_cycle_locked.unwrap_or(false) {
        return Err("cycle_locked");
    }
    if target_cycle_locked.unwrap_or(false) {
        return Err("cycle_locked");
    }
    if !can_access(role, has_project, direct_member, team_member) {
        return Err("forbidden");
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_admin_always_passes() {
        assert!(can_access(Role::Admin, false, false, false));
        assert!(can_access(Role::Admin, true, false, false));
    }

    #[test]
    fn test_member_without_project_is_forbidden() {
        assert!(!can_access(Role::Member, false, true, true));
    }

    #[test]
    fn test_member_needs_some_assignment() {
        assert!(!can_access(Role::Member, true, false, false));
        assert!(can_access(Role::Member, true, true, false));
        assert!(can_access(Role::Member, true, false, true));
    }

    #[test]
    fn test_locked_cycle_blocks_regardless_of_role() {
        let result = precheck(Role::Admin, true, true, true, Some(true), None);
        assert_eq!(result, Err("cycle_locked"));
    }

    #[test]
    fn test_target_cycle_also_checked() {
        // Moving a sale into a locked cycle fails even when the original
        // cycle is open.
        let result = precheck(Role::Admin, true, true, true, Some(false), Some(true));
        assert_eq!(result, Err("cycle_locked"));
    }

    #[test]
    fn test_null_cycle_never_locks() {
        assert!(precheck(Role::Admin, true, true, true, None, None).is_ok());
    }

    #[test]
    fn test_forbidden_member() {
        let result = precheck(Role::Member, true, false, false, None, None);
        assert_eq!(result, Err("forbidden"));
    }

    #[test]
    fn test_role_names_round_trip() {
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str("member"), Some(Role::Member));
        assert_eq!(Role::from_str("owner"), None);
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Member.as_str(), "member");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Admin), Just(Role::Member)]
    }

    proptest! {
        /// A member with no assignment can never mutate, whatever the
        /// cycle state.
        #[test]
        fn prop_unassigned_member_never_passes(
            has_project in any::<bool>(),
            original_locked in proptest::option::of(any::<bool>()),
            target_locked in proptest::option::of(any::<bool>())
        ) {
            let result = precheck(
                Role::Member, has_project, false, false,
                original_locked, target_locked,
            );
            prop_assert!(result.is_err());
        }

        /// A locked cycle always produces the distinguished conflict,
        /// regardless of role or assignment.
        #[test]
        fn prop_locked_cycle_always_conflicts(
            role in role_strategy(),
            has_project in any::<bool>(),
            direct in any::<bool>(),
            team in any::<bool>()
        ) {
            let result = precheck(role, has_project, direct, team, Some(true), None);
            prop_assert_eq!(result, Err("cycle_locked"));
        }

        /// Admins with unlocked cycles always pass.
        #[test]
        fn prop_admin_passes_when_unlocked(
            has_project in any::<bool>(),
            direct in any::<bool>(),
            team in any::<bool>()
        ) {
            prop_assert!(precheck(
                Role::Admin, has_project, direct, team,
                Some(false), Some(false),
            ).is_ok());
        }
    }
}
