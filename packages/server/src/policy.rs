//! Role capabilities and problem visibility.
//!
//! One capability table per role, evaluated by a single lookup. Handlers call
//! the predicates below in order before touching data; each returns allow or
//! a typed denial.

use common::{DevStatus, Role};

use crate::error::AppError;

const STAFF_CAPS: &[&str] = &[
    "problem:create",
    "problem:edit",
    "problem:delete",
    "problem:transition",
    "testcase:manage",
    "submission:submit",
    "catalog:staff_view",
];

/// Dev callers hold every staff capability.
const DEV_CAPS: &[&str] = STAFF_CAPS;

const MEMBER_CAPS: &[&str] = &["submission:submit"];

/// Capabilities granted to a role.
pub fn capabilities(role: Role) -> &'static [&'static str] {
    match role {
        Role::Dev => DEV_CAPS,
        Role::Staff => STAFF_CAPS,
        Role::Member => MEMBER_CAPS,
    }
}

/// Returns `Ok(())` if `role` holds `capability`, `Err(Forbidden)` otherwise.
pub fn require(role: Role, capability: &str) -> Result<(), AppError> {
    if capabilities(role).contains(&capability) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Whether `role` may see a problem in lifecycle state `status`.
///
/// Staff and dev callers manage problems regardless of lifecycle state;
/// members only ever see published ones.
pub fn can_view(role: Role, status: DevStatus) -> bool {
    match role {
        Role::Dev | Role::Staff => true,
        Role::Member => status == DevStatus::Published,
    }
}

/// Guard form of [`can_view`]. The denial is `Forbidden`, never `NotFound`:
/// existence was already established by the lookup that preceded this check.
pub fn require_visible(role: Role, status: DevStatus) -> Result<(), AppError> {
    if can_view(role, status) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Whether `role` may see hidden test case content (inputs, expected
/// outputs, raw candidate output) in problem views and verdicts.
pub fn can_view_hidden_data(role: Role) -> bool {
    matches!(role, Role::Dev | Role::Staff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_sees_only_published() {
        for status in DevStatus::ALL {
            let expected = *status == DevStatus::Published;
            assert_eq!(can_view(Role::Member, *status), expected);
        }
    }

    #[test]
    fn test_staff_and_dev_see_everything() {
        for status in DevStatus::ALL {
            assert!(can_view(Role::Staff, *status));
            assert!(can_view(Role::Dev, *status));
        }
    }

    #[test]
    fn test_member_capabilities() {
        assert!(require(Role::Member, "submission:submit").is_ok());
        assert!(require(Role::Member, "problem:create").is_err());
        assert!(require(Role::Member, "catalog:staff_view").is_err());
    }

    #[test]
    fn test_staff_capabilities() {
        for cap in ["problem:create", "problem:transition", "testcase:manage"] {
            assert!(require(Role::Staff, cap).is_ok());
            assert!(require(Role::Dev, cap).is_ok());
        }
    }

    #[test]
    fn test_hidden_data_visibility() {
        assert!(can_view_hidden_data(Role::Staff));
        assert!(can_view_hidden_data(Role::Dev));
        assert!(!can_view_hidden_data(Role::Member));
    }
}
