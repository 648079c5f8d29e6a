use serde::{Deserialize, Serialize};

use certportal_core::{UserId, WorkflowError, WorkflowResult};

use crate::Role;

/// A resolved caller for authorization decisions.
///
/// Construction is decoupled from transport: the API derives this from
/// gateway-verified identity headers, tests build it directly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Require administrator privilege (admin or super_admin).
    ///
    /// - No IO
    /// - No panics
    /// - No business logic (pure policy check)
    pub fn require_admin(&self) -> WorkflowResult<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(WorkflowError::Unauthorized)
        }
    }

    /// Require that the caller owns the given record.
    ///
    /// Fails with `NotFound` rather than `Unauthorized` so record existence
    /// does not leak across ownership boundaries.
    pub fn require_owner(&self, owner: UserId) -> WorkflowResult<()> {
        if self.user_id == owner {
            Ok(())
        } else {
            Err(WorkflowError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_roles_pass_admin_check() {
        for role in [Role::Admin, Role::SuperAdmin] {
            let p = Principal::new(UserId::new(), role);
            assert!(p.require_admin().is_ok());
        }
    }

    #[test]
    fn applicant_fails_admin_check() {
        let p = Principal::new(UserId::new(), Role::Applicant);
        assert_eq!(p.require_admin().unwrap_err(), WorkflowError::Unauthorized);
    }

    #[test]
    fn ownership_mismatch_reports_not_found() {
        let p = Principal::new(UserId::new(), Role::Applicant);
        assert_eq!(
            p.require_owner(UserId::new()).unwrap_err(),
            WorkflowError::NotFound
        );
        assert!(p.require_owner(p.user_id).is_ok());
    }
}
