use core::str::FromStr;

use serde::{Deserialize, Serialize};

use certportal_core::WorkflowError;

/// Role of an authenticated caller.
///
/// Administrative operations (approve, reject, invoice management) require
/// `Admin` or `SuperAdmin`; applicants only own their submissions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Applicant,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applicant" => Ok(Role::Applicant),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(WorkflowError::validation(format!("unknown role '{other}'"))),
        }
    }
}
