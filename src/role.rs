//! Closed role vocabulary and the authenticated actor handed in by callers
use super::error::{FieldError, WorkflowError};
use std::fmt;
use std::str::FromStr;

/// Store-assigned identity of a user. Authentication happens outside this crate.
pub type UserId = u64;

/// Role tiers in approval order. The derived ordering is the seniority ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Site foreman, the tier that raises requests.
    Foreman,
    /// Dispatcher.
    Logistics,
    /// Site manager.
    Manager,
    /// Financial director.
    Finance,
    /// Top-level tier, may execute any edge of the chain.
    GeneralDirector,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Foreman,
        Role::Logistics,
        Role::Manager,
        Role::Finance,
        Role::GeneralDirector,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Foreman => "foreman",
            Role::Logistics => "logistics",
            Role::Manager => "manager",
            Role::Finance => "finance",
            Role::GeneralDirector => "general_director",
        }
    }

    pub fn is_universal_approver(&self) -> bool {
        matches!(self, Role::GeneralDirector)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = FieldError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "foreman" => Ok(Role::Foreman),
            "logistics" => Ok(Role::Logistics),
            "manager" => Ok(Role::Manager),
            "finance" => Ok(Role::Finance),
            "general_director" | "general-director" => Ok(Role::GeneralDirector),
            other => Err(FieldError::new(
                "role",
                format!(
                    "unknown role `{other}` (expected foreman|logistics|manager|finance|general_director)"
                ),
            )),
        }
    }
}

/// The authenticated user issuing a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Build an actor from the raw role string supplied by the auth layer.
    pub fn parse(id: UserId, role: &str) -> Result<Self, WorkflowError> {
        let role = role.parse::<Role>().map_err(WorkflowError::from)?;
        Ok(Self { id, role })
    }
}
