use super::error::FieldError;
use std::fmt;
use std::str::FromStr;

/// Workflow position of a request. Declaration order is the forward order of the chain.
#[derive(
    minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Status {
    #[n(0)]
    Created,
    #[n(1)]
    Logistics,
    #[n(2)]
    Manager,
    #[n(3)]
    Finance,
    #[n(4)]
    Approved,
    #[n(5)]
    Rejected,
    #[n(6)]
    Completed,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::Created,
        Status::Logistics,
        Status::Manager,
        Status::Finance,
        Status::Approved,
        Status::Rejected,
        Status::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "created",
            Status::Logistics => "logistics",
            Status::Manager => "manager",
            Status::Finance => "finance",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
            Status::Completed => "completed",
        }
    }

    /// No ordinary-workflow transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Approved | Status::Rejected | Status::Completed)
    }

    /// `completed` is approved-plus-fulfilled, so it counts for approval aggregates.
    pub fn counts_as_approved(&self) -> bool {
        matches!(self, Status::Approved | Status::Completed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = FieldError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_ascii_lowercase();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == needle)
            .ok_or_else(|| FieldError::new("status", format!("unknown status `{needle}`")))
    }
}
