//! Status transition engine.
//!
//! The forward chain is a fixed total order and each role tier owns exactly
//! one edge of it (finance owns the last two). Approving walks one edge;
//! rejecting exits the chain from any non-terminal status.
use super::error::WorkflowError;
use super::permission::{self, Action};
use super::role::Role;
use super::status::Status;

/// A permitted forward move and the tier that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: Status,
    pub to: Status,
    pub owner: Role,
}

static CHAIN: [Edge; 4] = [
    Edge {
        from: Status::Created,
        to: Status::Logistics,
        owner: Role::Logistics,
    },
    Edge {
        from: Status::Logistics,
        to: Status::Manager,
        owner: Role::Manager,
    },
    Edge {
        from: Status::Manager,
        to: Status::Finance,
        owner: Role::Finance,
    },
    Edge {
        from: Status::Finance,
        to: Status::Approved,
        owner: Role::Finance,
    },
];

pub fn edges() -> &'static [Edge] {
    &CHAIN
}

/// The edge leaving `status`. Terminal statuses have none.
pub fn edge_from(status: Status) -> Option<&'static Edge> {
    CHAIN.iter().find(|edge| edge.from == status)
}

pub fn successor(status: Status) -> Option<Status> {
    edge_from(status).map(|edge| edge.to)
}

/// Next status for an approve by `role`, or why it can't happen.
pub fn approve(status: Status, role: Role) -> Result<Status, WorkflowError> {
    let Some(edge) = edge_from(status) else {
        return Err(WorkflowError::invalid(Action::Approve, status));
    };
    debug_assert_eq!(permission::approver_for(status), Some(edge.owner));

    if !permission::can_approve(role, status) {
        return Err(WorkflowError::denied(role, Action::Approve, status));
    }

    Ok(edge.to)
}

pub fn reject(status: Status, role: Role) -> Result<Status, WorkflowError> {
    if !permission::can_reject(role) {
        return Err(WorkflowError::denied(role, Action::Reject, status));
    }
    if status.is_terminal() {
        return Err(WorkflowError::invalid(Action::Reject, status));
    }

    Ok(Status::Rejected)
}

/// Administrative close-out of an approved request. Not part of the role-driven chain.
pub fn complete(status: Status) -> Result<Status, WorkflowError> {
    match status {
        Status::Approved => Ok(Status::Completed),
        other => Err(WorkflowError::invalid(Action::Complete, other)),
    }
}
