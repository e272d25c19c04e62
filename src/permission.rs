//! Authorization decisions for the workflow.
//!
//! Every predicate here is pure: it looks only at the acting role, the
//! request's status and, where ownership matters, the acting user and the
//! request's creator. Call sites never compare roles themselves; they ask
//! this module.
use super::role::{Role, UserId};
use super::status::Status;
use super::visibility::Visibility;
use std::fmt;

/// The command an authorization decision is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Edit,
    Approve,
    Reject,
    Comment,
    Complete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Action::View => "view",
            Action::Edit => "edit",
            Action::Approve => "approve",
            Action::Reject => "reject",
            Action::Comment => "comment on",
            Action::Complete => "complete",
        };
        f.write_str(verb)
    }
}

/// Privileged capability outside the role chain, handed out by the embedding layer.
/// It is the only way to touch a request once it is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminOverride {
    user_id: UserId,
}

impl AdminOverride {
    pub fn grant(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

const LOGISTICS_VISIBLE: &[Status] = &[
    Status::Created,
    Status::Logistics,
    Status::Manager,
    Status::Finance,
    Status::Approved,
    Status::Completed,
];
const EVERY_STATUS: &[Status] = &Status::ALL;
const MANAGER_VISIBLE: &[Status] = &[
    Status::Manager,
    Status::Finance,
    Status::Approved,
    Status::Completed,
];

/// Statuses (or the ownership rule) a role may list and open.
pub fn can_view(role: Role) -> Visibility {
    match role {
        Role::Foreman => Visibility::Owned,
        Role::Logistics => Visibility::Statuses(LOGISTICS_VISIBLE),
        Role::Manager => Visibility::Statuses(MANAGER_VISIBLE),
        Role::Finance | Role::GeneralDirector => Visibility::Statuses(EVERY_STATUS),
    }
}

/// The visibility table applied to one request.
pub fn can_view_request(role: Role, status: Status, actor_id: UserId, created_by: UserId) -> bool {
    match can_view(role) {
        Visibility::Owned => actor_id == created_by,
        Visibility::Statuses(statuses) => statuses.contains(&status),
    }
}

/// Statuses inside a role's ordinary edit window. Never contains a terminal status.
pub fn edit_window(role: Role) -> &'static [Status] {
    match role {
        Role::Foreman => &[Status::Created],
        Role::Logistics => &[Status::Created, Status::Logistics],
        Role::Manager => &[Status::Logistics, Status::Manager],
        Role::Finance => &[Status::Manager, Status::Finance],
        Role::GeneralDirector => &[
            Status::Created,
            Status::Logistics,
            Status::Manager,
            Status::Finance,
        ],
    }
}

pub fn can_edit(role: Role, status: Status, actor_id: UserId, created_by: UserId) -> bool {
    if status.is_terminal() || !edit_window(role).contains(&status) {
        return false;
    }
    // the creator tier only ever touches its own drafts
    role != Role::Foreman || actor_id == created_by
}

/// Owner of the forward edge leaving `status`, if any.
pub fn approver_for(status: Status) -> Option<Role> {
    match status {
        Status::Created => Some(Role::Logistics),
        Status::Logistics => Some(Role::Manager),
        Status::Manager | Status::Finance => Some(Role::Finance),
        Status::Approved | Status::Rejected | Status::Completed => None,
    }
}

pub fn can_approve(role: Role, status: Status) -> bool {
    match approver_for(status) {
        Some(owner) => role == owner || role.is_universal_approver(),
        None => false,
    }
}

/// Manager tier and above may reject; the status only matters to the transition engine.
pub fn can_reject(role: Role) -> bool {
    role >= Role::Manager
}

pub fn can_comment(role: Role, status: Status, actor_id: UserId, created_by: UserId) -> bool {
    can_view_request(role, status, actor_id, created_by)
        || can_edit(role, status, actor_id, created_by)
        || can_approve(role, status)
}
