use super::permission::Action;
use super::request::RequestId;
use super::role::Role;
use super::status::Status;
use std::fmt;

/// A single offending input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Outcome of a rejected command. Everything but `Storage` is an expected result.
#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error("invalid input: {}", join_fields(.0))]
    Validation(Vec<FieldError>),
    #[error("role `{role}` may not {action} a request in status `{status}`")]
    PermissionDenied {
        role: Role,
        action: Action,
        status: Status,
    },
    #[error("cannot {action} a request in status `{status}`")]
    InvalidTransition { action: Action, status: Status },
    #[error("request {0} does not exist")]
    NotFound(RequestId),
    #[error("request {id} is no longer in status `{expected}`, re-read and retry")]
    Conflict { id: RequestId, expected: Status },
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

/// Failures raised by a [`crate::store::RequestStore`].
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("request {0} is not in the store")]
    Missing(RequestId),
    #[error("request {id} moved away from `{expected}` before the write")]
    Stale { id: RequestId, expected: Status },
    #[error(transparent)]
    Sled(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(String),
    #[error("failed to decode record: {0}")]
    Decode(#[from] minicbor::decode::Error),
}

/// Short tag for the calling layer to pick a message without matching on payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    PermissionDenied,
    InvalidTransition,
    NotFound,
    Conflict,
    Storage,
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Validation(_) => ErrorKind::Validation,
            WorkflowError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            WorkflowError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            WorkflowError::NotFound(_) => ErrorKind::NotFound,
            WorkflowError::Conflict { .. } => ErrorKind::Conflict,
            WorkflowError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Only optimistic-concurrency failures are worth retrying after a re-read.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkflowError::Conflict { .. })
    }

    pub fn denied(role: Role, action: Action, status: Status) -> Self {
        WorkflowError::PermissionDenied {
            role,
            action,
            status,
        }
    }

    pub fn invalid(action: Action, status: Status) -> Self {
        WorkflowError::InvalidTransition { action, status }
    }
}

impl From<FieldError> for WorkflowError {
    fn from(value: FieldError) -> Self {
        WorkflowError::Validation(vec![value])
    }
}

impl From<StoreError> for WorkflowError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Missing(id) => WorkflowError::NotFound(id),
            StoreError::Stale { id, expected } => WorkflowError::Conflict { id, expected },
            other => WorkflowError::Storage(other),
        }
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
