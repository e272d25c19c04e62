//! Append-only audit trail attached to each request
use super::request::{RequestId, TimeStamp};
use super::role::UserId;
use super::status::Status;
use std::fmt;
use uuid7::{Uuid, uuid7};

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum AuditAction {
    #[n(0)]
    Created,
    #[n(1)]
    Approved,
    #[n(2)]
    Rejected,
    #[n(3)]
    Updated,
    #[n(4)]
    Commented,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            AuditAction::Created => "created",
            AuditAction::Approved => "approved",
            AuditAction::Rejected => "rejected",
            AuditAction::Updated => "updated",
            AuditAction::Commented => "commented",
        };
        f.write_str(tag)
    }
}

/// Immutable record of one command's effect. Never updated or deleted.
#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct AuditEntry {
    #[n(0)]
    pub id: String, // uuid7, time ordered
    #[n(1)]
    pub request_id: RequestId,
    #[n(2)]
    pub author_id: UserId,
    #[n(3)]
    pub comment: String,
    #[n(4)]
    pub action: AuditAction,
    #[n(5)]
    pub created_at: TimeStamp,
}

impl AuditEntry {
    pub fn new(
        request_id: RequestId,
        author_id: UserId,
        action: AuditAction,
        comment: impl Into<String>,
        created_at: TimeStamp,
    ) -> Self {
        Self::with_id(uuid7(), request_id, author_id, action, comment, created_at)
    }

    fn with_id(
        id: Uuid,
        request_id: RequestId,
        author_id: UserId,
        action: AuditAction,
        comment: impl Into<String>,
        created_at: TimeStamp,
    ) -> Self {
        Self {
            id: id.to_string(),
            request_id,
            author_id,
            comment: comment.into(),
            action,
            created_at,
        }
    }

    pub fn created(request_id: RequestId, author_id: UserId, now: TimeStamp) -> Self {
        Self::new(request_id, author_id, AuditAction::Created, "request created", now)
    }

    pub fn transition(
        request_id: RequestId,
        author_id: UserId,
        from: Status,
        to: Status,
        now: TimeStamp,
    ) -> Self {
        let action = match to {
            Status::Rejected => AuditAction::Rejected,
            Status::Completed => AuditAction::Updated,
            _ => AuditAction::Approved,
        };
        Self::new(request_id, author_id, action, format!("{from} -> {to}"), now)
    }

    /// Edits are logged even when nothing changed.
    pub fn updated(
        request_id: RequestId,
        author_id: UserId,
        changed: &[&str],
        now: TimeStamp,
    ) -> Self {
        let comment = if changed.is_empty() {
            "no changes".to_owned()
        } else {
            format!("changed {}", changed.join(", "))
        };
        Self::new(request_id, author_id, AuditAction::Updated, comment, now)
    }

    pub fn commented(
        request_id: RequestId,
        author_id: UserId,
        text: &str,
        now: TimeStamp,
    ) -> Self {
        Self::new(request_id, author_id, AuditAction::Commented, text.trim(), now)
    }

    /// Store key: request id then entry id, so a prefix scan yields append order.
    pub fn storage_key(&self) -> Option<Vec<u8>> {
        let id: Uuid = self.id.parse().ok()?;
        let mut key = self.request_id.to_be_bytes().to_vec();
        key.extend_from_slice(id.as_bytes());
        Some(key)
    }
}

/// An audit trail loaded for one request.
#[derive(Debug, Default)]
pub struct AuditLog {
    pub request_id: RequestId,
    pub entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new(request_id: RequestId, entries: Vec<AuditEntry>) -> Self {
        Self {
            request_id,
            entries,
        }
    }

    pub fn actions(&self) -> Vec<AuditAction> {
        self.entries.iter().map(|entry| entry.action).collect()
    }

    pub fn last(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn view_history(&self) {
        for entry in &self.entries {
            tracing::info!(
                request_id = entry.request_id,
                author = entry.author_id,
                action = %entry.action,
                at = %entry.created_at.to_datetime_utc(),
                "{}",
                entry.comment
            );
        }
    }
}
