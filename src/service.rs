//! Command entry point for the transport request workflow.
//!
//! Each command is one synchronous read, check, write sequence against the
//! store. A command either applies its state change together with exactly one
//! audit entry or fails with a typed [`WorkflowError`] and leaves both the
//! request and its log untouched.
use super::audit::{AuditEntry, AuditLog};
use super::error::{FieldError, WorkflowError};
use super::permission::{self, Action, AdminOverride};
use super::request::{Request, RequestFields, RequestId, RequestPatch, TimeStamp};
use super::role::{Actor, UserId};
use super::status::Status;
use super::store::{Guard, RequestStore, SledStore};
use super::summary::RequestSummary;
use super::transition;
use super::visibility::Visibility;
use tracing::{info, instrument};

pub struct TransportService<S: RequestStore = SledStore> {
    store: S,
}

impl<S: RequestStore> TransportService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Raise a new request. The number, the `created` status and the first audit
    /// entry are written together.
    #[instrument(skip_all, fields(actor = actor.id, role = %actor.role), err(level = "warn"))]
    pub fn create_request(
        &self,
        fields: RequestFields,
        actor: &Actor,
    ) -> Result<Request, WorkflowError> {
        fields.validate()?;

        let now = TimeStamp::now();
        let author = actor.id;
        let request = self.store.create(now.year(), &|id, number| {
            (
                Request::new(id, number, fields.clone(), author, now),
                AuditEntry::created(id, author, now),
            )
        })?;

        info!(request_id = request.id, number = %request.number, "request created");
        Ok(request)
    }

    /// Change route, cargo or logistics fields inside the actor's edit window.
    #[instrument(skip_all, fields(request_id = id, actor = actor.id, role = %actor.role), err(level = "warn"))]
    pub fn edit_request(
        &self,
        id: RequestId,
        patch: RequestPatch,
        actor: &Actor,
    ) -> Result<Request, WorkflowError> {
        let current = self.store.load(id)?;

        if current.status.is_terminal() {
            return Err(WorkflowError::invalid(Action::Edit, current.status));
        }
        if !permission::can_edit(actor.role, current.status, actor.id, current.created_by) {
            return Err(WorkflowError::denied(
                actor.role,
                Action::Edit,
                current.status,
            ));
        }
        patch.validate()?;

        let now = TimeStamp::now();
        let mut updated = current.next_revision(current.status, now);
        let changed = updated.apply(&patch);
        let entry = AuditEntry::updated(id, actor.id, &changed, now);

        self.store
            .compare_and_set(Guard::of(&current), &updated, &entry)?;

        info!(number = %updated.number, changed = ?changed, "request edited");
        Ok(updated)
    }

    /// Move the request one edge down the chain from wherever it currently is.
    pub fn approve_request(&self, id: RequestId, actor: &Actor) -> Result<Request, WorkflowError> {
        let current = self.store.load(id)?;
        self.advance(current, actor)
    }

    /// Approve only if the request is still at the status the caller last saw.
    pub fn approve_request_from(
        &self,
        id: RequestId,
        expected: Status,
        actor: &Actor,
    ) -> Result<Request, WorkflowError> {
        let current = self.store.load(id)?;
        if current.status != expected {
            tracing::warn!(
                request_id = id,
                expected = %expected,
                found = %current.status,
                "approve raced another transition"
            );
            return Err(WorkflowError::Conflict { id, expected });
        }
        self.advance(current, actor)
    }

    #[instrument(skip_all, fields(request_id = current.id, actor = actor.id, role = %actor.role), err(level = "warn"))]
    fn advance(&self, current: Request, actor: &Actor) -> Result<Request, WorkflowError> {
        let next = transition::approve(current.status, actor.role)?;
        self.swap(current, next, actor.id)
    }

    /// Take the request out of the chain. Terminal requests can't be rejected again.
    #[instrument(skip_all, fields(request_id = id, actor = actor.id, role = %actor.role), err(level = "warn"))]
    pub fn reject_request(&self, id: RequestId, actor: &Actor) -> Result<Request, WorkflowError> {
        let current = self.store.load(id)?;
        let next = transition::reject(current.status, actor.role)?;
        self.swap(current, next, actor.id)
    }

    fn swap(&self, current: Request, next: Status, author: UserId) -> Result<Request, WorkflowError> {
        let now = TimeStamp::now();
        let updated = current.next_revision(next, now);
        let entry = AuditEntry::transition(current.id, author, current.status, next, now);

        self.store
            .compare_and_set(Guard::of(&current), &updated, &entry)?;

        info!(
            number = %updated.number,
            from = %current.status,
            to = %updated.status,
            "request transitioned"
        );
        Ok(updated)
    }

    #[instrument(skip_all, fields(request_id = id, actor = actor.id, role = %actor.role), err(level = "warn"))]
    pub fn add_comment(
        &self,
        id: RequestId,
        text: &str,
        actor: &Actor,
    ) -> Result<AuditEntry, WorkflowError> {
        let current = self.store.load(id)?;

        if !permission::can_comment(actor.role, current.status, actor.id, current.created_by) {
            return Err(WorkflowError::denied(
                actor.role,
                Action::Comment,
                current.status,
            ));
        }
        if text.trim().is_empty() {
            return Err(FieldError::new("comment", "must not be empty").into());
        }

        let entry = AuditEntry::commented(id, actor.id, text, TimeStamp::now());
        self.store.append(&entry)?;

        info!(number = %current.number, "comment added");
        Ok(entry)
    }

    pub fn list_requests_visible_to(&self, actor: &Actor) -> Result<Vec<Request>, WorkflowError> {
        let visibility = Visibility::for_actor(actor);
        let mut requests = visibility.filter(self.store.scan()?, actor);
        requests.sort_by_key(|request| request.id);
        Ok(requests)
    }

    pub fn get_request(&self, id: RequestId, actor: &Actor) -> Result<Request, WorkflowError> {
        let request = self.store.load(id)?;
        if !permission::can_view_request(actor.role, request.status, actor.id, request.created_by)
        {
            return Err(WorkflowError::denied(
                actor.role,
                Action::View,
                request.status,
            ));
        }
        Ok(request)
    }

    /// Audit trail of a request, oldest first. Open to anyone who may comment on it.
    pub fn history(&self, id: RequestId, actor: &Actor) -> Result<AuditLog, WorkflowError> {
        let request = self.store.load(id)?;
        if !permission::can_comment(actor.role, request.status, actor.id, request.created_by) {
            return Err(WorkflowError::denied(
                actor.role,
                Action::View,
                request.status,
            ));
        }
        Ok(AuditLog::new(id, self.store.entries(id)?))
    }

    pub fn summary_for(&self, actor: &Actor) -> Result<RequestSummary, WorkflowError> {
        let requests = self.list_requests_visible_to(actor)?;
        Ok(RequestSummary::from_requests(&requests))
    }

    /// Close out an approved request once it has been fulfilled.
    #[instrument(skip_all, fields(request_id = id, admin = admin.user_id()), err(level = "warn"))]
    pub fn complete_request(
        &self,
        id: RequestId,
        admin: &AdminOverride,
    ) -> Result<Request, WorkflowError> {
        let current = self.store.load(id)?;
        let next = transition::complete(current.status)?;
        self.swap(current, next, admin.user_id())
    }

    /// Edit any request, terminal or not, outside the ordinary edit windows.
    #[instrument(skip_all, fields(request_id = id, admin = admin.user_id()), err(level = "warn"))]
    pub fn override_fields(
        &self,
        id: RequestId,
        patch: RequestPatch,
        admin: &AdminOverride,
    ) -> Result<Request, WorkflowError> {
        let current = self.store.load(id)?;
        patch.validate()?;

        let now = TimeStamp::now();
        let mut updated = current.next_revision(current.status, now);
        let changed = updated.apply(&patch);
        let entry = AuditEntry::updated(id, admin.user_id(), &changed, now);

        self.store
            .compare_and_set(Guard::of(&current), &updated, &entry)?;

        tracing::warn!(number = %updated.number, changed = ?changed, "administrative override applied");
        Ok(updated)
    }
}
