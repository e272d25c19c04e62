//! Listing filter derived from the permission table
use super::permission;
use super::request::Request;
use super::role::Actor;
use super::status::Status;

/// What a role may list: its own requests, or every request in a fixed set of statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Owned,
    Statuses(&'static [Status]),
}

impl Visibility {
    pub fn for_actor(actor: &Actor) -> Self {
        permission::can_view(actor.role)
    }

    pub fn admits(&self, request: &Request, actor: &Actor) -> bool {
        match self {
            Visibility::Owned => request.created_by == actor.id,
            Visibility::Statuses(statuses) => statuses.contains(&request.status),
        }
    }

    pub fn filter(&self, requests: Vec<Request>, actor: &Actor) -> Vec<Request> {
        requests
            .into_iter()
            .filter(|request| self.admits(request, actor))
            .collect()
    }

    /// Status set used to pre-filter a listing query. `None` means ownership decides instead.
    pub fn statuses(&self) -> Option<&'static [Status]> {
        match self {
            Visibility::Owned => None,
            Visibility::Statuses(statuses) => Some(*statuses),
        }
    }
}
