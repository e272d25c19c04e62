//! Property-based tests for the transition engine and the visibility filter
//!
//! The role and status vocabularies are small and closed, so these
//! properties range over every combination the strategies can produce and
//! check the engine against the tables it is built from.

use proptest::prelude::*;
use transport_approval::{
    Actor, ErrorKind, Role, Status,
    permission,
    request::{Request, RequestFields, RequestNumber, TimeStamp},
    transition,
    visibility::Visibility,
};

// PROPERTY TEST STRATEGIES

/// Strategy to generate any role
fn role_strategy() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

/// Strategy to generate any status, terminal ones included
fn status_strategy() -> impl Strategy<Value = Status> {
    prop::sample::select(Status::ALL.to_vec())
}

/// Strategy to generate a small population of requests with a handful of creators
fn requests_strategy() -> impl Strategy<Value = Vec<Request>> {
    prop::collection::vec((status_strategy(), 1u64..=4), 0..24).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (status, creator))| {
                let id = i as u64 + 1;
                let fields = RequestFields::new()
                    .set_origin("Omsk", None)
                    .set_destination("Tomsk", None)
                    .set_cargo_type("pipes")
                    .set_weight_kg(1_000);
                let mut request = Request::new(
                    id,
                    RequestNumber::new(2026, id as u32),
                    fields,
                    creator,
                    TimeStamp::now(),
                );
                request.status = status;
                request
            })
            .collect()
    })
}

/// Strategy to generate a sequence of approve/reject attempts by arbitrary roles
fn commands_strategy() -> impl Strategy<Value = Vec<(bool, Role)>> {
    prop::collection::vec((prop::bool::ANY, role_strategy()), 0..16)
}

fn position(status: Status) -> usize {
    Status::ALL
        .iter()
        .position(|s| *s == status)
        .unwrap_or(usize::MAX)
}

// PROPERTY TESTS
proptest! {
    /// Property: approve succeeds exactly when the role owns the edge out of the
    /// status or is the general director, and then lands on that edge's target
    #[test]
    fn approve_matches_edge_ownership(status in status_strategy(), role in role_strategy()) {
        let result = transition::approve(status, role);

        match transition::edge_from(status) {
            None => {
                prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidTransition);
            }
            Some(edge) if edge.owner == role || role == Role::GeneralDirector => {
                prop_assert_eq!(result.unwrap(), edge.to);
            }
            Some(_) => {
                prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::PermissionDenied);
            }
        }
    }

    /// Property: reject succeeds from any non-terminal status for manager tier
    /// and above, and never for anyone else
    #[test]
    fn reject_matches_seniority(status in status_strategy(), role in role_strategy()) {
        let result = transition::reject(status, role);

        if role < Role::Manager {
            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::PermissionDenied);
        } else if status.is_terminal() {
            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidTransition);
        } else {
            prop_assert_eq!(result.unwrap(), Status::Rejected);
        }
    }

    /// Property: no ordinary command moves a request out of a terminal status
    #[test]
    fn terminal_statuses_are_absorbing(status in status_strategy(), role in role_strategy()) {
        prop_assume!(status.is_terminal());

        prop_assert!(transition::approve(status, role).is_err());
        prop_assert!(transition::reject(status, role).is_err());
        prop_assert!(!permission::can_edit(role, status, 1, 1));
    }

    /// Property: a random run of approve/reject attempts only ever moves
    /// forward along the chain or exits to rejected, one step at a time
    #[test]
    fn command_runs_never_go_backwards(commands in commands_strategy()) {
        let mut status = Status::Created;

        for (approve, role) in commands {
            let result = if approve {
                transition::approve(status, role)
            } else {
                transition::reject(status, role)
            };
            let Ok(next) = result else {
                continue;
            };

            if next == Status::Rejected {
                prop_assert!(!status.is_terminal());
            } else {
                prop_assert_eq!(position(next), position(status) + 1);
            }
            status = next;
        }

        prop_assert_ne!(status, Status::Completed);
    }

    /// Property: a listing never includes a request the actor could not open
    /// on its own, and never drops one they could
    #[test]
    fn listing_agrees_with_view_permission(
        requests in requests_strategy(),
        role in role_strategy(),
        actor_id in 1u64..=4,
    ) {
        let actor = Actor::new(actor_id, role);
        let visible = Visibility::for_actor(&actor).filter(requests.clone(), &actor);

        for request in &requests {
            let allowed = permission::can_view_request(
                role,
                request.status,
                actor.id,
                request.created_by,
            );
            prop_assert_eq!(visible.iter().any(|r| r.id == request.id), allowed);
        }
        if role == Role::Foreman {
            prop_assert!(visible.iter().all(|r| r.created_by == actor.id));
        }
    }

    /// Property: anyone allowed to move a request may also comment on it
    #[test]
    fn movers_may_comment(status in status_strategy(), role in role_strategy()) {
        if permission::can_approve(role, status) {
            prop_assert!(permission::can_comment(role, status, 1, 2));
        }
        if permission::can_edit(role, status, 1, 1) {
            prop_assert!(permission::can_comment(role, status, 1, 1));
        }
    }
}
