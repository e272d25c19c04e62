//! Smoke Screen Unit tests for transport approval components
//!
//! Unit tests that span the codebase through its public surface, one module
//! at a time and mostly on the happy path. End-to-end workflows live in
//! `scenarios.rs`.

use chrono::{Datelike, Utc};
use transport_approval::{
    Actor, ErrorKind, Role, Status, WorkflowError,
    audit::{AuditAction, AuditEntry, AuditLog},
    config::{AppConfig, LogFormat},
    permission::{self, Action},
    request::{Request, RequestFields, RequestNumber, RequestPatch, TimeStamp},
    summary::RequestSummary,
    transition,
    visibility::Visibility,
};

fn draft() -> RequestFields {
    RequestFields::new()
        .set_origin("Perm", None)
        .set_destination("Ufa", Some("Industrial zone, gate 2"))
        .set_cargo_type("cement")
        .set_weight_kg(24_000)
}

fn request_at(id: u64, status: Status, created_by: u64) -> Request {
    let mut request = Request::new(
        id,
        RequestNumber::new(2026, id as u32),
        draft(),
        created_by,
        TimeStamp::now(),
    );
    request.status = status;
    request
}

// ROLE MODULE TESTS
#[cfg(test)]
mod role_tests {
    use super::*;

    /// Test that actors are built from the raw role strings the auth layer hands in
    #[test]
    fn actor_parses_known_roles() {
        let actor = Actor::parse(5, "Logistics").unwrap();
        assert_eq!(actor, Actor::new(5, Role::Logistics));

        let director = Actor::parse(6, "general_director").unwrap();
        assert!(director.role.is_universal_approver());
    }

    /// Test that an unknown role never turns into a usable actor
    #[test]
    fn actor_rejects_unknown_roles() {
        for raw in ["admin", "", "director"] {
            let err = Actor::parse(1, raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }
}

// STATUS MODULE TESTS
#[cfg(test)]
mod status_tests {
    use super::*;

    /// Test that status names match their stored lowercase form
    #[test]
    fn status_names_parse_back() {
        for status in Status::ALL {
            assert_eq!(status.to_string().parse::<Status>().unwrap(), status);
        }
        assert!("pending".parse::<Status>().is_err());
    }

    /// Test which statuses end the ordinary workflow
    #[test]
    fn terminal_statuses() {
        let terminal: Vec<_> = Status::ALL.into_iter().filter(Status::is_terminal).collect();
        assert_eq!(
            terminal,
            vec![Status::Approved, Status::Rejected, Status::Completed]
        );
    }
}

// PERMISSION MODULE TESTS
#[cfg(test)]
mod permission_tests {
    use super::*;

    /// Test that each forward edge has exactly one owning tier besides the director
    #[test]
    fn each_edge_has_one_owner() {
        for status in [Status::Created, Status::Logistics, Status::Manager, Status::Finance] {
            let approvers: Vec<_> = Role::ALL
                .into_iter()
                .filter(|role| permission::can_approve(*role, status))
                .collect();
            assert_eq!(approvers.len(), 2, "{status}");
            assert!(approvers.contains(&Role::GeneralDirector));
        }
    }

    /// Test that only the manager tier and above may reject
    #[test]
    fn reject_needs_manager_or_above() {
        assert!(!permission::can_reject(Role::Foreman));
        assert!(!permission::can_reject(Role::Logistics));
        assert!(permission::can_reject(Role::Manager));
        assert!(permission::can_reject(Role::Finance));
        assert!(permission::can_reject(Role::GeneralDirector));
    }

    /// Test that edit windows close once a request is terminal
    #[test]
    fn nobody_edits_terminal_requests() {
        for role in Role::ALL {
            for status in [Status::Approved, Status::Rejected, Status::Completed] {
                assert!(!permission::can_edit(role, status, 1, 1));
            }
        }
    }

    /// Test that a foreman's edit window only covers their own drafts
    #[test]
    fn foreman_edits_own_drafts() {
        assert!(permission::can_edit(Role::Foreman, Status::Created, 3, 3));
        assert!(!permission::can_edit(Role::Foreman, Status::Created, 4, 3));
        assert!(!permission::can_edit(Role::Foreman, Status::Logistics, 3, 3));
    }

    /// Test that action verbs read well inside error messages
    #[test]
    fn action_display() {
        assert_eq!(Action::Approve.to_string(), "approve");
        assert_eq!(Action::Comment.to_string(), "comment on");
    }
}

// TRANSITION MODULE TESTS
#[cfg(test)]
mod transition_tests {
    use super::*;

    /// Test that the chain runs created to approved in four edges
    #[test]
    fn chain_is_linear() {
        let mut status = Status::Created;
        let mut visited = vec![status];
        while let Some(next) = transition::successor(status) {
            visited.push(next);
            status = next;
        }
        assert_eq!(transition::edges().len(), 4);
        assert_eq!(visited.last(), Some(&Status::Approved));
    }

    /// Test that completion only follows approval
    #[test]
    fn complete_requires_approved() {
        assert_eq!(
            transition::complete(Status::Approved).unwrap(),
            Status::Completed
        );
        let err = transition::complete(Status::Finance).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }
}

// VISIBILITY MODULE TESTS
#[cfg(test)]
mod visibility_tests {
    use super::*;

    /// Test that a foreman only ever sees requests they created
    #[test]
    fn foreman_sees_own_requests() {
        let foreman = Actor::new(1, Role::Foreman);
        let requests = vec![
            request_at(1, Status::Created, 1),
            request_at(2, Status::Created, 2),
            request_at(3, Status::Rejected, 1),
        ];
        let visible = Visibility::for_actor(&foreman).filter(requests, &foreman);
        let ids: Vec<_> = visible.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    /// Test that the manager tier starts at the manager status
    #[test]
    fn manager_visibility_starts_at_manager() {
        let manager = Actor::new(9, Role::Manager);
        let visibility = Visibility::for_actor(&manager);
        assert!(!visibility.admits(&request_at(1, Status::Logistics, 1), &manager));
        assert!(visibility.admits(&request_at(2, Status::Finance, 1), &manager));
        assert!(!visibility.statuses().unwrap().contains(&Status::Rejected));
    }
}

// REQUEST MODULE TESTS
#[cfg(test)]
mod request_tests {
    use super::*;

    /// Test that TimeStamp::now() is close to the current time
    #[test]
    fn timestamp_now_is_current() {
        let diff = (Utc::now() - TimeStamp::now().to_datetime_utc())
            .num_seconds()
            .abs();
        assert!(diff < 1);
    }

    /// Test that TimeStamp can be created with specific date/time values
    #[test]
    fn timestamp_new_with_specific_values() {
        let ts = TimeStamp::new_with(2026, 3, 14, 9, 30, 0).unwrap();
        assert_eq!(ts.year(), 2026);
        assert_eq!(ts.to_datetime_utc().month(), 3);
        assert!(TimeStamp::new_with(2026, 2, 30, 0, 0, 0).is_none());
    }

    /// Test that a complete draft validates
    #[test]
    fn complete_draft_is_valid() {
        assert!(draft().validate().is_ok());
    }

    /// Test that blank optional text is refused while absent text is fine
    #[test]
    fn blank_optional_field_is_invalid() {
        let err = draft().set_dimensions("  ").validate().unwrap_err();
        let WorkflowError::Validation(problems) = err else {
            panic!("expected a validation error");
        };
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].field, "dimensions");
    }

    /// Test that request numbers are read back from their printed form
    #[test]
    fn request_number_parses() {
        let number: RequestNumber = "TR-2026-007".parse().unwrap();
        assert_eq!(number, RequestNumber::new(2026, 7));
        assert!("TR-2026".parse::<RequestNumber>().is_err());
        assert!("TR-twenty-001".parse::<RequestNumber>().is_err());
    }

    /// Test that a patch carrying only logistics fields leaves the route alone
    #[test]
    fn logistics_patch_keeps_route() {
        let mut request = request_at(1, Status::Logistics, 1);
        let changed = request.apply(&RequestPatch::new().set_carrier("Kama Trans"));
        assert_eq!(changed, vec!["carrier"]);
        assert_eq!(request.fields, draft());
    }
}

// AUDIT MODULE TESTS
#[cfg(test)]
mod audit_tests {
    use super::*;

    /// Test that transitions are classified by where they land
    #[test]
    fn transition_entries_are_classified() {
        let now = TimeStamp::now();
        let approved = AuditEntry::transition(1, 2, Status::Created, Status::Logistics, now);
        let rejected = AuditEntry::transition(1, 2, Status::Manager, Status::Rejected, now);

        assert_eq!(approved.action, AuditAction::Approved);
        assert_eq!(approved.comment, "created -> logistics");
        assert_eq!(rejected.action, AuditAction::Rejected);
    }

    /// Test that entry ids are unique and sort after one another
    #[test]
    fn entry_ids_are_unique() {
        let now = TimeStamp::now();
        let first = AuditEntry::created(1, 2, now);
        let second = AuditEntry::commented(1, 2, "ok", now);
        assert_ne!(first.id, second.id);
        assert!(first.storage_key() < second.storage_key());
    }

    /// Test the log accessors
    #[test]
    fn log_reports_last_entry() {
        let now = TimeStamp::now();
        let log = AuditLog::new(
            1,
            vec![
                AuditEntry::created(1, 2, now),
                AuditEntry::updated(1, 3, &["carrier"], now),
            ],
        );
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().map(|e| e.action), Some(AuditAction::Updated));
        assert_eq!(log.last().map(|e| e.comment.as_str()), Some("changed carrier"));
    }
}

// SUMMARY MODULE TESTS
#[cfg(test)]
mod summary_tests {
    use super::*;

    /// Test that the summary of nothing is all zeros
    #[test]
    fn empty_summary() {
        let summary = RequestSummary::from_requests(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.approved, 0);
        assert_eq!(summary.approved_cost_average, None);
        assert_eq!(summary.count(Status::Created), 0);
    }
}

// CONFIG MODULE TESTS
#[cfg(test)]
mod config_tests {
    use super::*;

    /// Test that an empty file yields the defaults
    #[test]
    fn empty_file_is_default() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    /// Test that a misspelt format is an error rather than a silent default
    #[test]
    fn unknown_format_in_file_fails() {
        assert!(AppConfig::from_toml("[logging]\nformat = \"yaml\"\n").is_err());
    }
}
