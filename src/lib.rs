//! Approval workflow for transportation requests.
//!
//! A request moves `created → logistics → manager → finance → approved`, one
//! role tier per edge, and may be rejected by a senior tier at any
//! non-terminal point. [`service::TransportService`] is the command entry
//! point; everything it decides is delegated to [`permission`] and
//! [`transition`].

pub mod audit;
pub mod config;
pub mod error;
pub mod permission;
pub mod request;
pub mod role;
pub mod service;
pub mod status;
pub mod store;
pub mod summary;
pub mod telemetry;
pub mod transition;
pub mod visibility;

pub use error::{ErrorKind, WorkflowError};
pub use role::{Actor, Role};
pub use service::TransportService;
pub use status::Status;
