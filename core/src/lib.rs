//! Synchronous API client core for the todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and keeps the client's view
//! state in a single [`TodoState`] driven by named actions.
//!
//! # Design
//! - `TodoClient` is stateless and holds only `base_url`.
//! - Each CRUD operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - `TodoState` returns `Dispatch` values for the host to execute and
//!   applies their outcomes in `settle`.
//! - DTOs are defined independently from the server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod state;
pub mod types;

pub use client::TodoClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use state::{Dispatch, Draft, Operation, TodoState};
pub use types::{CreateTodo, Todo, UpdateTodo};
