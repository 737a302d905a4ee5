//! HTTP API module for the statutory payroll engine.
//!
//! This module provides the REST endpoints used by the rule-administration
//! screen: reading and editing an organization's rule sets, and previewing
//! a payroll calculation against stored or unsaved rules.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{InForceQuery, PreviewRequest, RevertRequest, UpdateRulesRequest};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
