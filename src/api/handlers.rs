//! HTTP request handlers for the payroll engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::compute_payroll_with_audit;
use crate::error::EngineResult;
use crate::models::PayrollCalculation;

use super::request::{InForceQuery, PreviewRequest, RevertRequest, UpdateRulesRequest};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/organizations/:org/rules", put(update_rules_handler))
        .route("/organizations/:org/rules/current", get(current_rules_handler))
        .route("/organizations/:org/rules/history", get(history_handler))
        .route(
            "/organizations/:org/rules/versions/:version",
            get(version_handler),
        )
        .route("/organizations/:org/rules/in-force", get(in_force_handler))
        .route("/organizations/:org/rules/revert", post(revert_handler))
        .route("/organizations/:org/payroll/preview", post(preview_handler))
        .with_state(state)
}

/// Handler for GET /organizations/:org/rules/current.
async fn current_rules_handler(
    State(state): State<AppState>,
    Path(org): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, organization_id = %org, "Fetching current rules");

    respond(correlation_id, state.rules().get_current(&org).await)
}

/// Handler for GET /organizations/:org/rules/history.
async fn history_handler(State(state): State<AppState>, Path(org): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, organization_id = %org, "Fetching rule history");

    respond(correlation_id, state.rules().get_history(&org).await)
}

/// Handler for GET /organizations/:org/rules/versions/:version.
async fn version_handler(
    State(state): State<AppState>,
    Path((org, version)): Path<(String, u32)>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        organization_id = %org,
        version,
        "Fetching rule version"
    );

    respond(correlation_id, state.rules().get_version(&org, version).await)
}

/// Handler for GET /organizations/:org/rules/in-force?at=...
///
/// Returns the version that applied at the given instant, so a historical
/// pay period can be recomputed with the rules of its time.
async fn in_force_handler(
    State(state): State<AppState>,
    Path(org): Path<String>,
    query: Result<Query<InForceQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            let body_text = rejection.body_text();
            warn!(correlation_id = %correlation_id, error = %body_text, "Invalid query string");
            return ApiErrorResponse::bad_request(ApiError::validation_error(body_text))
                .into_response();
        }
    };

    info!(
        correlation_id = %correlation_id,
        organization_id = %org,
        at = %query.at,
        "Looking up rules in force"
    );

    respond(
        correlation_id,
        state.rules().rules_in_force_at(&org, query.at).await,
    )
}

/// Handler for PUT /organizations/:org/rules.
///
/// Commits the delta as a new version. When `expected_version` is given and
/// another edit has landed since, the response is 409 and nothing is written.
async fn update_rules_handler(
    State(state): State<AppState>,
    Path(org): Path<String>,
    payload: Result<Json<UpdateRulesRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, organization_id = %org, "Processing rule update");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return json_rejection(correlation_id, rejection),
    };

    let store = state.rules();
    let result = match request.expected_version {
        Some(expected_version) => {
            store
                .update_from(&org, expected_version, &request.editor, &request.delta)
                .await
        }
        None => store.update(&org, &request.editor, &request.delta).await,
    };

    respond(correlation_id, result)
}

/// Handler for POST /organizations/:org/rules/revert.
async fn revert_handler(
    State(state): State<AppState>,
    Path(org): Path<String>,
    payload: Result<Json<RevertRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, organization_id = %org, "Processing rule revert");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return json_rejection(correlation_id, rejection),
    };

    respond(
        correlation_id,
        state
            .rules()
            .revert_to_defaults(&org, &request.editor)
            .await,
    )
}

/// Handler for POST /organizations/:org/payroll/preview.
///
/// Computes a payroll calculation against a stored version with an optional
/// unsaved delta merged in. The delta is validated but never persisted.
async fn preview_handler(
    State(state): State<AppState>,
    Path(org): Path<String>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, organization_id = %org, "Processing payroll preview");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return json_rejection(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let result = perform_preview(&state, &org, &request).await;

    if let Ok(calculation) = &result {
        info!(
            correlation_id = %correlation_id,
            organization_id = %org,
            rule_set_version = calculation.breakdown.rule_set_version,
            gross_pay = %calculation.breakdown.gross_pay,
            net_pay = %calculation.breakdown.net_pay,
            duration_us = start_time.elapsed().as_micros(),
            "Preview completed successfully"
        );
    }

    respond(correlation_id, result)
}

async fn perform_preview(
    state: &AppState,
    org: &str,
    request: &PreviewRequest,
) -> EngineResult<PayrollCalculation> {
    let store = state.rules();
    let base = match request.rule_set_version {
        Some(version) => store.get_version(org, version).await?,
        None => store.get_current(org).await?,
    };

    let rules = match &request.delta {
        Some(delta) => base.with_parameters(base.parameters.merged(delta)),
        None => base,
    };

    let policy = request.taxable_pay_policy.unwrap_or_default();
    compute_payroll_with_audit(request.gross_pay, &rules, &policy)
}

/// Serializes a successful result as 200 JSON, or maps the error.
fn respond<T: Serialize>(correlation_id: Uuid, result: EngineResult<T>) -> Response {
    match result {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            Json(body),
        )
            .into_response(),
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Request failed"
            );
            ApiErrorResponse::from(err).into_response()
        }
    }
}

fn json_rejection(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // serde's message names the offending field
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            ApiError::validation_error(body_text)
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };

    ApiErrorResponse::bad_request(error).into_response()
}
