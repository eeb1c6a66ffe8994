use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use crate::distributor::{Distributor, DistributorError, PermissionReport};
use crate::engine::PermissionEngine;
use crate::region::RegionLevel;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

impl From<DistributorError> for ApiError {
    fn from(err: DistributorError) -> Self {
        let status = match &err {
            DistributorError::DuplicateName(_) | DistributorError::ParentFixed(_) => StatusCode::CONFLICT,
            DistributorError::UnknownParent { .. } | DistributorError::UnknownDistributor(_) => StatusCode::NOT_FOUND,
            DistributorError::EmptyName => StatusCode::BAD_REQUEST,
        };
        api_error(status, err.to_string())
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn read_engine(state: &AppState) -> Result<RwLockReadGuard<'_, PermissionEngine>, ApiError> {
    state
        .engine
        .read()
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "engine state is poisoned"))
}

fn write_engine(state: &AppState) -> Result<RwLockWriteGuard<'_, PermissionEngine>, ApiError> {
    state
        .engine
        .write()
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "engine state is poisoned"))
}

// ─── GET /api/check ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CheckQuery {
    pub distributor: Option<String>,
    pub location: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct CheckResponse {
    pub distributor: String,
    pub location: String,
    pub allowed: bool,
    pub reason: serde_json::Value,
    pub explanation: String,
    pub evaluated_at: DateTime<Utc>,
}

pub async fn check(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CheckQuery>,
) -> Result<Json<CheckResponse>, ApiError> {
    let start = Instant::now();

    // Distributor names match verbatim; region codes are stored trimmed.
    let distributor = params.distributor.as_deref().unwrap_or("");
    let location = params.location.as_deref().unwrap_or("").trim();
    if distributor.trim().is_empty() || location.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Provide 'distributor' and 'location' parameters",
        ));
    }

    let decision = read_engine(&state)?.explain(distributor, location);

    tracing::info!(
        distributor,
        location,
        allowed = decision.allowed,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/check"
    );

    let reason = serde_json::to_value(&decision.reason)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(CheckResponse {
        distributor: distributor.to_string(),
        location: location.to_string(),
        allowed: decision.allowed,
        explanation: decision.reason.to_string(),
        reason,
        evaluated_at: Utc::now(),
    }))
}

// ─── GET /api/regions/{code} ─────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct RegionResponse {
    pub code: String,
    pub name: String,
    pub level: RegionLevel,
    pub parent: Option<String>,
    pub children: Vec<String>,
    /// The region itself up to its country.
    pub ancestors: Vec<String>,
}

pub async fn region(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<RegionResponse>, ApiError> {
    let engine = read_engine(&state)?;
    let catalog = engine.catalog();
    let region = catalog
        .lookup(&code)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Region not found: '{}'", code)))?;

    Ok(Json(RegionResponse {
        code: region.code.clone(),
        name: region.name.clone(),
        level: region.level,
        parent: region.parent.clone(),
        children: region.children.iter().cloned().collect(),
        ancestors: catalog.ancestors_of(&code).map(|r| r.code.clone()).collect(),
    }))
}

// ─── /api/distributors ───────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct DistributorSummary {
    pub name: String,
    pub parent: Option<String>,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl From<&Distributor> for DistributorSummary {
    fn from(d: &Distributor) -> Self {
        Self {
            name: d.name.clone(),
            parent: d.parent.clone(),
            includes: d.permissions.includes().iter().cloned().collect(),
            excludes: d.permissions.excludes().iter().cloned().collect(),
        }
    }
}

pub async fn list_distributors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DistributorSummary>>, ApiError> {
    let engine = read_engine(&state)?;
    Ok(Json(engine.registry().iter().map(DistributorSummary::from).collect()))
}

#[derive(Deserialize)]
pub struct AddDistributorRequest {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

pub async fn add_distributor(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddDistributorRequest>,
) -> Result<(StatusCode, Json<DistributorSummary>), ApiError> {
    let mut engine = write_engine(&state)?;
    engine.add_distributor(&req.name, req.parent.as_deref())?;

    let summary = engine
        .registry()
        .get(&req.name)
        .map(DistributorSummary::from)
        .ok_or_else(|| api_error(StatusCode::INTERNAL_SERVER_ERROR, "distributor vanished after insert"))?;
    tracing::info!(name = %summary.name, parent = ?summary.parent, "POST /api/distributors");
    Ok((StatusCode::CREATED, Json(summary)))
}

#[derive(Deserialize)]
pub struct PermissionsRequest {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

pub async fn set_permissions(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<PermissionsRequest>,
) -> Result<Json<PermissionReport>, ApiError> {
    let report = write_engine(&state)?.set_permissions(&name, &req.include, &req.exclude)?;
    tracing::info!(
        name = %name,
        included = report.included.len(),
        excluded = report.excluded.len(),
        skipped = report.skipped.len(),
        "POST /api/distributors/permissions"
    );
    Ok(Json(report))
}
