//! API Handlers
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use sill_catalog::{CatalogQuery, FacetSidebars, Record, RecordList, SortId};
use sill_core::{Environment, Prerogative, SillError, SILL_VERSION};

use crate::AppState;

// =============================================================================
// Errors
// =============================================================================

/// Error rendered as `{"error": ...}` with a status matching its kind
#[derive(Debug)]
pub struct ApiFailure(pub SillError);

impl From<SillError> for ApiFailure {
    fn from(e: SillError) -> Self {
        Self(e)
    }
}

impl ApiFailure {
    fn bad_param(field: &'static str, message: String) -> Self {
        Self(SillError::validation(field, message))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SillError::Precondition(_) => StatusCode::SERVICE_UNAVAILABLE,
            SillError::NotFound { .. } => StatusCode::NOT_FOUND,
            SillError::Validation { .. } => StatusCode::BAD_REQUEST,
            SillError::Api(_) => StatusCode::BAD_GATEWAY,
            SillError::Config(_) | SillError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

// =============================================================================
// Query parameters
// =============================================================================

/// Build a catalog query from `search`, `sort`, `organization`, `category`,
/// `environment` and any number of `prerogative` parameters
pub fn parse_catalog_query(params: &[(String, String)]) -> Result<CatalogQuery, ApiFailure> {
    let mut query = CatalogQuery::new();
    for (key, value) in params {
        match key.as_str() {
            "search" => query.search = value.clone(),
            "sort" => {
                let sort: SortId = value
                    .parse()
                    .map_err(|e: String| ApiFailure::bad_param("sort", e))?;
                query.sort = Some(sort);
            }
            "organization" => query.organization = Some(value.clone()),
            "category" => query.category = Some(value.clone()),
            "environment" => {
                let environment: Environment = value
                    .parse()
                    .map_err(|e: String| ApiFailure::bad_param("environment", e))?;
                query.environment = Some(environment);
            }
            "prerogative" => {
                let prerogative: Prerogative = value
                    .parse()
                    .map_err(|e: String| ApiFailure::bad_param("prerogative", e))?;
                query.prerogatives.insert(prerogative);
            }
            other => {
                return Err(ApiFailure::bad_param(
                    "query",
                    format!("unknown parameter '{}'", other),
                ))
            }
        }
    }
    Ok(query)
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareList {
    pub count: usize,
    pub softwares: RecordList,
}

pub async fn list_softwares(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<SoftwareList>, ApiFailure> {
    let query = parse_catalog_query(&params)?;
    let softwares = state.store.query_softwares(&query)?;
    state.metrics.record_query("softwares");
    debug!(count = softwares.len(), "softwares listed");
    Ok(Json(SoftwareList {
        count: softwares.len(),
        softwares,
    }))
}

pub async fn facets(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<FacetSidebars>, ApiFailure> {
    let query = parse_catalog_query(&params)?;
    let sidebars = state.store.query_facets(&query)?;
    state.metrics.record_query("facets");
    Ok(Json(sidebars))
}

/// `Last-Modified` value of a record, in IMF-fixdate form
fn last_modified(record: &Record) -> Option<HeaderValue> {
    let updated_at = record.updated_at()?;
    HeaderValue::from_str(&updated_at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()).ok()
}

pub async fn get_software(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiFailure> {
    match state.store.find_software(&name) {
        Ok(record) => {
            let modified = last_modified(&record);
            let mut response = Json(record).into_response();
            if let Some(modified) = modified {
                response.headers_mut().insert(header::LAST_MODIFIED, modified);
            }
            Ok(response)
        }
        Err(e) => {
            if matches!(e, SillError::NotFound { .. }) {
                state.metrics.software_not_found.inc();
            }
            Err(e.into())
        }
    }
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let catalog = state.store.state();
    let status = if state.store.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ok" } else { "starting" },
            "version": SILL_VERSION,
            "catalog": catalog.description(),
        })),
    )
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => ApiFailure(SillError::Serialize(e.to_string())).into_response(),
    }
}
