//! Case research routes.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tariffscope_core::Error;
use tariffscope_pipeline::{CaseFinderOutput, PipelineParams};
use tracing::error;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/research/cases", get(get_cases).post(post_cases))
}

#[derive(Debug, Deserialize)]
struct CasesQuery {
    hts: Option<String>,
    year: Option<String>,
    refresh: Option<bool>,
    diagnostics: Option<bool>,
}

/// POST body: same primary inputs plus the full set of tuning knobs.
#[derive(Debug, Deserialize)]
struct CasesRequest {
    hts: Option<String>,
    year: Option<String>,
    #[serde(default)]
    refresh: bool,
    #[serde(flatten)]
    params: PipelineParams,
}

/// GET /api/research/cases — run the pipeline with default tuning.
async fn get_cases(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CasesQuery>,
) -> impl IntoResponse {
    let params = PipelineParams {
        diagnostics: query.diagnostics.unwrap_or(false),
        ..Default::default()
    };
    run_request(
        &state,
        query.hts,
        query.year,
        query.refresh.unwrap_or(false),
        params,
    )
    .await
}

/// POST /api/research/cases — run the pipeline with caller tuning.
async fn post_cases(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CasesRequest>,
) -> impl IntoResponse {
    run_request(
        &state,
        request.hts,
        request.year,
        request.refresh,
        request.params,
    )
    .await
}

async fn run_request(
    state: &AppState,
    hts: Option<String>,
    year: Option<String>,
    refresh: bool,
    params: PipelineParams,
) -> (StatusCode, Json<Value>) {
    let (hts, year) = match require_inputs(hts, year) {
        Ok(pair) => pair,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            );
        }
    };

    if refresh {
        state
            .cache
            .delete(&crate::state::HttpCaseFinder::cache_key(&hts, &year));
    }

    match state
        .finder
        .run_cached(&state.cache, &hts, &year, &params)
        .await
    {
        Ok((output, cached)) => (StatusCode::OK, Json(response_body(&output, cached))),
        Err(Error::InvalidInput(message)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": message })),
        ),
        Err(err) => {
            error!("Case research failed for hts={} year={}: {}", hts, year, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "internal server error" })),
            )
        }
    }
}

fn require_inputs(
    hts: Option<String>,
    year: Option<String>,
) -> std::result::Result<(String, String), &'static str> {
    let hts = hts.filter(|v| !v.trim().is_empty());
    let year = year.filter(|v| !v.trim().is_empty());
    match (hts, year) {
        (Some(hts), Some(year)) => Ok((hts, year)),
        (None, _) => Err("hts query parameter is required"),
        (_, None) => Err("year query parameter is required"),
    }
}

/// Output payload with the cache marker attached at the top level.
fn response_body(output: &CaseFinderOutput, cached: bool) -> Value {
    match serde_json::to_value(output) {
        Ok(Value::Object(mut map)) => {
            map.insert("cached".to_string(), Value::Bool(cached));
            Value::Object(map)
        }
        _ => serde_json::json!({ "cached": cached }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_inputs_rejects_missing_or_blank() {
        assert!(require_inputs(None, Some("2024".into())).is_err());
        assert!(require_inputs(Some("7318.15".into()), None).is_err());
        assert!(require_inputs(Some("  ".into()), Some("2024".into())).is_err());
        let (hts, year) =
            require_inputs(Some("7318.15".into()), Some("2024".into())).unwrap();
        assert_eq!(hts, "7318.15");
        assert_eq!(year, "2024");
    }

    #[test]
    fn test_response_body_carries_cache_marker() {
        let output = CaseFinderOutput {
            entities: Vec::new(),
            source_cases: Vec::new(),
            trace: None,
        };
        let body = response_body(&output, true);
        assert_eq!(body["cached"], true);
        assert!(body["entities"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_post_body_tolerates_partial_tuning() {
        let request: CasesRequest = serde_json::from_value(serde_json::json!({
            "hts": "7318.15",
            "year": "2024",
            "fetch_cap": 10
        }))
        .unwrap();
        assert_eq!(request.params.fetch_cap, 10);
        assert!(!request.refresh);
    }
}
