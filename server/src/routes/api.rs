use std::fmt::Write as _;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Deserialize;

use crate::catalog::ListQuery;
use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const LIST_CACHE_CONTROL: &str = "public, max-age=60";

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub include_layers: Option<bool>,
    #[serde(default)]
    pub include_datasets: Option<bool>,
}

impl ListParams {
    fn list_query(&self) -> ListQuery {
        ListQuery {
            offset: self.offset.unwrap_or(0),
            limit: self.limit,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

pub async fn list_categories(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response {
    state.observability.record_categories_request();
    let query = params.list_query();

    // Hot path: the full listing is serialized once at seed time.
    if query.is_default() {
        let (json, etag) = state.catalog.categories_payload();
        if if_none_match_matches(&headers, etag) {
            state.observability.record_not_modified();
            return not_modified_response(LIST_CACHE_CONTROL, etag);
        }
        return json_bytes_response((*json).clone(), LIST_CACHE_CONTROL, Some(etag));
    }

    Json(state.catalog.list_categories(&query)).into_response()
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Response {
    state.observability.record_categories_request();
    match state.catalog.category(
        id,
        params.include_datasets.unwrap_or(false),
        params.include_layers.unwrap_or(false),
    ) {
        Some(category) => Json(category).into_response(),
        None => not_found("Category not found"),
    }
}

pub async fn list_datasets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response {
    state.observability.record_datasets_request();
    let query = params.list_query();
    let include_layers = params.include_layers.unwrap_or(false);

    if query.is_default() && include_layers {
        let (json, etag) = state.catalog.datasets_payload();
        if if_none_match_matches(&headers, etag) {
            state.observability.record_not_modified();
            return not_modified_response(LIST_CACHE_CONTROL, etag);
        }
        return json_bytes_response((*json).clone(), LIST_CACHE_CONTROL, Some(etag));
    }

    Json(state.catalog.list_datasets(&query, include_layers)).into_response()
}

pub async fn get_dataset(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Response {
    state.observability.record_datasets_request();
    match state
        .catalog
        .dataset(id, params.include_layers.unwrap_or(false))
    {
        Some(dataset) => Json(dataset).into_response(),
        None => not_found("Dataset not found"),
    }
}

pub async fn list_layers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    state.observability.record_layers_request();
    Json(state.catalog.list_layers(&params.list_query())).into_response()
}

pub async fn get_layer(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    state.observability.record_layers_request();
    match state.catalog.layer(id) {
        Some(layer) => Json(layer).into_response(),
        None => not_found("Layer not found"),
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus_metrics(
        state.catalog.category_count(),
        state.catalog.dataset_count(),
        state.catalog.layer_count(),
        state.observability.snapshot(),
    );

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn not_found(detail: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "detail": detail })),
    )
        .into_response()
}

fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(',').any(|candidate| candidate.trim() == etag))
        .unwrap_or(false)
}

fn not_modified_response(cache_control: &'static str, etag: &str) -> Response {
    let mut response = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(header::CACHE_CONTROL, cache_control);
    if let Ok(value) = HeaderValue::from_str(etag) {
        response = response.header(header::ETAG, value);
    }
    response.body(Body::empty()).unwrap_or_else(|_| {
        // Builder only fails on invalid header values, which are static here.
        StatusCode::NOT_MODIFIED.into_response()
    })
}

fn json_bytes_response(body: Bytes, cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CACHE_CONTROL, cache_control);
    if let Some(etag) = etag
        && let Ok(value) = HeaderValue::from_str(etag)
    {
        response = response.header(header::ETAG, value);
    }
    response
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn render_prometheus_metrics(
    categories: usize,
    datasets: usize,
    layers: usize,
    observability: ObservabilitySnapshot,
) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "# HELP boreal_catalog_categories Number of categories in the catalog."
    );
    let _ = writeln!(body, "# TYPE boreal_catalog_categories gauge");
    let _ = writeln!(body, "boreal_catalog_categories {categories}");

    let _ = writeln!(
        body,
        "# HELP boreal_catalog_datasets Number of datasets in the catalog."
    );
    let _ = writeln!(body, "# TYPE boreal_catalog_datasets gauge");
    let _ = writeln!(body, "boreal_catalog_datasets {datasets}");

    let _ = writeln!(
        body,
        "# HELP boreal_catalog_layers Number of layers in the catalog."
    );
    let _ = writeln!(body, "# TYPE boreal_catalog_layers gauge");
    let _ = writeln!(body, "boreal_catalog_layers {layers}");

    let _ = writeln!(
        body,
        "# HELP boreal_categories_requests_total Total category API requests."
    );
    let _ = writeln!(body, "# TYPE boreal_categories_requests_total counter");
    let _ = writeln!(
        body,
        "boreal_categories_requests_total {}",
        observability.categories_requests_total
    );

    let _ = writeln!(
        body,
        "# HELP boreal_datasets_requests_total Total dataset API requests."
    );
    let _ = writeln!(body, "# TYPE boreal_datasets_requests_total counter");
    let _ = writeln!(
        body,
        "boreal_datasets_requests_total {}",
        observability.datasets_requests_total
    );

    let _ = writeln!(
        body,
        "# HELP boreal_layers_requests_total Total layer API requests."
    );
    let _ = writeln!(body, "# TYPE boreal_layers_requests_total counter");
    let _ = writeln!(
        body,
        "boreal_layers_requests_total {}",
        observability.layers_requests_total
    );

    let _ = writeln!(
        body,
        "# HELP boreal_health_requests_total Total health-check requests."
    );
    let _ = writeln!(body, "# TYPE boreal_health_requests_total counter");
    let _ = writeln!(
        body,
        "boreal_health_requests_total {}",
        observability.health_requests_total
    );

    let _ = writeln!(
        body,
        "# HELP boreal_not_modified_responses_total Total 304 responses served from ETag matches."
    );
    let _ = writeln!(body, "# TYPE boreal_not_modified_responses_total counter");
    let _ = writeln!(
        body,
        "boreal_not_modified_responses_total {}",
        observability.not_modified_responses_total
    );

    let _ = writeln!(
        body,
        "# HELP boreal_upstream_health_failures_total Total failed upstream health probes."
    );
    let _ = writeln!(body, "# TYPE boreal_upstream_health_failures_total counter");
    let _ = writeln!(
        body,
        "boreal_upstream_health_failures_total {}",
        observability.upstream_health_failures_total
    );

    body
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::{Request, StatusCode, header};
    use tower::util::ServiceExt;

    use boreal_shared::{ApiResponse, Category, Dataset, Layer};

    use crate::app::build_app;
    use crate::catalog::CatalogStore;
    use crate::state::AppState;

    fn test_app() -> axum::Router {
        let catalog = CatalogStore::embedded().expect("embedded seed must load");
        build_app(AppState::new(catalog))
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
        let response = app
            .oneshot(Request::get(uri).body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec(), headers)
    }

    #[tokio::test]
    async fn categories_listing_returns_envelope_with_etag() {
        let (status, body, headers) = get(test_app(), "/api/categories").await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.contains_key(header::ETAG));

        let parsed: ApiResponse<Category> = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.total, parsed.data.len());
        assert!(parsed.total >= 3);
    }

    #[tokio::test]
    async fn matching_if_none_match_yields_304() {
        let (_, _, headers) = get(test_app(), "/api/categories").await;
        let etag = headers.get(header::ETAG).unwrap().to_str().unwrap();

        let app = test_app();
        let response = app
            .oneshot(
                Request::get("/api/categories")
                    .header(header::IF_NONE_MATCH, etag)
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn datasets_include_layers_nests_children() {
        let (status, body, _) = get(test_app(), "/api/datasets?include_layers=true").await;
        assert_eq!(status, StatusCode::OK);
        let parsed: ApiResponse<Dataset> = serde_json::from_slice(&body).unwrap();
        assert!(!parsed.data.is_empty());
        assert!(parsed.data.iter().all(|d| d.layers.is_some()));
    }

    #[tokio::test]
    async fn datasets_without_flag_omit_layers() {
        let (_, body, _) = get(test_app(), "/api/datasets").await;
        let parsed: ApiResponse<Dataset> = serde_json::from_slice(&body).unwrap();
        assert!(parsed.data.iter().all(|d| d.layers.is_none()));
    }

    #[tokio::test]
    async fn pagination_and_search_narrow_the_page() {
        let (_, body, _) = get(test_app(), "/api/datasets?limit=2&offset=1").await;
        let parsed: ApiResponse<Dataset> = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert!(parsed.total > 2);

        let (_, body, _) = get(test_app(), "/api/datasets?search=wildfire").await;
        let parsed: ApiResponse<Dataset> = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.total, 1);
    }

    #[tokio::test]
    async fn layers_listing_returns_envelope() {
        let (status, body, _) = get(test_app(), "/api/layers").await;
        assert_eq!(status, StatusCode::OK);
        let parsed: ApiResponse<Layer> = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.total, parsed.data.len());
        assert!(parsed.total >= 5);

        let (_, body, _) = get(test_app(), "/api/layers?limit=2&offset=1").await;
        let parsed: ApiResponse<Layer> = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert!(parsed.total > 2);
    }

    #[tokio::test]
    async fn layer_item_resolves_and_unknown_is_a_404() {
        let (status, body, _) = get(test_app(), "/api/layers/1").await;
        assert_eq!(status, StatusCode::OK);
        let parsed: Layer = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.id, 1);

        let (status, body, _) = get(test_app(), "/api/layers/999999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["detail"], "Layer not found");
    }

    #[tokio::test]
    async fn unknown_dataset_is_a_404_with_detail() {
        let (status, body, _) = get(test_app(), "/api/datasets/999999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["detail"], "Dataset not found");
    }

    #[tokio::test]
    async fn metrics_exposes_catalog_gauges() {
        let (status, body, _) = get(test_app(), "/api/metrics").await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("boreal_catalog_categories"));
        assert!(text.contains("boreal_catalog_layers"));
    }
}
