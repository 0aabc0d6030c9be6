use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::warn;

use boreal_shared::{HealthReport, ServiceHealth, ServiceStatus};

use crate::state::AppState;

/// Shape of an upstream API's own health payload; fields it does not report
/// fall back rather than failing the whole probe.
#[derive(Debug, Default, Deserialize)]
struct UpstreamHealth {
    #[serde(default)]
    services: UpstreamServices,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamServices {
    #[serde(default)]
    api: Option<ServiceStatus>,
    #[serde(default)]
    database: Option<ServiceStatus>,
}

/// Aggregated health: this process (client host), the catalog API, and its
/// backing store. 503 whenever any component is unhealthy.
pub async fn health(State(state): State<AppState>) -> Response {
    state.observability.record_health_request();

    let services = match state.upstream_api.clone() {
        Some(base) => probe_upstream(&state, &base).await,
        None => local_services(&state),
    };

    let report = HealthReport::aggregate(services);
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}

fn local_services(state: &AppState) -> ServiceHealth {
    // The catalog is seeded at startup; an empty one means the seed failed
    // in a way that should surface here rather than as empty panels.
    let database = if state.catalog.layer_count() > 0 {
        ServiceStatus::Healthy
    } else {
        ServiceStatus::Unhealthy
    };
    ServiceHealth {
        client: ServiceStatus::Healthy,
        api: ServiceStatus::Healthy,
        database,
    }
}

async fn probe_upstream(state: &AppState, base: &str) -> ServiceHealth {
    // Request timeout on the shared client bounds the probe (5s default).
    let url = format!("{base}/health");
    let response = match state.http_client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            state.observability.record_upstream_health_failure();
            warn!(error = %e, %url, "upstream health probe failed");
            return ServiceHealth {
                client: ServiceStatus::Healthy,
                api: ServiceStatus::Unhealthy,
                database: ServiceStatus::Unknown,
            };
        }
    };

    let ok = response.status().is_success();
    let body: UpstreamHealth = response.json().await.unwrap_or_default();

    if !ok {
        state.observability.record_upstream_health_failure();
    }

    let fallback = if ok {
        ServiceStatus::Healthy
    } else {
        ServiceStatus::Unhealthy
    };
    ServiceHealth {
        client: ServiceStatus::Healthy,
        api: body.services.api.unwrap_or(fallback),
        database: body.services.database.unwrap_or(fallback),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use boreal_shared::HealthReport;

    use crate::app::build_app;
    use crate::catalog::CatalogStore;
    use crate::state::AppState;

    #[tokio::test]
    async fn local_health_reports_every_service_healthy() {
        let catalog = CatalogStore::embedded().expect("embedded seed must load");
        let app = build_app(AppState::new(catalog));

        let response = app
            .oneshot(
                Request::get("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let report: HealthReport = serde_json::from_slice(&body).unwrap();
        assert!(report.is_healthy());
        assert!(report.services.database.is_healthy());
    }

    #[tokio::test]
    async fn unreachable_upstream_degrades_to_503() {
        let catalog = CatalogStore::embedded().expect("embedded seed must load");
        let mut state = AppState::new(catalog);
        // Nothing listens here; the probe must fail fast and map to unhealthy.
        state.upstream_api = Some("http://127.0.0.1:9".into());
        let app = build_app(state);

        let response = app
            .oneshot(
                Request::get("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let report: HealthReport = serde_json::from_slice(&body).unwrap();
        assert!(!report.is_healthy());
        assert_eq!(
            report.services.database,
            boreal_shared::ServiceStatus::Unknown
        );
    }
}
