use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::catalog::CatalogStore;
use crate::config::{upstream_api_url, upstream_connect_timeout, upstream_health_timeout};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    pub http_client: reqwest::Client,
    /// Base URL of a remote catalog API folded into `/health`. None when the
    /// catalog is served from this process.
    pub upstream_api: Option<String>,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    categories_requests_total: AtomicU64,
    datasets_requests_total: AtomicU64,
    layers_requests_total: AtomicU64,
    health_requests_total: AtomicU64,
    not_modified_responses_total: AtomicU64,
    upstream_health_failures_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub categories_requests_total: u64,
    pub datasets_requests_total: u64,
    pub layers_requests_total: u64,
    pub health_requests_total: u64,
    pub not_modified_responses_total: u64,
    pub upstream_health_failures_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            categories_requests_total: self.categories_requests_total.load(Ordering::Relaxed),
            datasets_requests_total: self.datasets_requests_total.load(Ordering::Relaxed),
            layers_requests_total: self.layers_requests_total.load(Ordering::Relaxed),
            health_requests_total: self.health_requests_total.load(Ordering::Relaxed),
            not_modified_responses_total: self.not_modified_responses_total.load(Ordering::Relaxed),
            upstream_health_failures_total: self
                .upstream_health_failures_total
                .load(Ordering::Relaxed),
        }
    }

    pub fn record_categories_request(&self) {
        self.categories_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_datasets_request(&self) {
        self.datasets_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_layers_request(&self) {
        self.layers_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_health_request(&self) {
        self.health_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_modified(&self) {
        self.not_modified_responses_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_health_failure(&self) {
        self.upstream_health_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(catalog: CatalogStore) -> Self {
        let request_timeout = upstream_health_timeout();
        let connect_timeout = upstream_connect_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("boreal/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })
            .unwrap_or_else(|e| {
                panic!("failed to build timeout-configured HTTP client: {e}");
            });

        Self {
            catalog: Arc::new(catalog),
            http_client,
            upstream_api: upstream_api_url(),
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }
}
