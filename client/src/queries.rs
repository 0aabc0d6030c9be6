#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

//! Cached API fetchers. Each query key owns one signal-backed cache slot;
//! concurrent consumers share a single in-flight request, transient failures
//! retry with doubling delays, and 4xx responses fail immediately.

use std::cell::RefCell;
use std::collections::HashSet;

use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use serde::de::DeserializeOwned;
use wasm_bindgen_futures::spawn_local;

use boreal_shared::{CategoryResponse, DatasetResponse};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_MS: u32 = 500;
const RETRY_CAP_MS: u32 = 10_000;

const CATEGORIES_KEY: &str = "categories";
const DATASETS_KEY: &str = "datasets";

pub const CATEGORIES_URL: &str = "/api/categories";
pub const DATASETS_URL: &str = "/api/datasets?include_layers=true";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryStatus<T> {
    #[default]
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> QueryStatus<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryStatus::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryStatus::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// One cache slot. Copy, so components can grab it from context freely.
pub struct QueryHandle<T: Send + Sync + 'static> {
    pub status: RwSignal<QueryStatus<T>>,
    key: &'static str,
    nonce: RwSignal<u64>,
}

impl<T: Send + Sync + 'static> Clone for QueryHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Send + Sync + 'static> Copy for QueryHandle<T> {}

impl<T: Send + Sync + 'static> QueryHandle<T> {
    fn new(key: &'static str) -> Self {
        Self {
            status: RwSignal::new(QueryStatus::Idle),
            key,
            nonce: RwSignal::new(0),
        }
    }
}

#[derive(Clone, Copy)]
pub struct CategoriesQuery(pub QueryHandle<CategoryResponse>);
#[derive(Clone, Copy)]
pub struct DatasetsQuery(pub QueryHandle<DatasetResponse>);

pub fn provide_queries() {
    provide_context(CategoriesQuery(QueryHandle::new(CATEGORIES_KEY)));
    provide_context(DatasetsQuery(QueryHandle::new(DATASETS_KEY)));
}

thread_local! {
    static IN_FLIGHT: RefCell<HashSet<&'static str>> = RefCell::new(HashSet::new());
}

enum FetchOutcome<T> {
    Ok(T),
    Terminal(String),
    Retryable(String),
}

async fn fetch_json<T: DeserializeOwned>(url: &str) -> FetchOutcome<T> {
    let resp = match gloo_net::http::Request::get(url).send().await {
        Ok(resp) => resp,
        Err(e) => return FetchOutcome::Retryable(format!("fetch error: {e}")),
    };

    let status = resp.status();
    if resp.ok() {
        match resp.json::<T>().await {
            Ok(data) => FetchOutcome::Ok(data),
            Err(e) => FetchOutcome::Terminal(format!("parse error: {e}")),
        }
    } else if (400..500).contains(&status) {
        // Client errors won't heal on retry
        FetchOutcome::Terminal(format!("HTTP {status}"))
    } else {
        FetchOutcome::Retryable(format!("HTTP {status}"))
    }
}

/// Delay before the next attempt, doubling per failure.
fn retry_backoff_ms(failed_attempts: u32) -> u32 {
    (RETRY_BASE_MS << (failed_attempts.saturating_sub(1)).min(6)).min(RETRY_CAP_MS)
}

/// Kick off the fetch for a handle unless cached data or an identical request
/// already exists. Stale responses are dropped via the nonce.
pub fn ensure_fetch<T>(handle: QueryHandle<T>, url: &'static str)
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    if matches!(
        handle.status.get_untracked(),
        QueryStatus::Success(_) | QueryStatus::Loading
    ) {
        return;
    }
    let started = IN_FLIGHT.with(|set| set.borrow_mut().insert(handle.key));
    if !started {
        return;
    }

    let request_nonce = handle.nonce.get_untracked().wrapping_add(1);
    handle.nonce.set(request_nonce);
    handle.status.set(QueryStatus::Loading);

    spawn_local(async move {
        let mut failed_attempts = 0;
        let result = loop {
            match fetch_json::<T>(url).await {
                FetchOutcome::Ok(data) => break Ok(data),
                FetchOutcome::Terminal(message) => break Err(message),
                FetchOutcome::Retryable(message) => {
                    failed_attempts += 1;
                    if failed_attempts >= MAX_ATTEMPTS {
                        break Err(message);
                    }
                    TimeoutFuture::new(retry_backoff_ms(failed_attempts)).await;
                }
            }
        };

        IN_FLIGHT.with(|set| {
            set.borrow_mut().remove(handle.key);
        });

        // Only the latest request for this slot may write
        if handle.nonce.get_untracked() != request_nonce {
            return;
        }

        match result {
            Ok(data) => handle.status.set(QueryStatus::Success(data)),
            Err(message) => {
                web_sys::console::warn_1(&format!("query {url} failed: {message}").into());
                handle.status.set(QueryStatus::Error(message));
            }
        }
    });
}

/// Drop cached data so the next consumer refetches.
pub fn invalidate<T: Send + Sync + 'static>(handle: QueryHandle<T>) {
    handle.nonce.update(|n| *n = n.wrapping_add(1));
    handle.status.set(QueryStatus::Idle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_failed_attempt() {
        assert_eq!(retry_backoff_ms(1), 500);
        assert_eq!(retry_backoff_ms(2), 1000);
        assert_eq!(retry_backoff_ms(3), 2000);
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(retry_backoff_ms(40), RETRY_CAP_MS);
    }

    #[test]
    fn invalidate_resets_the_slot_and_bumps_the_nonce() {
        let handle: QueryHandle<u32> = QueryHandle::new("slot-under-test");
        handle.status.set(QueryStatus::Success(7));
        let stale_nonce = handle.nonce.get_untracked();
        invalidate(handle);
        assert!(matches!(handle.status.get_untracked(), QueryStatus::Idle));
        // An in-flight response for the old request can no longer win
        assert_ne!(handle.nonce.get_untracked(), stale_nonce);
    }

    #[test]
    fn status_accessors() {
        let status: QueryStatus<u32> = QueryStatus::Success(7);
        assert_eq!(status.data(), Some(&7));
        assert!(!status.is_loading());
        let status: QueryStatus<u32> = QueryStatus::Error("HTTP 404".into());
        assert_eq!(status.error(), Some("HTTP 404"));
        assert_eq!(status.data(), None);
    }
}
