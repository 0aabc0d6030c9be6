use std::time::Duration;

pub const SERVER_PORT: u16 = 3000;

pub const DEFAULT_CATALOG_PATH: &str = "data/catalog.json";
pub const MAX_PAGE_LIMIT: usize = 100;

/// Upstream API health probe (split deployments only).
pub const DEFAULT_UPSTREAM_HEALTH_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;

pub const CLIENT_DIST_DIR: &str = "client/dist";

pub fn catalog_path() -> String {
    std::env::var("BOREAL_CATALOG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATALOG_PATH.to_string())
}

/// Base URL of an upstream catalog API whose `/health` is folded into ours.
/// Unset means the catalog is served locally and no probe is made.
pub fn upstream_api_url() -> Option<String> {
    std::env::var("BOREAL_UPSTREAM_API_URL")
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
}

pub fn upstream_health_timeout() -> Duration {
    std::env::var("BOREAL_UPSTREAM_HEALTH_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HEALTH_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("BOREAL_UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

pub fn server_port() -> u16 {
    std::env::var("BOREAL_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(SERVER_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_path_defaults_when_unset() {
        temp_env::with_var("BOREAL_CATALOG_PATH", None::<&str>, || {
            assert_eq!(catalog_path(), DEFAULT_CATALOG_PATH);
        });
    }

    #[test]
    fn upstream_api_url_strips_trailing_slash() {
        temp_env::with_var(
            "BOREAL_UPSTREAM_API_URL",
            Some("http://api.internal:8000/"),
            || {
                assert_eq!(
                    upstream_api_url().as_deref(),
                    Some("http://api.internal:8000")
                );
            },
        );
    }

    #[test]
    fn blank_upstream_api_url_is_treated_as_unset() {
        temp_env::with_var("BOREAL_UPSTREAM_API_URL", Some("   "), || {
            assert_eq!(upstream_api_url(), None);
        });
    }

    #[test]
    fn invalid_timeout_falls_back_to_default() {
        temp_env::with_var("BOREAL_UPSTREAM_HEALTH_TIMEOUT_SECS", Some("zero"), || {
            assert_eq!(
                upstream_health_timeout(),
                Duration::from_secs(DEFAULT_UPSTREAM_HEALTH_TIMEOUT_SECS)
            );
        });
    }
}
