use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
    Unknown,
}

impl ServiceStatus {
    pub fn is_healthy(self) -> bool {
        matches!(self, ServiceStatus::Healthy)
    }
}

/// Per-component detail of the aggregated health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub client: ServiceStatus,
    pub api: ServiceStatus,
    pub database: ServiceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: ServiceStatus,
    pub services: ServiceHealth,
}

impl HealthReport {
    /// Overall status is healthy only when every component is.
    pub fn aggregate(services: ServiceHealth) -> Self {
        let healthy = services.client.is_healthy()
            && services.api.is_healthy()
            && services.database.is_healthy();
        Self {
            status: if healthy {
                ServiceStatus::Healthy
            } else {
                ServiceStatus::Unhealthy
            },
            services,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_healthy_aggregates_healthy() {
        let report = HealthReport::aggregate(ServiceHealth {
            client: ServiceStatus::Healthy,
            api: ServiceStatus::Healthy,
            database: ServiceStatus::Healthy,
        });
        assert!(report.is_healthy());
    }

    #[test]
    fn unknown_component_is_not_healthy() {
        let report = HealthReport::aggregate(ServiceHealth {
            client: ServiceStatus::Healthy,
            api: ServiceStatus::Healthy,
            database: ServiceStatus::Unknown,
        });
        assert_eq!(report.status, ServiceStatus::Unhealthy);
    }

    #[test]
    fn statuses_serialize_lowercase() {
        let json = serde_json::to_string(&ServiceStatus::Unhealthy).unwrap();
        assert_eq!(json, r#""unhealthy""#);
    }
}
