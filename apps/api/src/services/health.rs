//! Health check service for verifying external dependencies
//!
//! Readiness depends on:
//! - Redis (download task records and the scan lock)
//! - The settings document holding the media server configuration

use refresharr_media_scan::ConfigStore;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Status of an individual service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Service is healthy and responding
    Healthy,
    /// Service is unhealthy or unreachable
    Unhealthy,
}

/// Result of a single service health check
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    /// Name of the service
    pub name: &'static str,
    /// Current status
    pub status: ServiceStatus,
    /// Response time in milliseconds (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Error message if unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Additional details about the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServiceHealth {
    /// Create a healthy service result
    pub fn healthy(name: &'static str, response_time: Duration) -> Self {
        Self {
            name,
            status: ServiceStatus::Healthy,
            response_time_ms: Some(response_time.as_millis() as u64),
            error: None,
            details: None,
        }
    }

    /// Create a healthy service result with details
    pub fn healthy_with_details(
        name: &'static str,
        response_time: Duration,
        details: serde_json::Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::healthy(name, response_time)
        }
    }

    /// Create an unhealthy service result
    pub fn unhealthy(name: &'static str, error: impl Into<String>) -> Self {
        Self {
            name,
            status: ServiceStatus::Unhealthy,
            response_time_ms: None,
            error: Some(error.into()),
            details: None,
        }
    }

    /// Create an unhealthy service result with response time
    pub fn unhealthy_with_time(
        name: &'static str,
        error: impl Into<String>,
        response_time: Duration,
    ) -> Self {
        Self {
            response_time_ms: Some(response_time.as_millis() as u64),
            ..Self::unhealthy(name, error)
        }
    }
}

/// Aggregated health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResponse {
    /// Overall status (healthy only if every service is healthy)
    pub status: ServiceStatus,
    /// Individual service health results
    pub services: Vec<ServiceHealth>,
    /// Total time to complete all health checks
    pub total_time_ms: u64,
    /// API version
    pub version: &'static str,
}

impl HealthCheckResponse {
    /// Create a new health check response from individual service results
    pub fn new(services: Vec<ServiceHealth>, total_time: Duration) -> Self {
        let status = if services.iter().all(|s| s.status == ServiceStatus::Healthy) {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Unhealthy
        };

        Self {
            status,
            services,
            total_time_ms: total_time.as_millis() as u64,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Check if overall health is good
    pub fn is_healthy(&self) -> bool {
        self.status == ServiceStatus::Healthy
    }
}

/// Health check service for verifying external dependencies
#[derive(Debug, Clone)]
pub struct HealthService {
    redis_timeout: Duration,
}

impl HealthService {
    /// Create a new health service; Redis checks give up after `redis_timeout`
    pub fn new(redis_timeout: Duration) -> Self {
        Self { redis_timeout }
    }

    /// Check Redis connectivity
    pub async fn check_redis(&self, redis_url: &str) -> ServiceHealth {
        let start = Instant::now();

        let client = match redis::Client::open(redis_url) {
            Ok(client) => client,
            Err(e) => return ServiceHealth::unhealthy("redis", format!("Invalid URL: {}", e)),
        };

        let mut conn = match tokio::time::timeout(
            self.redis_timeout,
            client.get_multiplexed_async_connection(),
        )
        .await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return ServiceHealth::unhealthy("redis", format!("Connection failed: {}", e))
            }
            Err(_) => return ServiceHealth::unhealthy("redis", "Connection timed out"),
        };

        // Run a PING command to verify the connection
        match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(response) if response == "PONG" => {
                let elapsed = start.elapsed();
                let info: Option<String> = redis::cmd("INFO")
                    .arg("server")
                    .query_async::<_, String>(&mut conn)
                    .await
                    .ok();

                match info.as_deref().and_then(redis_version) {
                    Some(version) => ServiceHealth::healthy_with_details(
                        "redis",
                        elapsed,
                        serde_json::json!({ "version": version }),
                    ),
                    None => ServiceHealth::healthy("redis", elapsed),
                }
            }
            Ok(response) => ServiceHealth::unhealthy_with_time(
                "redis",
                format!("Unexpected PING response: {}", response),
                start.elapsed(),
            ),
            Err(e) => ServiceHealth::unhealthy_with_time(
                "redis",
                format!("PING failed: {}", e),
                start.elapsed(),
            ),
        }
    }

    /// Check that the settings document can be read
    pub async fn check_settings(&self, store: &dyn ConfigStore) -> ServiceHealth {
        let start = Instant::now();

        match store.get_config().await {
            Ok(document) if document.is_object() => ServiceHealth::healthy("settings", start.elapsed()),
            Ok(_) => ServiceHealth::unhealthy_with_time(
                "settings",
                "Settings document is not a JSON object",
                start.elapsed(),
            ),
            Err(e) => ServiceHealth::unhealthy_with_time(
                "settings",
                format!("Read failed: {}", e),
                start.elapsed(),
            ),
        }
    }

    /// Run all health checks in parallel
    pub async fn check_all(&self, redis_url: &str, store: &dyn ConfigStore) -> HealthCheckResponse {
        let start = Instant::now();

        let (redis_health, settings_health) =
            tokio::join!(self.check_redis(redis_url), self.check_settings(store));

        HealthCheckResponse::new(vec![redis_health, settings_health], start.elapsed())
    }
}

/// `redis_version:` line of `INFO server`
fn redis_version(info: &str) -> Option<String> {
    info.lines()
        .find_map(|line| line.strip_prefix("redis_version:"))
        .map(|version| version.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use refresharr_media_scan::MemoryConfigStore;
    use serde_json::json;

    #[test]
    fn test_service_health_healthy() {
        let health = ServiceHealth::healthy("test", Duration::from_millis(50));
        assert_eq!(health.status, ServiceStatus::Healthy);
        assert_eq!(health.response_time_ms, Some(50));
        assert!(health.error.is_none());
    }

    #[test]
    fn test_service_health_unhealthy() {
        let health = ServiceHealth::unhealthy("test", "Connection refused");
        assert_eq!(health.status, ServiceStatus::Unhealthy);
        assert!(health.response_time_ms.is_none());
        assert_eq!(health.error, Some("Connection refused".to_string()));
    }

    #[test]
    fn test_health_check_response_one_unhealthy() {
        let services = vec![
            ServiceHealth::healthy("settings", Duration::from_millis(10)),
            ServiceHealth::unhealthy("redis", "Connection refused"),
        ];
        let response = HealthCheckResponse::new(services, Duration::from_millis(15));
        assert!(!response.is_healthy());
        assert_eq!(response.status, ServiceStatus::Unhealthy);
    }

    #[test]
    fn test_redis_version_parsing() {
        let info = "# Server\r\nredis_version:7.2.4\r\nredis_mode:standalone\r\n";
        assert_eq!(redis_version(info), Some("7.2.4".to_string()));
        assert_eq!(redis_version("# Server\r\n"), None);
    }

    #[tokio::test]
    async fn test_check_settings() {
        let service = HealthService::new(Duration::from_secs(1));

        let health = service.check_settings(&MemoryConfigStore::empty()).await;
        assert_eq!(health.status, ServiceStatus::Healthy);

        let health = service.check_settings(&MemoryConfigStore::new(json!("oops"))).await;
        assert_eq!(health.status, ServiceStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_check_redis_invalid_url() {
        let service = HealthService::new(Duration::from_secs(1));
        let health = service.check_redis("not a url").await;
        assert_eq!(health.status, ServiceStatus::Unhealthy);
        assert!(health.error.unwrap().starts_with("Invalid URL"));
    }
}
