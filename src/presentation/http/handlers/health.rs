//! Health and readiness probes.
//!
//! - `GET /health` answers as long as the process serves HTTP
//! - `GET /health/live` liveness probe
//! - `GET /health/ready` checks storage, the notification broker and the session registry

use std::{fmt::Display, future::Future, time::Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::startup::AppState;

static STARTED: Lazy<(Instant, DateTime<Utc>)> = Lazy::new(|| (Instant::now(), Utc::now()));

/// Pin the uptime origin to process start rather than the first probe.
pub fn init_server_start() {
    Lazy::force(&STARTED);
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub storage: ComponentHealth,
    pub notifications: ComponentHealth,
    pub sessions: SessionHealth,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Live connection counts from the session registry.
#[derive(Debug, Serialize)]
pub struct SessionHealth {
    pub active_sessions: usize,
    pub online_users: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// 503 only when the message store is unreachable. The broker merely mirrors
/// events, so losing it degrades readiness without failing it.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let storage = match &state.db {
        Some(pool) => probe("Storage", 100, sqlx::query("SELECT 1").execute(pool)).await,
        None => in_process("Storage"),
    };

    let notifications = match &state.redis {
        Some(redis) => {
            let mut conn = redis.clone();
            probe(
                "Notification broker",
                50,
                redis::cmd("PING").query_async::<String>(&mut conn),
            )
            .await
        }
        None => ComponentHealth {
            status: HealthStatus::Healthy,
            latency_ms: None,
            message: Some("Notification broker disabled".into()),
        },
    };

    let status = overall_status(&storage, &notifications);
    let (started, started_at) = *STARTED;

    let body = ReadinessResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: started.elapsed().as_secs(),
        started_at: started_at.to_rfc3339(),
        checks: HealthChecks {
            storage,
            notifications,
            sessions: SessionHealth {
                active_sessions: state.registry.session_count(),
                online_users: state.registry.online_user_count(),
            },
        },
    };

    let code = if status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (code, Json(body))
}

fn in_process(what: &str) -> ComponentHealth {
    ComponentHealth {
        status: HealthStatus::Healthy,
        latency_ms: None,
        message: Some(format!("{} is in-process", what)),
    }
}

/// Time a round trip; slower than `slow_ms` reports degraded.
async fn probe<T, E, F>(what: &str, slow_ms: u64, check: F) -> ComponentHealth
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let start = Instant::now();
    match check.await {
        Ok(_) => {
            let latency = start.elapsed().as_millis() as u64;
            ComponentHealth {
                status: if latency < slow_ms {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                },
                latency_ms: Some(latency),
                message: None,
            }
        }
        Err(e) => ComponentHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            message: Some(format!("{} unreachable: {}", what, e)),
        },
    }
}

fn overall_status(storage: &ComponentHealth, notifications: &ComponentHealth) -> HealthStatus {
    let broker = notifications.status.min(HealthStatus::Degraded);
    storage.status.max(broker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn component(status: HealthStatus) -> ComponentHealth {
        ComponentHealth {
            status,
            latency_ms: None,
            message: None,
        }
    }

    #[test]
    fn test_health_status_serialization() {
        let json = serde_json::to_string(&HealthStatus::Degraded).unwrap();
        assert_eq!(json, "\"degraded\"");
    }

    #[test_case(HealthStatus::Healthy, HealthStatus::Healthy => HealthStatus::Healthy ; "all healthy")]
    #[test_case(HealthStatus::Degraded, HealthStatus::Healthy => HealthStatus::Degraded ; "slow storage")]
    #[test_case(HealthStatus::Unhealthy, HealthStatus::Healthy => HealthStatus::Unhealthy ; "storage down")]
    #[test_case(HealthStatus::Healthy, HealthStatus::Unhealthy => HealthStatus::Degraded ; "broker down only degrades")]
    #[test_case(HealthStatus::Unhealthy, HealthStatus::Degraded => HealthStatus::Unhealthy ; "storage dominates")]
    fn test_overall_status(storage: HealthStatus, broker: HealthStatus) -> HealthStatus {
        overall_status(&component(storage), &component(broker))
    }

    #[tokio::test]
    async fn test_probe_reports_failure_message() {
        let health = probe("Storage", 100, async { Err::<(), _>("refused") }).await;
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.message.as_deref(), Some("Storage unreachable: refused"));
    }

    #[tokio::test]
    async fn test_probe_success_records_latency() {
        let health = probe("Storage", 10_000, async { Ok::<_, String>(()) }).await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert!(health.latency_ms.is_some());
    }
}
