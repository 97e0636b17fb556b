use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::warn;

use super::AppState;

#[derive(Serialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// Storage round-trip; 503 while storage is unreachable
pub async fn readiness_check(state: web::Data<AppState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let start = Instant::now();
    let result = state.storage.ping().await;
    let latency = Some(start.elapsed().as_millis() as u64);

    let ready = result.is_ok();
    let storage_check = match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Storage round-trip successful".to_string(),
            latency_ms: latency,
        },
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("Storage round-trip failed: {}", e),
                latency_ms: latency,
            }
        }
    };
    checks.insert("storage".to_string(), storage_check);

    let response = ReadinessResponse {
        ready,
        status: if ready {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        },
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
