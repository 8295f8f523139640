//! Prometheus counters for the control plane, following the teacher's
//! `metrics.rs` shape: `LazyLock` statics registered once, gathered into
//! text on demand by the `/metrics` handler.

use actix_web::{get, web, HttpRequest, HttpResponse};
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};
use std::sync::LazyLock;

use crate::state::AppState;

pub static AUTH_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "voicepay_control_auth_total",
        "Total authentication attempts",
        &["result"]
    )
    .unwrap()
});

pub static INTENT_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "voicepay_control_intent_total",
        "Total intent resolution attempts",
        &["result"]
    )
    .unwrap()
});

pub static SCHEDULES_CREATED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "voicepay_control_schedules_created_total",
        "Recurring schedules created",
        &["interval"]
    )
    .unwrap()
});

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[get("/metrics")]
pub async fn metrics_endpoint(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    match &state.config.metrics_token {
        Some(token) => {
            let authorized = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| voicepay_auth::constant_time_eq(t.as_bytes(), token.as_bytes()))
                .unwrap_or(false);

            if !authorized {
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "unauthorized",
                    "message": "Valid Bearer token required for /metrics",
                }));
            }
        }
        None => {
            let public_metrics = std::env::var("VOICEPAY_PUBLIC_METRICS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false);
            if !public_metrics {
                return HttpResponse::Forbidden().json(serde_json::json!({
                    "error": "forbidden",
                    "message": "Set METRICS_TOKEN or VOICEPAY_PUBLIC_METRICS=true to access /metrics",
                }));
            }
        }
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics_output())
}
