//! Health-Check-Endpunkt fuer Signgate
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime und Annahme-Status des Gateways

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub accepting: bool,
}

/// Geteilter Zustand fuer den Health-Check-Handler
///
/// `accepting` wird vom Gateway gesetzt solange der TCP-Listener laeuft.
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Arc<Instant>,
    pub accepting: Arc<AtomicBool>,
}

impl HealthState {
    pub fn neu() -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            accepting: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn nimmt_an(&self) -> bool {
        self.accepting.load(Ordering::Relaxed)
    }

    pub fn annahme_setzen(&self, aktiv: bool) {
        self.accepting.store(aktiv, Ordering::Relaxed);
    }

    /// Baut die aktuelle Health-Antwort
    pub fn antwort(&self) -> HealthResponse {
        let accepting = self.nimmt_an();
        HealthResponse {
            status: if accepting {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            accepting,
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::neu()
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – gibt den Gateway-Status zurueck
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let response = state.antwort();
    let http_status = match response.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (http_status, Json(response))
}
