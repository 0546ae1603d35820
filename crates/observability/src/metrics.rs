//! Prometheus-kompatible Metriken fuer Signgate
//!
//! Registrierte Metriken:
//! - `signgate_connected_clients` – Gauge: Aktuell verbundene Clients
//! - `signgate_waiting_clients` – Gauge: Clients in der Warteschlange
//! - `signgate_active_grants_total` – Counter: Vergebene aktive Rollen (inkl. Befoerderungen)
//! - `signgate_frames_total` – Counter: Verarbeitete Frames (outcome)
//! - `signgate_classification_duration_seconds` – Histogram: Dauer der Klassifikation
//! - `signgate_chat_requests_total` – Counter: Chat-Anfragen (outcome)

use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Alle Signgate-Prometheus-Metriken
///
/// Clone teilt die Registry und alle Metrik-Handles.
#[derive(Clone)]
pub struct GatewayMetrics {
    pub registry: Arc<Registry>,

    // Verbindungs-Metriken
    pub connected_clients: Gauge,
    pub waiting_clients: Gauge,
    pub active_grants_total: IntCounter,

    // Verarbeitungs-Metriken
    pub frames_total: IntCounterVec,
    pub classification_duration_seconds: Histogram,
    pub chat_requests_total: IntCounterVec,
}

impl GatewayMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Verbindungs-Metriken ---
        let connected_clients = Gauge::with_opts(Opts::new(
            "signgate_connected_clients",
            "Anzahl aktuell verbundener Clients",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let waiting_clients = Gauge::with_opts(Opts::new(
            "signgate_waiting_clients",
            "Anzahl wartender Clients in der Warteschlange",
        ))?;
        registry.register(Box::new(waiting_clients.clone()))?;

        let active_grants_total = IntCounter::with_opts(Opts::new(
            "signgate_active_grants_total",
            "Gesamtanzahl vergebener aktiver Rollen",
        ))?;
        registry.register(Box::new(active_grants_total.clone()))?;

        // --- Verarbeitungs-Metriken ---
        let frames_total = IntCounterVec::new(
            Opts::new("signgate_frames_total", "Gesamtanzahl verarbeiteter Frames"),
            &["outcome"],
        )?;
        registry.register(Box::new(frames_total.clone()))?;

        let classification_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "signgate_classification_duration_seconds",
                "Dauer einer Klassifikation in Sekunden",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(classification_duration_seconds.clone()))?;

        let chat_requests_total = IntCounterVec::new(
            Opts::new(
                "signgate_chat_requests_total",
                "Gesamtanzahl Chat-Anfragen",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(chat_requests_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_clients,
            waiting_clients,
            active_grants_total,
            frames_total,
            classification_duration_seconds,
            chat_requests_total,
        })
    }

    /// Zaehlt einen verarbeiteten Frame mit dem gegebenen Ergebnis
    pub fn frame_zaehlen(&self, outcome: &str) {
        self.frames_total.with_label_values(&[outcome]).inc();
    }

    /// Zaehlt eine Chat-Anfrage mit dem gegebenen Ergebnis
    pub fn chat_zaehlen(&self, outcome: &str) {
        self.chat_requests_total.with_label_values(&[outcome]).inc();
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: GatewayMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<GatewayMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = GatewayMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn gauge_connected_clients_setzen() {
        let metriken = GatewayMetrics::neu().unwrap();
        metriken.connected_clients.inc();
        metriken.connected_clients.inc();
        metriken.connected_clients.dec();
        assert_eq!(metriken.connected_clients.get(), 1.0);
    }

    #[test]
    fn frame_counter_mit_outcome() {
        let metriken = GatewayMetrics::neu().unwrap();
        metriken.frame_zaehlen("label");
        metriken.frame_zaehlen("label");
        metriken.frame_zaehlen("duplicate");

        assert_eq!(metriken.frames_total.with_label_values(&["label"]).get(), 2);
        assert_eq!(
            metriken.frames_total.with_label_values(&["duplicate"]).get(),
            1
        );
    }

    #[test]
    fn metriken_export_prometheus_format() {
        let metriken = GatewayMetrics::neu().unwrap();
        metriken.waiting_clients.set(3.0);
        metriken.active_grants_total.inc();
        metriken.chat_zaehlen("answered");

        let output = metriken.exportieren().unwrap();
        assert!(output.contains("signgate_waiting_clients 3"));
        assert!(output.contains("signgate_active_grants_total 1"));
        assert!(output.contains("signgate_chat_requests_total{outcome=\"answered\"} 1"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn clone_teilt_registry() {
        let a = GatewayMetrics::neu().unwrap();
        let b = a.clone();
        a.active_grants_total.inc();
        assert_eq!(b.active_grants_total.get(), 1);
    }
}
