//! Gemeinsamer Gateway-Zustand
//!
//! Haelt alle geteilten Services als Arc-Referenzen, die sicher zwischen
//! tokio-Tasks geteilt werden koennen.

use parking_lot::Mutex;
use signgate_observability::{GatewayMetrics, HealthState};
use signgate_protocol::wire::DEFAULT_MAX_FRAME_SIZE;
use std::sync::Arc;
use std::time::Instant;

use crate::arbiter::SessionArbiter;
use crate::frame::{FrameProcessor, LabelFilter};
use crate::kollaborator::{Answerer, Classifier};
use crate::registry::ConnectionRegistry;

/// Geschuetzter Kern: aktive Rolle, Warteschlange und zuletzt gemeldetes Label
///
/// Liegt hinter genau einem Mutex. Der Lock wird nie ueber ein `.await`
/// gehalten.
#[derive(Debug, Default)]
pub struct SitzungsKern {
    pub arbiter: SessionArbiter,
    pub labels: LabelFilter,
}

/// Standard-Limit fuer dekodierte Bilder (4096 x 4096)
pub const DEFAULT_MAX_BILD_PIXEL: u64 = 4096 * 4096;

/// Konfiguration fuer den Gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Maximale gleichzeitige Verbindungen
    pub max_clients: u32,
    /// Groesse der ausgehenden Queue pro Verbindung
    pub send_queue_groesse: usize,
    /// Maximale Frame-Groesse auf der Leitung in Bytes
    pub max_frame_groesse: usize,
    /// Maximale Pixelanzahl eines Frames laut PNG-Header
    pub max_bild_pixel: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_clients: 256,
            send_queue_groesse: 64,
            max_frame_groesse: DEFAULT_MAX_FRAME_SIZE,
            max_bild_pixel: DEFAULT_MAX_BILD_PIXEL,
        }
    }
}

/// Gemeinsamer Gateway-Zustand (thread-safe, Arc-geteilt)
pub struct GatewayState {
    /// Gateway-Konfiguration
    pub config: Arc<GatewayConfig>,
    /// Arbiter und Label-Filter
    pub kern: Arc<Mutex<SitzungsKern>>,
    /// Send-Queues aller verbundenen Clients
    pub registry: ConnectionRegistry,
    /// Frame-Verarbeitung
    pub frames: FrameProcessor,
    /// Antwort-Service fuer Chat-Nachrichten
    pub answerer: Arc<dyn Answerer>,
    /// Prometheus-Metriken
    pub metriken: GatewayMetrics,
    /// Health-Status (Listener aktiv?)
    pub health: HealthState,
    /// Startzeitpunkt des Gateways
    pub start_time: Instant,
}

impl GatewayState {
    /// Erstellt einen neuen GatewayState
    pub fn neu(
        config: GatewayConfig,
        classifier: Arc<dyn Classifier>,
        answerer: Arc<dyn Answerer>,
        metriken: GatewayMetrics,
        health: HealthState,
    ) -> Arc<Self> {
        let kern = Arc::new(Mutex::new(SitzungsKern::default()));
        let frames = FrameProcessor::neu(
            classifier,
            Arc::clone(&kern),
            metriken.clone(),
            config.max_bild_pixel,
        );
        let registry = ConnectionRegistry::neu(config.send_queue_groesse);

        Arc::new(Self {
            config: Arc::new(config),
            kern,
            registry,
            frames,
            answerer,
            metriken,
            health,
            start_time: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
