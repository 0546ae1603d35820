//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use serde::{Deserialize, Serialize};
use signgate_core::SigngateError;
use signgate_gateway::GatewayConfig;
use signgate_observability::logging::{log_format_gueltig, log_level_gueltig};
use std::net::SocketAddr;
use std::time::Duration;

/// Kleinste sinnvolle Frame-Groesse (ein Event ohne Bild)
const MIN_FRAME_GROESSE: usize = 1024;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Gateway-Einstellungen (Clients, Queues)
    pub gateway: GatewayEinstellungen,
    /// Klassifikations-Service
    pub klassifikator: DienstEinstellungen,
    /// Antwort-Service (Chat)
    pub antwort: DienstEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            netzwerk: NetzwerkEinstellungen::default(),
            gateway: GatewayEinstellungen::default(),
            klassifikator: DienstEinstellungen::neu("http://127.0.0.1:8000/classify", 10_000),
            antwort: DienstEinstellungen::neu("http://127.0.0.1:8000/answer", 60_000),
            logging: LoggingEinstellungen::default(),
            observability: ObservabilityEinstellungen::default(),
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer TCP und Observability
    pub bind_adresse: String,
    /// Port fuer die TCP-Verbindungen der Clients
    pub tcp_port: u16,
    /// Maximale Frame-Groesse in Bytes
    pub max_frame_groesse: usize,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            tcp_port: 5000,
            max_frame_groesse: signgate_protocol::wire::DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Gateway-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayEinstellungen {
    /// Maximale Anzahl gleichzeitiger Clients
    pub max_clients: u32,
    /// Groesse der ausgehenden Queue pro Client
    pub send_queue_groesse: usize,
    /// Maximale Pixelanzahl eines Frames (Breite x Hoehe)
    pub max_bild_pixel: u64,
}

impl Default for GatewayEinstellungen {
    fn default() -> Self {
        let standard = GatewayConfig::default();
        Self {
            max_clients: standard.max_clients,
            send_queue_groesse: standard.send_queue_groesse,
            max_bild_pixel: standard.max_bild_pixel,
        }
    }
}

/// Anbindung eines externen HTTP-Services
///
/// Wird ein Abschnitt angegeben, muss er die `url` enthalten.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DienstEinstellungen {
    /// Endpunkt-URL
    pub url: String,
    /// Zeitlimit pro Anfrage in Millisekunden
    pub timeout_ms: u64,
}

impl Default for DienstEinstellungen {
    fn default() -> Self {
        Self::neu("", 30_000)
    }
}

impl DienstEinstellungen {
    fn neu(url: &str, timeout_ms: u64) -> Self {
        Self {
            url: url.into(),
            timeout_ms,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn pruefen(&self, abschnitt: &str) -> Result<(), SigngateError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(SigngateError::konfiguration(format!(
                "[{abschnitt}] url muss mit http:// oder https:// beginnen: '{}'",
                self.url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(SigngateError::konfiguration(format!(
                "[{abschnitt}] timeout_ms muss > 0 sein"
            )));
        }
        Ok(())
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9300,
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft Wertebereiche die serde nicht abdeckt
    pub fn validieren(&self) -> Result<(), SigngateError> {
        if !log_level_gueltig(&self.logging.level) {
            return Err(SigngateError::konfiguration(format!(
                "[logging] unbekanntes Level '{}'",
                self.logging.level
            )));
        }
        if !log_format_gueltig(&self.logging.format) {
            return Err(SigngateError::konfiguration(format!(
                "[logging] unbekanntes Format '{}'",
                self.logging.format
            )));
        }
        if self.gateway.max_clients == 0 {
            return Err(SigngateError::konfiguration("[gateway] max_clients muss > 0 sein"));
        }
        if self.gateway.send_queue_groesse == 0 {
            return Err(SigngateError::konfiguration(
                "[gateway] send_queue_groesse muss > 0 sein",
            ));
        }
        if self.gateway.max_bild_pixel == 0 {
            return Err(SigngateError::konfiguration("[gateway] max_bild_pixel muss > 0 sein"));
        }
        if self.netzwerk.max_frame_groesse < MIN_FRAME_GROESSE {
            return Err(SigngateError::konfiguration(format!(
                "[netzwerk] max_frame_groesse muss mindestens {MIN_FRAME_GROESSE} sein"
            )));
        }
        self.klassifikator.pruefen("klassifikator")?;
        self.antwort.pruefen("antwort")?;

        self.tcp_bind_adresse()?;
        if self.observability.aktiviert {
            self.observability_bind_adresse()?;
        }
        Ok(())
    }

    /// Gibt die Bind-Adresse fuer die Client-Verbindungen zurueck
    pub fn tcp_bind_adresse(&self) -> Result<SocketAddr, SigngateError> {
        adresse_parsen(&self.netzwerk.bind_adresse, self.netzwerk.tcp_port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> Result<SocketAddr, SigngateError> {
        adresse_parsen(&self.netzwerk.bind_adresse, self.observability.port)
    }

    /// Baut die Gateway-Konfiguration
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            max_clients: self.gateway.max_clients,
            send_queue_groesse: self.gateway.send_queue_groesse,
            max_frame_groesse: self.netzwerk.max_frame_groesse,
            max_bild_pixel: self.gateway.max_bild_pixel,
        }
    }
}

fn adresse_parsen(host: &str, port: u16) -> Result<SocketAddr, SigngateError> {
    let adresse = format!("{host}:{port}");
    adresse
        .parse::<SocketAddr>()
        .map_err(|e| SigngateError::Adresse {
            grund: e.to_string(),
            adresse,
        })
}
