//! Structured Logging Setup via tracing-subscriber
//!
//! Level und Format kommen aus der Konfigurationsdatei und koennen per
//! Umgebungsvariable ueberschrieben werden:
//! - `SG_LOG_LEVEL`: EnvFilter-Direktive, z.B. `info,signgate_gateway=debug`
//! - `SG_LOG_FORMAT`: `text` oder `json`
//!
//! Verbindungen erscheinen als strukturiertes Feld `connection = %id`.

use anyhow::{anyhow, Result};
use std::str::FromStr;
use tracing_subscriber::{fmt, EnvFilter};

const ENV_LEVEL: &str = "SG_LOG_LEVEL";
const ENV_FORMAT: &str = "SG_LOG_FORMAT";

/// Ausgabeformat der Logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Menschenlesbar, eine Zeile pro Event
    #[default]
    Text,
    /// Ein JSON-Objekt pro Zeile (fuer Log-Aggregation)
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            anders => Err(format!("unbekanntes Log-Format '{anders}'")),
        }
    }
}

/// Initialisiert den globalen Subscriber.
///
/// Schlaegt fehl wenn bereits ein Subscriber gesetzt ist.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<()> {
    let filter = filter_bauen(std::env::var(ENV_LEVEL).ok().as_deref(), level);
    let format = format_waehlen(std::env::var(ENV_FORMAT).ok().as_deref(), format);

    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    ergebnis.map_err(|e| anyhow!("Logging konnte nicht initialisiert werden: {e}"))
}

/// Baut den Filter: Umgebung vor Konfiguration, ungueltige Direktiven
/// fallen auf `info` zurueck.
fn filter_bauen(aus_env: Option<&str>, aus_config: &str) -> EnvFilter {
    aus_env
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_new(aus_config).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn format_waehlen(aus_env: Option<&str>, aus_config: &str) -> LogFormat {
    aus_env
        .and_then(|f| f.parse().ok())
        .or_else(|| aus_config.parse().ok())
        .unwrap_or_default()
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    format.parse::<LogFormat>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level), "{level} muss gueltig sein");
        }
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig("INFO"));
        assert!(!log_level_gueltig(""));
    }

    #[test]
    fn log_format_parsen() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("JSON".parse::<LogFormat>().is_err());
        assert!(!log_format_gueltig("xml"));
    }

    #[test]
    fn umgebung_hat_vorrang_vor_config() {
        assert_eq!(format_waehlen(Some("json"), "text"), LogFormat::Json);
        assert_eq!(format_waehlen(None, "json"), LogFormat::Json);
        // Unbekannter Wert in der Umgebung wird ignoriert
        assert_eq!(format_waehlen(Some("xml"), "json"), LogFormat::Json);
        assert_eq!(format_waehlen(None, "xml"), LogFormat::Text);
    }

    #[test]
    fn filter_direktiven() {
        use tracing_subscriber::filter::LevelFilter;

        let filter = filter_bauen(Some("warn,signgate_gateway=debug"), "error");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = filter_bauen(None, "error");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }
}
