//! Fehlertypen fuer Signgate
//!
//! Zentraler Fehler-Enum fuer crate-uebergreifende Fehlerzustaende.
//! Untermodule definieren eigene Fehler und konvertieren via `#[from]`.

use thiserror::Error;

/// Globaler Result-Alias fuer Signgate
pub type Result<T> = std::result::Result<T, SigngateError>;

/// Crate-uebergreifende Fehler im Signgate-System
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SigngateError {
    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    #[error("Ungueltige Adresse '{adresse}': {grund}")]
    Adresse { adresse: String, grund: String },
}

impl SigngateError {
    /// Erstellt einen Konfigurationsfehler aus einer beliebigen Nachricht
    pub fn konfiguration(msg: impl Into<String>) -> Self {
        Self::Konfiguration(msg.into())
    }
}
