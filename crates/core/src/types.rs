//! Gemeinsame Identifikations- und Ergebnistypen fuer Signgate
//!
//! IDs verwenden das Newtype-Pattern um Verwechslungen zur Compilezeit
//! auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Verbindungs-ID
///
/// Wird beim Akzeptieren einer Transport-Verbindung vergeben und hat nach
/// dem Trennen keine Bedeutung mehr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Name einer erkannten Geste (z.B. `All_Fingers_Up`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ergebnis einer Klassifikation
///
/// `Keine` ist ein eigenstaendiger Wert und nimmt wie jedes Label an der
/// Duplikat-Unterdrueckung teil. Es wird als `None` angezeigt; Klassifikatoren
/// liefern ein Label mit diesem Text daher als `Keine`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Erkennung {
    /// Eine Geste wurde erkannt
    Geste(Label),
    /// Kein auswertbares Motiv im Bild
    Keine,
}

impl From<Option<Label>> for Erkennung {
    fn from(label: Option<Label>) -> Self {
        match label {
            Some(l) => Self::Geste(l),
            None => Self::Keine,
        }
    }
}

impl std::fmt::Display for Erkennung {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geste(label) => write!(f, "{label}"),
            Self::Keine => f.write_str("None"),
        }
    }
}
