//! Benannte Events (Client <-> Gateway)
//!
//! Jede Nachricht auf der Leitung ist ein JSON-Objekt der Form
//! `{"event": "<name>", "data": {...}}`.
//!
//! ## Design
//! - Adjacently tagged Enums fuer typsichere Event-Namen
//! - Die Event-Namen der urspruenglichen Web-Clients (`cameracon`,
//!   `cameradisc`, `message`) werden als Aliase akzeptiert
//! - Alle Antworten laufen ueber das einzige Ausgangs-Event `response`

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Feste Antworttexte
// ---------------------------------------------------------------------------

/// Der Client ist jetzt die aktive Verbindung
pub const TEXT_AKTIV: &str = "You are now the active socket";

/// Der Client wurde in die Warteschlange eingereiht
pub const TEXT_WARTESCHLANGE: &str = "You are in the queue, waiting for your turn";

/// Frame von einer nicht-aktiven Verbindung
pub const TEXT_NICHT_AKTIV: &str = "Please wait, you are not the active socket";

/// Label entspricht dem zuletzt gemeldeten Label
pub const TEXT_BEREITS_GEMELDET: &str = "Already in list";

/// Praefix fuer fehlgeschlagene Bildverarbeitung
pub const PRAEFIX_BILD_FEHLER: &str = "Failed to process image";

/// Praefix fuer fehlgeschlagene Chat-Antworten
pub const PRAEFIX_CHAT_FEHLER: &str = "Failed to receive a response";

/// Praefix fuer nicht dekodierbare Anfragen
pub const PRAEFIX_UNGUELTIG: &str = "Invalid request";

// ---------------------------------------------------------------------------
// Eingehende Events
// ---------------------------------------------------------------------------

/// Nutzlast eines `frame`-Events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePayload {
    /// Data-URI: `data:image/png;base64,<b64>`
    #[serde(default)]
    pub data: String,
}

/// Nutzlast eines `chat-message`-Events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub message: String,
}

/// Alle Events die ein Client senden kann
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Aktive Rolle anfordern
    #[serde(alias = "cameracon")]
    BeginSession,
    /// Einzelbild zur Klassifikation
    Frame(FramePayload),
    /// Aktive Rolle bzw. Warteplatz freigeben
    #[serde(alias = "cameradisc")]
    EndSession,
    /// Freitext-Frage an den Antwort-Service
    #[serde(alias = "message")]
    ChatMessage(ChatPayload),
}

impl ClientEvent {
    /// Name des Events fuer Logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeginSession => "begin-session",
            Self::Frame(_) => "frame",
            Self::EndSession => "end-session",
            Self::ChatMessage(_) => "chat-message",
        }
    }

    /// Erstellt ein Frame-Event aus einer Data-URI
    pub fn frame(data: impl Into<String>) -> Self {
        Self::Frame(FramePayload { data: data.into() })
    }

    /// Erstellt ein Chat-Event
    pub fn chat(message: impl Into<String>) -> Self {
        Self::ChatMessage(ChatPayload {
            message: message.into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Ausgehende Events
// ---------------------------------------------------------------------------

/// Nutzlast eines `response`-Events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub message: String,
}

/// Alle Events die der Gateway sendet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Response(ResponsePayload),
}

impl ServerEvent {
    /// Erstellt eine `response`-Nachricht
    pub fn response(message: impl Into<String>) -> Self {
        Self::Response(ResponsePayload {
            message: message.into(),
        })
    }

    /// Antwort mit Fehler-Praefix (`<praefix>: <grund>`)
    pub fn fehler(praefix: &str, grund: impl std::fmt::Display) -> Self {
        Self::response(format!("{praefix}: {grund}"))
    }

    /// Gibt den Nachrichtentext zurueck
    pub fn message(&self) -> &str {
        match self {
            Self::Response(p) => &p.message,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
