//! Connection-Registry – Send-Queues aller verbundenen Clients
//!
//! Jede `ClientConnection` registriert sich beim Start und erhaelt eine
//! Empfangs-Queue. Der Router adressiert Antworten ueber die
//! [`ConnectionId`]; fuer getrennte Verbindungen werden Nachrichten
//! verworfen.

use dashmap::DashMap;
use signgate_core::ConnectionId;
use signgate_protocol::ServerEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub id: ConnectionId,
    pub tx: mpsc::Sender<ServerEvent>,
}

impl ClientSender {
    /// Sendet eine Nachricht nicht-blockierend an den Client
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, event: ServerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(connection = %self.id, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(connection = %self.id, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionRegistry
// ---------------------------------------------------------------------------

/// Verzeichnis aller verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct ConnectionRegistry {
    clients: Arc<DashMap<ConnectionId, ClientSender>>,
    queue_groesse: usize,
}

impl ConnectionRegistry {
    /// Erstellt eine leere Registry
    pub fn neu(queue_groesse: usize) -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
            queue_groesse: queue_groesse.max(1),
        }
    }

    /// Registriert eine Verbindung und gibt ihre Empfangs-Queue zurueck
    pub fn registrieren(&self, id: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(self.queue_groesse);
        self.clients.insert(id, ClientSender { id, tx });
        tracing::debug!(connection = %id, "Verbindung registriert");
        rx
    }

    /// Entfernt eine Verbindung
    pub fn entfernen(&self, id: &ConnectionId) {
        if self.clients.remove(id).is_some() {
            tracing::debug!(connection = %id, "Verbindung aus Registry entfernt");
        }
    }

    /// Sendet eine Nachricht an eine einzelne Verbindung
    ///
    /// Gibt `true` zurueck wenn die Verbindung bekannt ist und die Nachricht
    /// eingereiht wurde.
    pub fn senden(&self, id: &ConnectionId, event: ServerEvent) -> bool {
        // Sender klonen damit der DashMap-Shard nicht waehrend try_send gesperrt bleibt
        let sender = match self.clients.get(id) {
            Some(eintrag) => eintrag.value().clone(),
            None => {
                tracing::debug!(connection = %id, "Senden an unbekannte Verbindung");
                return false;
            }
        };
        sender.senden(event)
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_verbunden(&self, id: &ConnectionId) -> bool {
        self.clients.contains_key(id)
    }

    /// Anzahl registrierter Verbindungen
    pub fn anzahl(&self) -> usize {
        self.clients.len()
    }
}
