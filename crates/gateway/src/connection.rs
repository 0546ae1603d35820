//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Events einer Verbindung werden der Reihe nach verarbeitet;
//! verschiedene Verbindungen laufen nebenlaeufig.
//!
//! ## Ablauf
//! ```text
//! registrieren -> Schleife (Eingang | Send-Queue | Shutdown) -> getrennt
//! ```
//!
//! Das Aufraeumen (`MessageRouter::getrennt`) laeuft immer, egal ob der
//! Client die Verbindung schliesst, ein Lesefehler auftritt oder der Server
//! herunterfaehrt.

use futures_util::{SinkExt, StreamExt};
use signgate_core::ConnectionId;
use signgate_protocol::events::PRAEFIX_UNGUELTIG;
use signgate_protocol::{ServerCodec, ServerEvent};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;

use crate::router::{MessageRouter, Zustellung};
use crate::state::GatewayState;

/// Abschiedsnachricht beim Herunterfahren
pub const TEXT_ABSCHIED: &str = "Server is shutting down";

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Die Verbindung wird schon in [`ClientConnection::neu`] in der Registry
/// angemeldet, damit das Client-Limit beim Akzeptieren stimmt.
pub struct ClientConnection {
    state: Arc<GatewayState>,
    router: MessageRouter,
    peer_addr: SocketAddr,
    id: ConnectionId,
    sende_rx: mpsc::Receiver<ServerEvent>,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection und registriert sie
    pub fn neu(state: Arc<GatewayState>, peer_addr: SocketAddr) -> Self {
        let id = ConnectionId::new();
        let sende_rx = state.registry.registrieren(id);
        state.metriken.connected_clients.inc();

        Self {
            router: MessageRouter::neu(Arc::clone(&state)),
            state,
            peer_addr,
            id,
            sende_rx,
        }
    }

    /// ID dieser Verbindung
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird oder ein Shutdown-Signal
    /// eingeht.
    pub async fn verarbeiten(mut self, stream: TcpStream, mut shutdown_rx: watch::Receiver<bool>) {
        let peer_addr = self.peer_addr;
        let id = self.id;

        tracing::info!(peer = %peer_addr, connection = %id, "Client verbunden");

        let codec = ServerCodec::with_max_size(self.state.config.max_frame_groesse);
        let mut framed = Framed::new(stream, codec);

        let mut herunterfahren = *shutdown_rx.borrow();

        while !herunterfahren {
            tokio::select! {
                // Eingehendes Event vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(Ok(event))) => {
                            self.router.verarbeiten(id, event).await;
                        }
                        Some(Ok(Err(e))) => {
                            tracing::debug!(connection = %id, fehler = %e, "Ungueltige Anfrage");
                            self.router.zustellen([Zustellung::neu(
                                id,
                                ServerEvent::fehler(PRAEFIX_UNGUELTIG, e),
                            )]);
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                peer = %peer_addr,
                                connection = %id,
                                fehler = %e,
                                "Frame-Lesefehler"
                            );
                            break;
                        }
                        None => {
                            tracing::info!(peer = %peer_addr, connection = %id, "Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehende Nachricht aus der Send-Queue
                Some(ausgehend) = self.sende_rx.recv() => {
                    if let Err(e) = framed.send(ausgehend).await {
                        tracing::warn!(connection = %id, fehler = %e, "Senden fehlgeschlagen");
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    herunterfahren = *shutdown_rx.borrow();
                }
            }
        }

        if herunterfahren {
            tracing::info!(connection = %id, "Shutdown-Signal – Verbindung wird getrennt");
            // Ausstehende Antworten noch zustellen, dann verabschieden
            while let Ok(ausstehend) = self.sende_rx.try_recv() {
                if framed.feed(ausstehend).await.is_err() {
                    break;
                }
            }
            let _ = framed.send(ServerEvent::response(TEXT_ABSCHIED)).await;
        }

        self.router.getrennt(id);
        self.state.metriken.connected_clients.dec();

        tracing::info!(peer = %peer_addr, connection = %id, "Verbindungs-Task beendet");
    }
}
