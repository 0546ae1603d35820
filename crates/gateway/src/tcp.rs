//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `GatewayServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task mit einer
//! `ClientConnection`.
//!
//! ## Concurrency-Modell
//! Alle geteilten Zustaende sind `Send + Sync` (DashMap, parking_lot::Mutex,
//! `Arc<dyn Classifier>`). Die Verbindungs-Tasks laufen daher mit
//! `tokio::spawn` auf dem Multi-Thread-Runtime.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::connection::ClientConnection;
use crate::error::GatewayResult;
use crate::state::GatewayState;

/// TCP-Gateway-Server
pub struct GatewayServer {
    state: Arc<GatewayState>,
    listener: TcpListener,
}

impl GatewayServer {
    /// Bindet den TCP-Socket
    ///
    /// Port 0 waehlt einen freien Port; die tatsaechliche Adresse liefert
    /// [`GatewayServer::lokale_addr`].
    pub async fn binden(state: Arc<GatewayState>, bind_addr: SocketAddr) -> GatewayResult<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        Ok(Self { state, listener })
    }

    /// Tatsaechlich gebundene Adresse
    pub fn lokale_addr(&self) -> GatewayResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Akzeptiert Verbindungen bis `shutdown_rx` ein `true`-Signal empfaengt
    pub async fn starten(self, mut shutdown_rx: watch::Receiver<bool>) -> GatewayResult<()> {
        let lokale_addr = self.lokale_addr()?;
        let max_clients = self.state.config.max_clients as usize;

        tracing::info!(adresse = %lokale_addr, max_clients, "TCP-Gateway gestartet");
        self.state.health.annahme_setzen(true);

        loop {
            tokio::select! {
                // Neue eingehende Verbindung
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            // Client-Limit pruefen
                            if self.state.registry.anzahl() >= max_clients {
                                tracing::warn!(
                                    peer = %peer_addr,
                                    max = max_clients,
                                    "Gateway voll – Verbindung abgelehnt"
                                );
                                drop(stream);
                                continue;
                            }

                            if let Err(e) = stream.set_nodelay(true) {
                                tracing::debug!(peer = %peer_addr, fehler = %e, "TCP_NODELAY nicht gesetzt");
                            }

                            let verbindung = ClientConnection::neu(Arc::clone(&self.state), peer_addr);
                            let shutdown_rx_clone = shutdown_rx.clone();

                            tokio::spawn(async move {
                                verbindung.verarbeiten(stream, shutdown_rx_clone).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                // Shutdown-Signal
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::info!("Gateway: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        self.state.health.annahme_setzen(false);
        tracing::info!("TCP-Gateway gestoppt");
        Ok(())
    }
}
