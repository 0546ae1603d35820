//! signgate-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use anyhow::{Context, Result};
use config::ServerConfig;
use signgate_gateway::{GatewayServer, GatewayState};
use signgate_inference::{HttpAnswerer, HttpClassifier};
use signgate_observability::{observability_server_starten, GatewayMetrics, HealthState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Wartezeit auf die Verabschiedung der Clients beim Herunterfahren
const ABSCHIED_FRIST: Duration = Duration::from_secs(2);

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Konfiguration pruefen
    /// 2. Modell-Services anbinden (HTTP)
    /// 3. TCP-Gateway starten
    /// 4. Observability-Server starten (optional)
    /// 5. Auf Ctrl-C warten, Clients verabschieden
    pub async fn starten(self) -> Result<()> {
        self.config.validieren()?;
        let tcp_addr = self.config.tcp_bind_adresse()?;

        let metriken = GatewayMetrics::neu()?;
        let health = HealthState::neu();

        let classifier = HttpClassifier::neu(
            self.config.klassifikator.url.clone(),
            self.config.klassifikator.timeout(),
        )
        .context("Klassifikator-Client konnte nicht erstellt werden")?;
        let answerer = HttpAnswerer::neu(
            self.config.antwort.url.clone(),
            self.config.antwort.timeout(),
        )
        .context("Antwort-Client konnte nicht erstellt werden")?;

        tracing::info!(
            klassifikator = %classifier.url(),
            antwort = %answerer.url(),
            "Modell-Services konfiguriert"
        );

        let state = GatewayState::neu(
            self.config.gateway_config(),
            Arc::new(classifier),
            Arc::new(answerer),
            metriken.clone(),
            health.clone(),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let gateway = GatewayServer::binden(Arc::clone(&state), tcp_addr)
            .await
            .with_context(|| format!("TCP-Gateway konnte nicht an {tcp_addr} binden"))?;
        let gateway_task = tokio::spawn(gateway.starten(shutdown_rx));

        if self.config.observability.aktiviert {
            let obs_addr = self.config.observability_bind_adresse()?;
            tokio::spawn(async move {
                if let Err(e) = observability_server_starten(obs_addr, metriken, health).await {
                    tracing::error!(fehler = %e, "Observability-Server beendet");
                }
            });
        }

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        // Listener und alle Verbindungs-Tasks beobachten denselben Kanal
        let _ = shutdown_tx.send(true);
        gateway_task.await??;

        let frist = tokio::time::Instant::now() + ABSCHIED_FRIST;
        while state.registry.anzahl() > 0 && tokio::time::Instant::now() < frist {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        tracing::info!(
            verbleibend = state.registry.anzahl(),
            uptime_sek = state.uptime_sek(),
            "Server beendet"
        );
        Ok(())
    }
}
