//! Message-Router – Ordnet eingehende Events ihren Handlern zu
//!
//! Jedes Event erzeugt eine Liste von [`Zustellung`]en. Frames und
//! Chat-Nachrichten beantworten genau den Absender; Session-Events koennen
//! zusaetzlich eine nachgerueckte Verbindung benachrichtigen.
//!
//! Fehler von Kollaboratoren und ungueltige Eingaben werden hier in
//! Antworttexte umgewandelt. Sie beenden weder die Verbindung noch den
//! Prozess.

use signgate_core::ConnectionId;
use signgate_protocol::events::{
    PRAEFIX_CHAT_FEHLER, TEXT_AKTIV, TEXT_NICHT_AKTIV, TEXT_WARTESCHLANGE,
};
use signgate_protocol::{ClientEvent, ServerEvent};
use std::sync::Arc;

use crate::arbiter::Zuteilung;
use crate::kollaborator::abgesichert;
use crate::state::{GatewayState, SitzungsKern};

/// Eine ausgehende Nachricht mit Empfaenger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zustellung {
    pub an: ConnectionId,
    pub event: ServerEvent,
}

impl Zustellung {
    pub fn neu(an: ConnectionId, event: ServerEvent) -> Self {
        Self { an, event }
    }
}

/// Zentraler Router fuer alle Client-Events
#[derive(Clone)]
pub struct MessageRouter {
    state: Arc<GatewayState>,
}

impl MessageRouter {
    /// Erstellt einen neuen Router
    pub fn neu(state: Arc<GatewayState>) -> Self {
        Self { state }
    }

    /// Verarbeitet ein Event und stellt alle Antworten ueber die Registry zu
    pub async fn verarbeiten(&self, id: ConnectionId, event: ClientEvent) {
        let zustellungen = self.dispatch(id, event).await;
        self.zustellen(zustellungen);
    }

    /// Bestimmt die Antworten auf ein Event ohne sie zu versenden
    pub async fn dispatch(&self, id: ConnectionId, event: ClientEvent) -> Vec<Zustellung> {
        tracing::trace!(connection = %id, event = event.name(), "Event empfangen");

        match event {
            ClientEvent::BeginSession => vec![self.sitzung_beginnen(id)],
            ClientEvent::Frame(payload) => vec![self.frame(id, payload.data).await],
            ClientEvent::EndSession => self.freigeben(id).into_iter().collect(),
            ClientEvent::ChatMessage(payload) => vec![self.chat(id, &payload.message).await],
        }
    }

    /// Raeumt nach dem Trennen einer Verbindung auf
    ///
    /// Entfernt die Verbindung aus Registry und Arbiter und benachrichtigt
    /// eine eventuell nachgerueckte Verbindung.
    pub fn getrennt(&self, id: ConnectionId) {
        self.state.registry.entfernen(&id);
        let befoerdert = self.freigeben(id);
        self.zustellen(befoerdert);
        tracing::debug!(connection = %id, "Verbindung aufgeraeumt");
    }

    /// Reiht alle Zustellungen in die Send-Queues ein
    ///
    /// Gibt die Anzahl erfolgreich eingereihter Nachrichten zurueck.
    pub fn zustellen(&self, zustellungen: impl IntoIterator<Item = Zustellung>) -> usize {
        zustellungen
            .into_iter()
            .filter(|z| self.state.registry.senden(&z.an, z.event.clone()))
            .count()
    }

    // -----------------------------------------------------------------------
    // Handler
    // -----------------------------------------------------------------------

    fn sitzung_beginnen(&self, id: ConnectionId) -> Zustellung {
        let zuteilung = {
            let mut kern = self.state.kern.lock();
            let war_aktiv = kern.arbiter.ist_aktiv(&id);
            let zuteilung = kern.arbiter.aktiv_anfordern(id);
            if zuteilung == Zuteilung::Erteilt && !war_aktiv {
                self.state.metriken.active_grants_total.inc();
            }
            self.warteschlange_messen(&kern);
            zuteilung
        };

        match zuteilung {
            Zuteilung::Erteilt => {
                tracing::info!(connection = %id, "Aktive Rolle erteilt");
                Zustellung::neu(id, ServerEvent::response(TEXT_AKTIV))
            }
            Zuteilung::Eingereiht => {
                tracing::info!(connection = %id, "In Warteschlange eingereiht");
                Zustellung::neu(id, ServerEvent::response(TEXT_WARTESCHLANGE))
            }
        }
    }

    /// Gibt Rolle bzw. Warteplatz frei und liefert ggf. die Benachrichtigung
    /// fuer die nachgerueckte Verbindung
    fn freigeben(&self, id: ConnectionId) -> Option<Zustellung> {
        let befoerdert = {
            let mut kern = self.state.kern.lock();
            let befoerdert = kern.arbiter.freigeben(&id);
            if befoerdert.is_some() {
                self.state.metriken.active_grants_total.inc();
            }
            self.warteschlange_messen(&kern);
            befoerdert
        };

        befoerdert.map(|naechster| {
            tracing::info!(von = %id, an = %naechster, "Aktive Rolle weitergegeben");
            Zustellung::neu(naechster, ServerEvent::response(TEXT_AKTIV))
        })
    }

    async fn frame(&self, id: ConnectionId, roh: String) -> Zustellung {
        let aktiv = self.state.kern.lock().arbiter.ist_aktiv(&id);
        if !aktiv {
            tracing::debug!(connection = %id, "Frame von nicht-aktiver Verbindung");
            self.state.metriken.frame_zaehlen("not_active");
            return Zustellung::neu(id, ServerEvent::response(TEXT_NICHT_AKTIV));
        }

        let ergebnis = self.state.frames.handle(id, roh).await;
        self.state.metriken.frame_zaehlen(ergebnis.outcome());
        Zustellung::neu(id, ergebnis.into_event())
    }

    async fn chat(&self, id: ConnectionId, frage: &str) -> Zustellung {
        match abgesichert(self.state.answerer.answer(frage)).await {
            Ok(antwort) => {
                self.state.metriken.chat_zaehlen("answered");
                Zustellung::neu(id, ServerEvent::response(antwort))
            }
            Err(e) => {
                tracing::warn!(connection = %id, fehler = %e, "Antwort-Service fehlgeschlagen");
                self.state.metriken.chat_zaehlen("failed");
                Zustellung::neu(id, ServerEvent::fehler(PRAEFIX_CHAT_FEHLER, e))
            }
        }
    }

    fn warteschlange_messen(&self, kern: &SitzungsKern) {
        self.state
            .metriken
            .waiting_clients
            .set(kern.arbiter.wartend_anzahl() as f64);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
