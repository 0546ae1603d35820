//! Session-Arbiter – Exklusive aktive Rolle mit FIFO-Warteschlange
//!
//! Genau eine Verbindung darf Frames senden. Alle weiteren Anfragen werden
//! in Ankunftsreihenfolge eingereiht und beim Freigeben der aktiven Rolle
//! nachgerueckt.
//!
//! Der Arbiter selbst ist nicht synchronisiert. Er liegt zusammen mit dem
//! Label-Filter im [`SitzungsKern`](crate::state::SitzungsKern) hinter einem
//! einzigen Mutex.
//!
//! ## Invarianten
//! - `aktiv` ist `None` oder genau eine Verbindung
//! - die aktive Verbindung steht nie in der Warteschlange
//! - die Warteschlange enthaelt keine Duplikate (`mitglieder` spiegelt sie)

use signgate_core::ConnectionId;
use std::collections::{HashSet, VecDeque};

/// Ergebnis von [`SessionArbiter::aktiv_anfordern`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zuteilung {
    /// Verbindung ist jetzt (oder bereits) aktiv
    Erteilt,
    /// Verbindung wartet in der Warteschlange
    Eingereiht,
}

/// Besitzt die aktive Rolle und die Warteschlange
#[derive(Debug, Default)]
pub struct SessionArbiter {
    aktiv: Option<ConnectionId>,
    wartend: VecDeque<ConnectionId>,
    mitglieder: HashSet<ConnectionId>,
}

impl SessionArbiter {
    /// Erstellt einen leeren Arbiter
    pub fn neu() -> Self {
        Self::default()
    }

    /// Fordert die aktive Rolle an
    ///
    /// Ist niemand aktiv, wird `id` sofort aktiv. Sonst wird `id` hinten
    /// eingereiht, sofern sie nicht schon wartet. Mehrfache Anfragen aendern
    /// nichts am Zustand.
    pub fn aktiv_anfordern(&mut self, id: ConnectionId) -> Zuteilung {
        match self.aktiv {
            None => {
                self.aktiv = Some(id);
                Zuteilung::Erteilt
            }
            Some(aktiv) if aktiv == id => Zuteilung::Erteilt,
            Some(_) => {
                if self.mitglieder.insert(id) {
                    self.wartend.push_back(id);
                }
                Zuteilung::Eingereiht
            }
        }
    }

    /// Prueft ob `id` die aktive Verbindung ist
    pub fn ist_aktiv(&self, id: &ConnectionId) -> bool {
        self.aktiv.as_ref() == Some(id)
    }

    /// Gibt die aktive Rolle bzw. den Warteplatz von `id` frei
    ///
    /// War `id` aktiv, rueckt der Kopf der Warteschlange nach und wird
    /// zurueckgegeben (der Aufrufer muss ihn benachrichtigen). Wartete `id`
    /// nur, wird sie entfernt. Unbekannte IDs sind ein No-op.
    pub fn freigeben(&mut self, id: &ConnectionId) -> Option<ConnectionId> {
        if self.ist_aktiv(id) {
            self.aktiv = self.wartend.pop_front();
            if let Some(naechster) = self.aktiv {
                self.mitglieder.remove(&naechster);
            }
            return self.aktiv;
        }

        if self.mitglieder.remove(id) {
            self.wartend.retain(|w| w != id);
        }
        None
    }

    /// Gibt die aktive Verbindung zurueck
    pub fn aktiv(&self) -> Option<ConnectionId> {
        self.aktiv
    }

    /// Anzahl wartender Verbindungen
    pub fn wartend_anzahl(&self) -> usize {
        self.wartend.len()
    }

    /// Position von `id` in der Warteschlange (0 = naechster)
    pub fn position(&self, id: &ConnectionId) -> Option<usize> {
        if !self.mitglieder.contains(id) {
            return None;
        }
        self.wartend.iter().position(|w| w == id)
    }

    /// Warteschlange in Reihenfolge
    pub fn wartend(&self) -> impl Iterator<Item = &ConnectionId> {
        self.wartend.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erste_anfrage_wird_aktiv() {
        let mut arbiter = SessionArbiter::neu();
        let a = ConnectionId::new();

        assert_eq!(arbiter.aktiv_anfordern(a), Zuteilung::Erteilt);
        assert!(arbiter.ist_aktiv(&a));
        assert_eq!(arbiter.wartend_anzahl(), 0);
    }

    #[test]
    fn zweite_anfrage_wird_eingereiht() {
        let mut arbiter = SessionArbiter::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        arbiter.aktiv_anfordern(a);
        assert_eq!(arbiter.aktiv_anfordern(b), Zuteilung::Eingereiht);
        assert!(!arbiter.ist_aktiv(&b));
        assert_eq!(arbiter.position(&b), Some(0));
    }

    #[test]
    fn doppelte_anfrage_erzeugt_kein_duplikat() {
        let mut arbiter = SessionArbiter::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        arbiter.aktiv_anfordern(a);
        arbiter.aktiv_anfordern(b);
        assert_eq!(arbiter.aktiv_anfordern(b), Zuteilung::Eingereiht);

        assert_eq!(arbiter.wartend_anzahl(), 1);
        assert_eq!(arbiter.wartend().filter(|w| **w == b).count(), 1);
    }

    #[test]
    fn aktive_verbindung_fordert_erneut_an() {
        let mut arbiter = SessionArbiter::neu();
        let a = ConnectionId::new();

        arbiter.aktiv_anfordern(a);
        assert_eq!(arbiter.aktiv_anfordern(a), Zuteilung::Erteilt);
        assert_eq!(arbiter.wartend_anzahl(), 0);
        assert_eq!(arbiter.aktiv(), Some(a));
    }

    #[test]
    fn freigabe_befoerdert_in_fifo_reihenfolge() {
        let mut arbiter = SessionArbiter::neu();
        let c = ConnectionId::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        arbiter.aktiv_anfordern(c);
        arbiter.aktiv_anfordern(a);
        arbiter.aktiv_anfordern(b);

        assert_eq!(arbiter.freigeben(&c), Some(a));
        assert!(arbiter.ist_aktiv(&a));
        assert_eq!(arbiter.position(&a), None);

        assert_eq!(arbiter.freigeben(&a), Some(b));
        assert!(arbiter.ist_aktiv(&b));

        assert_eq!(arbiter.freigeben(&b), None);
        assert_eq!(arbiter.aktiv(), None);
    }

    #[test]
    fn wartende_verbindung_trennt_sich() {
        let mut arbiter = SessionArbiter::neu();
        let c = ConnectionId::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        arbiter.aktiv_anfordern(c);
        arbiter.aktiv_anfordern(a);
        arbiter.aktiv_anfordern(b);

        // a verlaesst die Warteschlange, c bleibt aktiv
        assert_eq!(arbiter.freigeben(&a), None);
        assert!(arbiter.ist_aktiv(&c));
        assert_eq!(arbiter.position(&b), Some(0));

        // Beim Freigeben von c rueckt b nach, nicht a
        assert_eq!(arbiter.freigeben(&c), Some(b));
    }

    #[test]
    fn freigabe_unbekannter_id_ist_noop() {
        let mut arbiter = SessionArbiter::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let fremd = ConnectionId::new();

        assert_eq!(arbiter.freigeben(&fremd), None);

        arbiter.aktiv_anfordern(a);
        arbiter.aktiv_anfordern(b);
        assert_eq!(arbiter.freigeben(&fremd), None);
        assert!(arbiter.ist_aktiv(&a));
        assert_eq!(arbiter.wartend_anzahl(), 1);
    }

    #[test]
    fn wieder_einreihen_nach_freigabe() {
        let mut arbiter = SessionArbiter::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        arbiter.aktiv_anfordern(a);
        arbiter.aktiv_anfordern(b);
        arbiter.freigeben(&b);

        // b darf sich erneut anstellen
        assert_eq!(arbiter.aktiv_anfordern(b), Zuteilung::Eingereiht);
        assert_eq!(arbiter.wartend_anzahl(), 1);
    }
}
