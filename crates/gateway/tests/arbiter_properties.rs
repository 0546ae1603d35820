//! Property-Tests fuer den SessionArbiter
//!
//! Beliebige Folgen von Anfragen und Freigaben werden gegen ein einfaches
//! Referenzmodell (Option + Vec) geprueft.

use proptest::prelude::*;
use signgate_core::ConnectionId;
use signgate_gateway::{SessionArbiter, Zuteilung};
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Aktion {
    Anfordern(usize),
    Freigeben(usize),
}

fn arb_aktion() -> impl Strategy<Value = Aktion> {
    prop_oneof![
        (0..6usize).prop_map(Aktion::Anfordern),
        (0..6usize).prop_map(Aktion::Freigeben),
    ]
}

/// Referenzmodell mit linearer Suche
#[derive(Default)]
struct Modell {
    aktiv: Option<usize>,
    wartend: Vec<usize>,
}

impl Modell {
    fn anfordern(&mut self, i: usize) -> Zuteilung {
        match self.aktiv {
            None => {
                self.aktiv = Some(i);
                Zuteilung::Erteilt
            }
            Some(a) if a == i => Zuteilung::Erteilt,
            Some(_) => {
                if !self.wartend.contains(&i) {
                    self.wartend.push(i);
                }
                Zuteilung::Eingereiht
            }
        }
    }

    fn freigeben(&mut self, i: usize) -> Option<usize> {
        if self.aktiv == Some(i) {
            self.aktiv = if self.wartend.is_empty() {
                None
            } else {
                Some(self.wartend.remove(0))
            };
            return self.aktiv;
        }
        self.wartend.retain(|w| *w != i);
        None
    }
}

fn invarianten_pruefen(arbiter: &SessionArbiter) -> Result<(), TestCaseError> {
    let wartend: Vec<ConnectionId> = arbiter.wartend().copied().collect();
    let eindeutig: HashSet<_> = wartend.iter().collect();
    prop_assert_eq!(eindeutig.len(), wartend.len(), "Duplikat in der Warteschlange");

    if let Some(aktiv) = arbiter.aktiv() {
        prop_assert!(!wartend.contains(&aktiv), "aktive Verbindung wartet");
        prop_assert_eq!(arbiter.position(&aktiv), None);
    }

    for (i, id) in wartend.iter().enumerate() {
        prop_assert_eq!(arbiter.position(id), Some(i));
    }
    prop_assert_eq!(arbiter.wartend_anzahl(), wartend.len());
    Ok(())
}

proptest! {
    #[test]
    fn arbiter_entspricht_dem_modell(aktionen in prop::collection::vec(arb_aktion(), 0..64)) {
        let ids: Vec<ConnectionId> = (0..6).map(|_| ConnectionId::new()).collect();
        let mut arbiter = SessionArbiter::neu();
        let mut modell = Modell::default();

        for aktion in aktionen {
            match aktion {
                Aktion::Anfordern(i) => {
                    prop_assert_eq!(arbiter.aktiv_anfordern(ids[i]), modell.anfordern(i));
                }
                Aktion::Freigeben(i) => {
                    let erwartet = modell.freigeben(i).map(|j| ids[j]);
                    prop_assert_eq!(arbiter.freigeben(&ids[i]), erwartet);
                }
            }

            invarianten_pruefen(&arbiter)?;
            prop_assert_eq!(arbiter.aktiv(), modell.aktiv.map(|j| ids[j]));
            let wartend: Vec<ConnectionId> = arbiter.wartend().copied().collect();
            let erwartet: Vec<ConnectionId> = modell.wartend.iter().map(|j| ids[*j]).collect();
            prop_assert_eq!(wartend, erwartet);
        }
    }

    #[test]
    fn freigabe_aller_verbindungen_leert_den_arbiter(
        reihenfolge in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let ids: Vec<ConnectionId> = (0..6).map(|_| ConnectionId::new()).collect();
        let mut arbiter = SessionArbiter::neu();
        for id in &ids {
            arbiter.aktiv_anfordern(*id);
        }

        for i in reihenfolge {
            arbiter.freigeben(&ids[i]);
            invarianten_pruefen(&arbiter)?;
        }

        prop_assert_eq!(arbiter.aktiv(), None);
        prop_assert_eq!(arbiter.wartend_anzahl(), 0);
    }
}
