//! Frame-Verarbeitung – Validieren, Dekodieren, Klassifizieren, Entprellen
//!
//! Ablauf fuer einen Frame der aktiven Verbindung:
//!
//! ```text
//! Data-URI pruefen -> Base64 -> PNG -> Classifier   (ohne Lock)
//!                                         |
//!                                         v
//!                     Lock: noch aktiv? -> LabelFilter -> Ergebnis
//! ```
//!
//! Die Klassifikation laeuft ausserhalb des Locks. Wird die Verbindung
//! waehrenddessen freigegeben, verwirft der zweite Lock-Abschnitt das
//! Ergebnis und der [`LabelFilter`] bleibt unveraendert.

use base64::Engine;
use parking_lot::Mutex;
use signgate_core::{ConnectionId, Erkennung};
use signgate_observability::GatewayMetrics;
use signgate_protocol::events::{
    ServerEvent, PRAEFIX_BILD_FEHLER, TEXT_BEREITS_GEMELDET, TEXT_NICHT_AKTIV,
};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use crate::error::FrameFehler;
use crate::kollaborator::{abgesichert, Classifier, RasterBild};
use crate::state::SitzungsKern;

/// Fester Praefix jeder Frame-Nutzlast
pub const DATA_URI_PRAEFIX: &str = "data:image/png;base64,";

// ---------------------------------------------------------------------------
// Dekodierung
// ---------------------------------------------------------------------------

/// Prueft die Data-URI und dekodiert das enthaltene PNG
///
/// Bilder mit mehr als `max_pixel` Pixeln werden abgelehnt, bevor der
/// Pixelpuffer angelegt wird.
pub fn payload_dekodieren(roh: &str, max_pixel: u64) -> Result<RasterBild, FrameFehler> {
    if roh.is_empty() {
        return Err(FrameFehler::KeineDaten);
    }
    let koerper = roh
        .strip_prefix(DATA_URI_PRAEFIX)
        .ok_or(FrameFehler::UngueltigesFormat)?;

    let png_bytes = base64::engine::general_purpose::STANDARD.decode(koerper)?;
    png_dekodieren(png_bytes, max_pixel)
}

fn png_dekodieren(png_bytes: Vec<u8>, max_pixel: u64) -> Result<RasterBild, FrameFehler> {
    let decoder = png::Decoder::new(Cursor::new(png_bytes.as_slice()));
    let mut reader = decoder.read_info()?;

    // Der Header allein bestimmt die Puffergroesse
    let (breite, hoehe) = reader.info().size();
    let pixel_anzahl = u64::from(breite)
        .checked_mul(u64::from(hoehe))
        .filter(|&n| n <= max_pixel);
    if pixel_anzahl.is_none() {
        return Err(FrameFehler::ZuGross {
            breite,
            hoehe,
            max: max_pixel,
        });
    }

    let mut pixel = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut pixel)?;
    pixel.truncate(info.buffer_size());

    Ok(RasterBild {
        breite: info.width,
        hoehe: info.height,
        farbtyp: info.color_type,
        bit_tiefe: info.bit_depth,
        pixel,
        png: png_bytes,
    })
}

// ---------------------------------------------------------------------------
// LabelFilter
// ---------------------------------------------------------------------------

/// Unterdrueckt aufeinanderfolgende gleiche Erkennungen
///
/// Prozessweit: ein Wechsel der aktiven Verbindung setzt den Filter nicht
/// zurueck. `Erkennung::Keine` zaehlt als eigener Wert.
#[derive(Debug, Default)]
pub struct LabelFilter {
    letzte: Option<Erkennung>,
}

impl LabelFilter {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Vergleicht mit der zuletzt gemeldeten Erkennung und merkt sich neue
    pub fn pruefen(&mut self, erkennung: Erkennung) -> FrameErgebnis {
        if self.letzte.as_ref() == Some(&erkennung) {
            return FrameErgebnis::Duplikat;
        }
        self.letzte = Some(erkennung.clone());
        FrameErgebnis::Neu(erkennung)
    }

    /// Zuletzt gemeldete Erkennung
    pub fn letzte(&self) -> Option<&Erkennung> {
        self.letzte.as_ref()
    }
}

// ---------------------------------------------------------------------------
// FrameErgebnis
// ---------------------------------------------------------------------------

/// Ergebnis der Verarbeitung eines Frames
#[derive(Debug)]
pub enum FrameErgebnis {
    /// Neue Erkennung, wird gemeldet
    Neu(Erkennung),
    /// Gleich der zuletzt gemeldeten Erkennung
    Duplikat,
    /// Verbindung war zum Abschluss nicht mehr aktiv
    Verdraengt,
    /// Frame konnte nicht verarbeitet werden
    Fehler(FrameFehler),
}

impl FrameErgebnis {
    /// Metrik-Label
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Neu(_) => "label",
            Self::Duplikat => "duplicate",
            Self::Verdraengt => "superseded",
            Self::Fehler(e) => e.outcome(),
        }
    }

    /// Wandelt das Ergebnis in die Antwort an den Client
    pub fn into_event(self) -> ServerEvent {
        match self {
            Self::Neu(erkennung) => ServerEvent::response(erkennung.to_string()),
            Self::Duplikat => ServerEvent::response(TEXT_BEREITS_GEMELDET),
            Self::Verdraengt => ServerEvent::response(TEXT_NICHT_AKTIV),
            Self::Fehler(e) => ServerEvent::fehler(PRAEFIX_BILD_FEHLER, e),
        }
    }
}

// ---------------------------------------------------------------------------
// FrameProcessor
// ---------------------------------------------------------------------------

/// Verarbeitet Frames der aktiven Verbindung
///
/// Darf nur aufgerufen werden wenn die Verbindung aktiv ist; der
/// [`MessageRouter`](crate::router::MessageRouter) prueft das vorher.
pub struct FrameProcessor {
    classifier: Arc<dyn Classifier>,
    kern: Arc<Mutex<SitzungsKern>>,
    metriken: GatewayMetrics,
    max_bild_pixel: u64,
}

impl FrameProcessor {
    pub fn neu(
        classifier: Arc<dyn Classifier>,
        kern: Arc<Mutex<SitzungsKern>>,
        metriken: GatewayMetrics,
        max_bild_pixel: u64,
    ) -> Self {
        Self {
            classifier,
            kern,
            metriken,
            max_bild_pixel,
        }
    }

    /// Verarbeitet die rohe Nutzlast eines Frames von `id`
    ///
    /// Base64- und PNG-Dekodierung laufen im Blocking-Pool.
    pub async fn handle(&self, id: ConnectionId, roh: String) -> FrameErgebnis {
        let max_pixel = self.max_bild_pixel;
        let dekodiert = tokio::task::spawn_blocking(move || payload_dekodieren(&roh, max_pixel))
            .await
            .unwrap_or_else(|e| Err(FrameFehler::Abgebrochen(e.to_string())));

        let bild = match dekodiert {
            Ok(bild) => bild,
            Err(e) => {
                tracing::debug!(connection = %id, fehler = %e, "Frame ungueltig");
                return FrameErgebnis::Fehler(e);
            }
        };

        let start = Instant::now();
        let klassifikation = abgesichert(self.classifier.classify(&bild)).await;
        self.metriken
            .classification_duration_seconds
            .observe(start.elapsed().as_secs_f64());

        let erkennung = match klassifikation {
            Ok(label) => Erkennung::from(label),
            Err(e) => {
                tracing::warn!(connection = %id, fehler = %e, "Klassifikation fehlgeschlagen");
                return FrameErgebnis::Fehler(e.into());
            }
        };

        let mut kern = self.kern.lock();
        if !kern.arbiter.ist_aktiv(&id) {
            tracing::debug!(
                connection = %id,
                "Verbindung waehrend der Klassifikation freigegeben – Ergebnis verworfen"
            );
            return FrameErgebnis::Verdraengt;
        }
        kern.labels.pruefen(erkennung)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
