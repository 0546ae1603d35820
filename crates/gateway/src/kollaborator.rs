//! Schnittstellen zu den externen Modell-Services
//!
//! Der Gateway kennt weder das Klassifikationsmodell noch die Antwort-
//! Pipeline. Er ruft sie ueber [`Classifier`] und [`Answerer`] auf; beide
//! duerfen langsam sein und fehlschlagen.

use async_trait::async_trait;
use futures_util::FutureExt;
use signgate_core::Label;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use crate::error::KollaboratorFehler;

/// Dekodiertes Rasterbild eines Frames
///
/// Haelt neben den Pixeln auch die urspruenglichen PNG-Bytes, damit ein
/// entfernter Klassifikator das Bild ohne erneutes Kodieren erhaelt.
#[derive(Debug, Clone)]
pub struct RasterBild {
    pub breite: u32,
    pub hoehe: u32,
    pub farbtyp: png::ColorType,
    pub bit_tiefe: png::BitDepth,
    /// Pixeldaten des ersten Frames, zeilenweise
    pub pixel: Vec<u8>,
    /// Urspruengliche PNG-Datei
    pub png: Vec<u8>,
}

/// Bildklassifikator (z.B. Handgesten-Modell)
///
/// Gibt `None` zurueck wenn im Bild nichts erkannt wurde. Die Normalisierung
/// auf die Modell-Aufloesung ist Sache der Implementierung.
#[async_trait]
pub trait Classifier: Send + Sync + 'static {
    async fn classify(&self, bild: &RasterBild) -> Result<Option<Label>, KollaboratorFehler>;
}

/// Antwort-Service fuer Freitext-Fragen (Retrieval + Generierung)
#[async_trait]
pub trait Answerer: Send + Sync + 'static {
    async fn answer(&self, frage: &str) -> Result<String, KollaboratorFehler>;
}

/// Fuehrt einen Kollaborator-Aufruf aus und wandelt einen Panic in
/// [`KollaboratorFehler::Abgebrochen`] um.
pub async fn abgesichert<T, F>(aufruf: F) -> Result<T, KollaboratorFehler>
where
    F: Future<Output = Result<T, KollaboratorFehler>>,
{
    match AssertUnwindSafe(aufruf).catch_unwind().await {
        Ok(ergebnis) => ergebnis,
        Err(panic) => {
            let grund = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            Err(KollaboratorFehler::Abgebrochen(grund))
        }
    }
}
