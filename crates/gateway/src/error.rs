//! Fehlertypen fuer den Gateway
//!
//! Die Texte von [`FrameFehler`] und [`KollaboratorFehler`] werden den
//! Clients als Grund angezeigt und sind daher englisch.

use thiserror::Error;

/// Fehlertyp fuer Verbindungs- und Server-Ebene
#[derive(Debug, Error)]
pub enum GatewayError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

/// Result-Typ fuer den Gateway
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Fehler eines externen Kollaborators (Klassifikator, Antwort-Service)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KollaboratorFehler {
    /// Service nicht erreichbar oder Zeitlimit ueberschritten
    #[error("service unavailable: {0}")]
    NichtErreichbar(String),

    /// Service hat mit einem Fehler geantwortet
    #[error("service error: {0}")]
    Antwort(String),

    /// Antwort konnte nicht interpretiert werden
    #[error("malformed service response: {0}")]
    UngueltigeAntwort(String),

    /// Aufruf ist abgebrochen (Panic im Kollaborator)
    #[error("collaborator aborted: {0}")]
    Abgebrochen(String),
}

/// Gruende warum ein Frame nicht klassifiziert werden konnte
#[derive(Debug, Error)]
pub enum FrameFehler {
    /// Leere Nutzlast
    #[error("No image data received.")]
    KeineDaten,

    /// Data-URI-Praefix fehlt
    #[error("Invalid image format, expected base64 PNG image.")]
    UngueltigesFormat,

    /// Base64-Koerper nicht dekodierbar
    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Kein lesbares PNG
    #[error("Cannot identify image file: {0}")]
    Bild(#[from] png::DecodingError),

    /// Abmessungen im PNG-Header ueberschreiten das Pixel-Limit
    #[error("Image too large: {breite}x{hoehe} exceeds {max} pixels")]
    ZuGross { breite: u32, hoehe: u32, max: u64 },

    /// Dekodier-Task ist abgebrochen
    #[error("Image decoding aborted: {0}")]
    Abgebrochen(String),

    /// Klassifikator fehlgeschlagen
    #[error(transparent)]
    Klassifikation(#[from] KollaboratorFehler),
}

impl FrameFehler {
    /// Metrik-Label fuer das Frame-Ergebnis
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Klassifikation(_) => "classifier_error",
            _ => "malformed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_fehler_texte_bleiben_kompatibel() {
        assert_eq!(FrameFehler::KeineDaten.to_string(), "No image data received.");
        assert_eq!(
            FrameFehler::UngueltigesFormat.to_string(),
            "Invalid image format, expected base64 PNG image."
        );
    }

    #[test]
    fn kollaborator_fehler_wird_durchgereicht() {
        let fehler = FrameFehler::from(KollaboratorFehler::NichtErreichbar("timeout".into()));
        assert_eq!(fehler.to_string(), "service unavailable: timeout");
        assert_eq!(fehler.outcome(), "classifier_error");
        assert_eq!(FrameFehler::KeineDaten.outcome(), "malformed");
    }

    #[test]
    fn zu_grosses_bild_nennt_abmessungen() {
        let fehler = FrameFehler::ZuGross {
            breite: 60000,
            hoehe: 60000,
            max: 16_777_216,
        };
        assert_eq!(
            fehler.to_string(),
            "Image too large: 60000x60000 exceeds 16777216 pixels"
        );
        assert_eq!(fehler.outcome(), "malformed");
    }
}
