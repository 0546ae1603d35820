//! HTTP-Klassifikator
//!
//! Sendet das PNG eines Frames als Multipart-Upload (`image`) an den
//! Modell-Service und erwartet `{"label": "<name>" | null}`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use signgate_core::Label;
use signgate_gateway::{Classifier, KollaboratorFehler, RasterBild};
use std::time::Duration;

use crate::error::{status_pruefen, InferenceResult};

/// Antwort des Klassifikations-Services
#[derive(Debug, Deserialize)]
struct KlassifikationAntwort {
    #[serde(default)]
    label: Option<String>,
}

/// Klassifikator ueber einen entfernten Modell-Service
pub struct HttpClassifier {
    client: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    /// Erstellt einen Klassifikator fuer den Endpunkt `url`
    pub fn neu(url: impl Into<String>, timeout: Duration) -> InferenceResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Endpunkt-URL
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn anfragen(&self, png: Vec<u8>) -> InferenceResult<Option<Label>> {
        let form = Form::new().part(
            "image",
            Part::bytes(png)
                .file_name("frame.png")
                .mime_str("image/png")?,
        );

        let resp = self.client.post(&self.url).multipart(form).send().await?;
        let antwort: KlassifikationAntwort = status_pruefen(resp).await?.json().await?;

        Ok(label_auswerten(antwort.label))
    }
}

/// `null`, leerer String und `"None"` bedeuten "nichts erkannt"
///
/// `"None"` ist die Client-Darstellung von [`signgate_core::Erkennung::Keine`]
/// und wird daher nie als [`Label`] weitergegeben.
fn label_auswerten(label: Option<String>) -> Option<Label> {
    label
        .filter(|l| !l.is_empty() && l != KEIN_LABEL)
        .map(Label::new)
}

const KEIN_LABEL: &str = "None";

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, bild: &RasterBild) -> Result<Option<Label>, KollaboratorFehler> {
        tracing::trace!(
            breite = bild.breite,
            hoehe = bild.hoehe,
            bytes = bild.png.len(),
            "Klassifikation angefragt"
        );
        self.anfragen(bild.png.clone()).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_werte() {
        assert_eq!(label_auswerten(Some("Peace".into())), Some(Label::new("Peace")));
        assert_eq!(label_auswerten(None), None);
        assert_eq!(label_auswerten(Some(String::new())), None);
        assert_eq!(label_auswerten(Some("None".into())), None);
        // Nur die exakte Schreibweise ist reserviert
        assert_eq!(label_auswerten(Some("none".into())), Some(Label::new("none")));
    }
}
