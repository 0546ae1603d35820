//! HTTP-Antwort-Service
//!
//! Sendet `{"message": "<frage>"}` an die Retrieval-Pipeline und erwartet
//! `{"answer": "<text>"}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signgate_gateway::{Answerer, KollaboratorFehler};
use std::time::Duration;

use crate::error::{status_pruefen, InferenceResult};

#[derive(Debug, Serialize)]
struct FrageAnfrage<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct AntwortKoerper {
    answer: String,
}

/// Antwort-Service ueber HTTP
pub struct HttpAnswerer {
    client: reqwest::Client,
    url: String,
}

impl HttpAnswerer {
    pub fn neu(url: impl Into<String>, timeout: Duration) -> InferenceResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn anfragen(&self, frage: &str) -> InferenceResult<String> {
        let resp = self
            .client
            .post(&self.url)
            .json(&FrageAnfrage { message: frage })
            .send()
            .await?;
        let koerper: AntwortKoerper = status_pruefen(resp).await?.json().await?;
        Ok(koerper.answer)
    }
}

#[async_trait]
impl Answerer for HttpAnswerer {
    async fn answer(&self, frage: &str) -> Result<String, KollaboratorFehler> {
        self.anfragen(frage).await.map_err(Into::into)
    }
}
