//! Fehlertypen fuer die HTTP-Anbindung

use reqwest::StatusCode;
use signgate_gateway::KollaboratorFehler;
use thiserror::Error;

/// Fehler beim Aufruf eines Modell-Services
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Transportfehler (Verbindung, Zeitlimit, Dekodierung)
    #[error("HTTP-Anfrage fehlgeschlagen: {0}")]
    Http(#[from] reqwest::Error),

    /// Service hat mit einem Fehlerstatus geantwortet
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Result-Typ fuer die HTTP-Anbindung
pub type InferenceResult<T> = Result<T, InferenceError>;

impl From<InferenceError> for KollaboratorFehler {
    fn from(fehler: InferenceError) -> Self {
        match fehler {
            InferenceError::Http(e) if e.is_decode() => Self::UngueltigeAntwort(e.to_string()),
            InferenceError::Http(e) if e.is_timeout() => Self::NichtErreichbar("timeout".into()),
            InferenceError::Http(e) => Self::NichtErreichbar(e.to_string()),
            InferenceError::Status { status, body } if body.is_empty() => {
                Self::Antwort(status.to_string())
            }
            InferenceError::Status { status, body } => Self::Antwort(format!("{status}: {body}")),
        }
    }
}

/// Gibt die Antwort zurueck wenn der Status 2xx ist, sonst den Fehler mit Body
pub(crate) async fn status_pruefen(resp: reqwest::Response) -> InferenceResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(InferenceError::Status {
        status,
        body: body.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehlerstatus_wird_zu_antwortfehler() {
        let fehler: KollaboratorFehler = InferenceError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "model not loaded".into(),
        }
        .into();
        assert_eq!(
            fehler,
            KollaboratorFehler::Antwort("500 Internal Server Error: model not loaded".into())
        );
    }

    #[test]
    fn leerer_body_nur_status() {
        let fehler: KollaboratorFehler = InferenceError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        }
        .into();
        assert_eq!(fehler.to_string(), "service error: 502 Bad Gateway");
    }
}
