//! Wire-Format fuer TCP-Verbindungen
//!
//! Frame-basiertes Protokoll: Length(u32 big-endian) + JSON-Payload.
//!
//! ## Frame-Format
//!
//! ```text
//! +--------+--------+--------+--------+----...----+
//! | Laenge (u32 BE) | 4 Bytes        | Payload    |
//! +--------+--------+--------+--------+----...----+
//! ```
//!
//! Die Laenge gibt die Anzahl der Payload-Bytes an (ohne die 4 Laengen-Bytes).
//! Frames transportieren ganze PNG-Bilder, daher liegt das Standard-Maximum
//! bei 8 MB.
//!
//! Ein Frame mit ungueltigem JSON beendet die Verbindung nicht: der Decoder
//! liefert dann `Ok(Some(Err(..)))`, die Framing-Ebene bleibt synchron.
//! Nur Framing-Fehler (zu grosser Frame, IO) sind fatal.

use bytes::{Buf, BufMut, BytesMut};
use serde::{de::DeserializeOwned, Serialize};
use std::io;
use std::marker::PhantomData;
use tokio_util::codec::{Decoder, Encoder};

use crate::events::{ClientEvent, ServerEvent};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Frame-Groesse (8 MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 8 * 1024 * 1024;

/// Groesse des Laengen-Felds in Bytes
pub const LENGTH_FIELD_SIZE: usize = 4;

// ---------------------------------------------------------------------------
// FrameCodec
// ---------------------------------------------------------------------------

/// tokio-util Codec fuer frame-basierte TCP-Verbindungen
///
/// `Ein` ist der dekodierte Typ, `Aus` der kodierte. Der Gateway verwendet
/// [`ServerCodec`], Clients (und Tests) [`ClientCodec`].
///
/// # Beispiel
///
/// ```rust,no_run
/// use tokio_util::codec::Framed;
/// use signgate_protocol::wire::ServerCodec;
///
/// // let stream = TcpStream::connect(...).await?;
/// // let framed = Framed::new(stream, ServerCodec::new());
/// ```
#[derive(Debug)]
pub struct FrameCodec<Ein, Aus> {
    /// Maximale erlaubte Frame-Groesse in Bytes
    max_frame_size: usize,
    _typen: PhantomData<fn(Aus) -> Ein>,
}

/// Codec auf Gateway-Seite: liest Client-Events, schreibt Server-Events
pub type ServerCodec = FrameCodec<ClientEvent, ServerEvent>;

/// Codec auf Client-Seite: liest Server-Events, schreibt Client-Events
pub type ClientCodec = FrameCodec<ServerEvent, ClientEvent>;

impl<Ein, Aus> FrameCodec<Ein, Aus> {
    /// Erstellt einen neuen `FrameCodec` mit Standard-Limits
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Erstellt einen `FrameCodec` mit benutzerdefinierter maximaler Frame-Groesse
    pub fn with_max_size(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            _typen: PhantomData,
        }
    }

    /// Gibt die konfigurierte maximale Frame-Groesse zurueck
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl<Ein, Aus> Default for FrameCodec<Ein, Aus> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ein, Aus> Clone for FrameCodec<Ein, Aus> {
    fn clone(&self) -> Self {
        Self::with_max_size(self.max_frame_size)
    }
}

// ---------------------------------------------------------------------------
// Decoder-Implementierung
// ---------------------------------------------------------------------------

impl<Ein: DeserializeOwned, Aus> Decoder for FrameCodec<Ein, Aus> {
    type Item = Result<Ein, serde_json::Error>;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Warte auf mindestens 4 Bytes fuer das Laengen-Feld
        if src.len() < LENGTH_FIELD_SIZE {
            return Ok(None);
        }

        // Laenge lesen (big-endian u32) ohne den Buffer zu veraendern
        let length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

        if length > self.max_frame_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Frame zu gross: {} Bytes (Maximum: {} Bytes)",
                    length, self.max_frame_size
                ),
            ));
        }

        let total_size = LENGTH_FIELD_SIZE + length;
        if src.len() < total_size {
            // Speicher vorbelegen um Reallocations zu vermeiden
            src.reserve(total_size - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_FIELD_SIZE);
        let payload = src.split_to(length);

        Ok(Some(serde_json::from_slice(&payload)))
    }
}

// ---------------------------------------------------------------------------
// Encoder-Implementierung
// ---------------------------------------------------------------------------

impl<Ein, Aus: Serialize> Encoder<Aus> for FrameCodec<Ein, Aus> {
    type Error = io::Error;

    fn encode(&mut self, item: Aus, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("JSON-Serialisierung fehlgeschlagen: {}", e),
            )
        })?;

        if json.len() > self.max_frame_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Nachricht zu gross: {} Bytes (Maximum: {} Bytes)",
                    json.len(),
                    self.max_frame_size
                ),
            ));
        }

        // Laengen-Feld + Payload schreiben
        dst.reserve(LENGTH_FIELD_SIZE + json.len());
        dst.put_u32(json.len() as u32);
        dst.put_slice(&json);

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TEXT_AKTIV;

    #[test]
    fn client_event_kommt_beim_gateway_an() {
        let mut client = ClientCodec::new();
        let mut server = ServerCodec::new();

        let mut buf = BytesMut::new();
        client
            .encode(ClientEvent::frame("data:image/png;base64,AAAA"), &mut buf)
            .unwrap();

        let payload_len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        assert_eq!(buf.len(), LENGTH_FIELD_SIZE + payload_len);

        let decoded = server
            .decode(&mut buf)
            .unwrap()
            .expect("Muss ein Frame enthalten")
            .expect("Muss gueltiges JSON sein");
        assert_eq!(decoded, ClientEvent::frame("data:image/png;base64,AAAA"));
        assert!(buf.is_empty());
    }

    #[test]
    fn server_antwort_kommt_beim_client_an() {
        let mut server = ServerCodec::new();
        let mut client = ClientCodec::new();

        let mut buf = BytesMut::new();
        server
            .encode(ServerEvent::response(TEXT_AKTIV), &mut buf)
            .unwrap();

        let decoded = client.decode(&mut buf).unwrap().unwrap().unwrap();
        assert_eq!(decoded.message(), TEXT_AKTIV);
    }

    #[test]
    fn unvollstaendiger_frame() {
        let mut client = ClientCodec::new();
        let mut server = ServerCodec::new();

        let mut buf = BytesMut::new();
        client.encode(ClientEvent::BeginSession, &mut buf).unwrap();

        // Nur die Haelfte der Bytes behalten
        let half = buf.len() / 2;
        let mut partial = buf.split_to(half);

        assert!(server.decode(&mut partial).unwrap().is_none());
    }

    #[test]
    fn zu_wenig_bytes_fuer_laengenfeld() {
        let mut codec = ServerCodec::new();
        let mut buf = BytesMut::from(&[0x00, 0x00][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn ablehnung_zu_grosser_frame() {
        let mut codec = ServerCodec::with_max_size(100);

        let mut buf = BytesMut::new();
        buf.put_u32(200);
        buf.put_slice(&[b'x'; 200]);

        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn ablehnung_beim_encode_zu_grosse_nachricht() {
        let mut codec = ServerCodec::with_max_size(10);
        let mut buf = BytesMut::new();
        let result = codec.encode(ServerEvent::response(TEXT_AKTIV), &mut buf);
        assert!(result.is_err());
    }

    #[test]
    fn ungueltiges_json_ist_nicht_fatal() {
        let mut codec = ServerCodec::new();
        let mut buf = BytesMut::new();
        let muell = b"{kein json";
        buf.put_u32(muell.len() as u32);
        buf.put_slice(muell);

        // Danach ein gueltiges Event im selben Buffer
        ClientCodec::new()
            .encode(ClientEvent::EndSession, &mut buf)
            .unwrap();

        let erstes = codec.decode(&mut buf).unwrap().expect("Frame erwartet");
        assert!(erstes.is_err());

        let zweites = codec.decode(&mut buf).unwrap().expect("Frame erwartet");
        assert_eq!(zweites.unwrap(), ClientEvent::EndSession);
    }

    #[test]
    fn mehrere_nachrichten_im_buffer() {
        let mut client = ClientCodec::new();
        let mut server = ServerCodec::new();
        let mut buf = BytesMut::new();

        let events = vec![
            ClientEvent::BeginSession,
            ClientEvent::chat("Welches Backend?"),
            ClientEvent::EndSession,
        ];
        for ev in &events {
            client.encode(ev.clone(), &mut buf).unwrap();
        }

        for erwartet in events {
            let ev = server.decode(&mut buf).unwrap().unwrap().unwrap();
            assert_eq!(ev, erwartet);
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn default_max_size() {
        let codec = ServerCodec::new();
        assert_eq!(codec.max_frame_size(), DEFAULT_MAX_FRAME_SIZE);
    }

    #[tokio::test]
    async fn framed_ueber_duplex_stream() {
        use futures_util::{SinkExt, StreamExt};
        use tokio_util::codec::Framed;

        let (a, b) = tokio::io::duplex(1024);
        let mut client = Framed::new(a, ClientCodec::new());
        let mut server = Framed::new(b, ServerCodec::new());

        client.send(ClientEvent::BeginSession).await.unwrap();
        let ev = server.next().await.unwrap().unwrap().unwrap();
        assert_eq!(ev, ClientEvent::BeginSession);

        server.send(ServerEvent::response(TEXT_AKTIV)).await.unwrap();
        let antwort = client.next().await.unwrap().unwrap().unwrap();
        assert_eq!(antwort.message(), TEXT_AKTIV);
    }
}
