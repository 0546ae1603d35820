//! signgate-gateway – Exklusive Frame-Session ueber TCP
//!
//! Dieser Crate nimmt Verbindungen an, vergibt die aktive Rolle an genau
//! eine Verbindung, reiht alle weiteren in eine FIFO-Warteschlange ein und
//! leitet Frames der aktiven Verbindung an einen Bildklassifikator weiter.
//! Chat-Nachrichten gehen unabhaengig davon an einen Antwort-Service.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (GatewayServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |
//!     v
//! MessageRouter
//!     |
//!     +-- begin-session / end-session -> SessionArbiter
//!     +-- frame                        -> FrameProcessor -> Classifier
//!     +-- chat-message                 -> Answerer
//!
//! SitzungsKern (ein Mutex)  – SessionArbiter + LabelFilter
//! ConnectionRegistry        – Send-Queues aller Verbindungen
//! ```

pub mod arbiter;
pub mod connection;
pub mod error;
pub mod frame;
pub mod kollaborator;
pub mod registry;
pub mod router;
pub mod state;
pub mod tcp;

// Bequeme Re-Exporte
pub use arbiter::{SessionArbiter, Zuteilung};
pub use connection::ClientConnection;
pub use error::{FrameFehler, GatewayError, GatewayResult, KollaboratorFehler};
pub use frame::{FrameErgebnis, FrameProcessor, LabelFilter};
pub use kollaborator::{Answerer, Classifier, RasterBild};
pub use registry::ConnectionRegistry;
pub use router::{MessageRouter, Zustellung};
pub use state::{GatewayConfig, GatewayState, SitzungsKern, DEFAULT_MAX_BILD_PIXEL};
pub use tcp::GatewayServer;
