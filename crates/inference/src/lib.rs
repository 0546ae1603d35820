//! signgate-inference – HTTP-Anbindung der Modell-Services
//!
//! Implementiert [`Classifier`](signgate_gateway::Classifier) und
//! [`Answerer`](signgate_gateway::Answerer) gegen externe HTTP-Endpunkte.
//! Modell und Retrieval-Pipeline laufen ausserhalb des Gateways.

pub mod answerer;
pub mod classifier;
pub mod error;

pub use answerer::HttpAnswerer;
pub use classifier::HttpClassifier;
pub use error::{InferenceError, InferenceResult};
