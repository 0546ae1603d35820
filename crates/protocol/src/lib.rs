//! signgate-protocol – Event- und Wire-Definitionen
//!
//! Dieses Crate definiert alle benannten Events die zwischen Client und
//! Gateway ausgetauscht werden, sowie das Frame-Format auf der Leitung.

pub mod events;
pub mod wire;

pub use events::{ChatPayload, ClientEvent, FramePayload, ResponsePayload, ServerEvent};
pub use wire::{ClientCodec, FrameCodec, ServerCodec};
