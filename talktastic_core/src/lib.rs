#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Shared data model and seams for the Talktastic chat client.
//!
//! The remote agent is a single webhook endpoint. This crate owns the types
//! exchanged with it, the codec that maps them to and from the wire, and the
//! traits that storage and transport implementations plug into.

pub mod codec;
pub mod credentials;
pub mod message;
pub mod session;
pub mod storage;
pub mod transport;
pub mod util;

pub use codec::{
    ButtonPayload, DecodeError, Geolocation, OutboundPayload, SendPayload, decode_button_response,
    decode_response, encode_button_selection, encode_send,
};
pub use credentials::{CredentialStore, StoredCredential};
pub use message::{Button, Message, MessageType, Sender, UrlMetadata};
pub use session::{Profile, ProfilePatch, Session, Sex};
pub use storage::{KeyValueStore, StorageError};
pub use transport::{Transport, TransportError};
