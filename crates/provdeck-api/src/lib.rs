// provdeck-api: Async Rust client for the Digital Rebar Provision v3 REST API

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::ProvisionClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
