//! Configuration module for tls-expiry
//!
//! Handles fetcher settings, either built in code or loaded from TOML.

pub mod settings;

pub use settings::{FetchSettings, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HANDSHAKE_TIMEOUT_SECS};
