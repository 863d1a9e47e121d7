//! Check modules for tls-expiry
//!
//! The chain fetcher and the expiration queries built on top of it.

pub mod chain;
pub mod expiration;
pub mod verifier;

pub use chain::{fetch_chain, ChainFetcher};
pub use expiration::{expires_before_date, expires_within_days, is_expired};
pub use verifier::AcceptAnyServerCert;
