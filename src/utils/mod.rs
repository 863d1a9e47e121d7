//! Utility modules for tls-expiry
//!
//! Error types shared by the fetcher, the queries and the configuration layer.

pub mod error;

pub use error::{CertificateError, ConfigError, ConnectionError, ErrorKind, Query, QueryError};
