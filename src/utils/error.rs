//! Custom error types for tls-expiry
//!
//! Every connection failure carries the address that was attempted and the
//! underlying cause. Failures fall into two kinds: the endpoint could not be
//! reached ([`ErrorKind::Address`]) or it was reached but the TLS handshake
//! did not complete ([`ErrorKind::Handshake`]).

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Broad classification of a [`ConnectionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The address could not be parsed, resolved or connected to in time
    Address,
    /// TCP connected but the TLS handshake did not complete
    Handshake,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Address => write!(f, "address error"),
            ErrorKind::Handshake => write!(f, "handshake error"),
        }
    }
}

/// Errors raised while fetching a peer certificate chain
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Invalid address {address}: {message}")]
    InvalidAddress { address: String, message: String },

    #[error("Could not resolve {address}: {source}")]
    Resolve {
        address: String,
        source: std::io::Error,
    },

    #[error("No addresses found for {address}")]
    NoAddresses { address: String },

    #[error("Could not establish connection to {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    #[error("Connection to {address} timed out after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },

    #[error("Invalid server name {host} in {address}")]
    InvalidServerName { address: String, host: String },

    #[error("TLS handshake with {address} failed: {source}")]
    Handshake {
        address: String,
        source: std::io::Error,
    },

    #[error("TLS handshake with {address} timed out after {timeout:?}")]
    HandshakeTimeout { address: String, timeout: Duration },

    #[error("Malformed certificate #{index} presented by {address}: {message}")]
    MalformedCertificate {
        address: String,
        index: usize,
        message: String,
    },
}

impl ConnectionError {
    /// Which side of the connection the failure happened on
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectionError::InvalidAddress { .. }
            | ConnectionError::Resolve { .. }
            | ConnectionError::NoAddresses { .. }
            | ConnectionError::Connect { .. }
            | ConnectionError::ConnectTimeout { .. }
            | ConnectionError::InvalidServerName { .. } => ErrorKind::Address,
            ConnectionError::Handshake { .. }
            | ConnectionError::HandshakeTimeout { .. }
            | ConnectionError::MalformedCertificate { .. } => ErrorKind::Handshake,
        }
    }

    /// The address that was attempted
    pub fn address(&self) -> &str {
        match self {
            ConnectionError::InvalidAddress { address, .. }
            | ConnectionError::Resolve { address, .. }
            | ConnectionError::NoAddresses { address }
            | ConnectionError::Connect { address, .. }
            | ConnectionError::ConnectTimeout { address, .. }
            | ConnectionError::InvalidServerName { address, .. }
            | ConnectionError::Handshake { address, .. }
            | ConnectionError::HandshakeTimeout { address, .. }
            | ConnectionError::MalformedCertificate { address, .. } => address,
        }
    }
}

/// The expiration query that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    IsExpired,
    ExpiresWithinDays,
    ExpiresBeforeDate,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::IsExpired => write!(f, "is_expired"),
            Query::ExpiresWithinDays => write!(f, "expires_within_days"),
            Query::ExpiresBeforeDate => write!(f, "expires_before_date"),
        }
    }
}

/// An expiration query could not be answered because the chain fetch failed
///
/// There is no boolean answer alongside this error. Callers that want the
/// alarming "assume something is expiring" default can ask for it
/// explicitly with [`QueryError::fail_safe`].
#[derive(Error, Debug)]
#[error("{query}: error fetching certificate chain: {source}")]
pub struct QueryError {
    pub query: Query,
    #[source]
    pub source: ConnectionError,
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    pub fn address(&self) -> &str {
        self.source.address()
    }

    /// The answer to report when the chain could not be inspected: always `true`
    pub fn fail_safe(&self) -> bool {
        true
    }
}

/// Certificate decoding errors
#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("Failed to parse certificate: {message}")]
    ParseError { message: String },

    #[error("Invalid timestamp in certificate: {timestamp}")]
    InvalidTimestamp { timestamp: i64 },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ParseError { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
