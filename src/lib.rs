//! tls-expiry library
//!
//! Reports when the certificates a TLS endpoint presents expire:
//! - Fetches the peer certificate chain without judging its trust
//! - Evaluates every certificate against a single observation instant
//! - Answers "expired?", "expires within N days?" and "expires before date?"
//!   for the chain as a whole
//!
//! Trust verification is deliberately skipped so that expired, self-signed
//! and otherwise untrusted chains can still be inspected. Nothing here says
//! whether a chain should be trusted.
//!
//! # Usage
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), tls_expiry::QueryError> {
//! if tls_expiry::expires_within_days("example.com:443", 30).await? {
//!     println!("renew soon");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A failed query returns an error and no answer. Use
//! [`QueryError::fail_safe`] to treat an unreachable endpoint as expiring.

pub mod checks;
pub mod config;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use checks::{
    expires_before_date, expires_within_days, fetch_chain, is_expired, ChainFetcher,
};
pub use config::FetchSettings;
pub use models::{CertificateChain, CertificateStatus};
pub use utils::{ConnectionError, ErrorKind, QueryError};
