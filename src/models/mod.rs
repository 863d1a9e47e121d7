//! Data models for tls-expiry

pub mod certificate_status;

pub use certificate_status::{CertificateChain, CertificateStatus};
