//! Certificate expiration status types

use crate::utils::CertificateError;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use x509_parser::num_bigint::BigUint;
use x509_parser::prelude::*;

/// Expiration facts for one certificate, taken at a single instant
///
/// Records are snapshots: `expired_now` and `expires_in_days` are computed
/// together from the same observation time and are never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateStatus {
    /// Not-after is strictly before the observation time
    pub expired_now: bool,
    /// Whole days until not-after, rounded down (negative once expired)
    pub expires_in_days: i64,
    /// Not-after as stated in the certificate
    pub expiration_date: DateTime<Utc>,
    /// Raw signature bytes, for identification only
    #[serde(serialize_with = "serialize_hex")]
    pub signature: Vec<u8>,
    /// Serial number as stated in the certificate
    #[serde(serialize_with = "serialize_decimal")]
    pub serial_number: BigUint,
}

impl CertificateStatus {
    /// Decode a DER certificate and evaluate it against `now`
    pub fn from_der(der: &[u8], now: DateTime<Utc>) -> Result<Self, CertificateError> {
        let (_, cert) =
            X509Certificate::from_der(der).map_err(|e| CertificateError::ParseError {
                message: format!("{:?}", e),
            })?;

        let expiration_date = asn1_time_to_datetime(cert.validity().not_after)?;

        Ok(Self::from_not_after(
            expiration_date,
            cert.signature_value.data.to_vec(),
            cert.serial.clone(),
            now,
        ))
    }

    /// Build a record from already decoded fields
    pub fn from_not_after(
        expiration_date: DateTime<Utc>,
        signature: Vec<u8>,
        serial_number: BigUint,
        now: DateTime<Utc>,
    ) -> Self {
        let remaining = expiration_date.signed_duration_since(now);

        Self {
            expired_now: expiration_date < now,
            expires_in_days: floor_days(remaining),
            expiration_date,
            signature,
            serial_number,
        }
    }

    /// Serial number as colon separated hex
    pub fn serial_hex(&self) -> String {
        to_hex(&self.serial_number.to_bytes_be(), ":")
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.expired_now { "expired" } else { "valid" };
        write!(
            f,
            "serial {} {} (expires {}, {} days)",
            self.serial_hex(),
            state,
            self.expiration_date.format("%Y-%m-%d %H:%M:%S UTC"),
            self.expires_in_days
        )
    }
}

/// Certificates presented by a peer, in the order it sent them (leaf first)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CertificateChain {
    certificates: Vec<CertificateStatus>,
}

impl CertificateChain {
    pub fn new(certificates: Vec<CertificateStatus>) -> Self {
        Self { certificates }
    }

    /// The end-entity certificate, if the peer sent any
    pub fn leaf(&self) -> Option<&CertificateStatus> {
        self.certificates.first()
    }

    /// Whether any certificate had expired when the chain was observed
    pub fn any_expired(&self) -> bool {
        self.certificates.iter().any(|cert| cert.expired_now)
    }

    /// Whether any certificate expires in fewer than `days` whole days
    pub fn any_expires_within_days(&self, days: i64) -> bool {
        self.certificates
            .iter()
            .any(|cert| cert.expires_in_days < days)
    }

    /// Whether any certificate's not-after falls strictly before `date`
    pub fn any_expires_before(&self, date: DateTime<Utc>) -> bool {
        self.certificates
            .iter()
            .any(|cert| cert.expiration_date < date)
    }

    pub fn into_vec(self) -> Vec<CertificateStatus> {
        self.certificates
    }
}

impl Deref for CertificateChain {
    type Target = [CertificateStatus];

    fn deref(&self) -> &Self::Target {
        &self.certificates
    }
}

impl FromIterator<CertificateStatus> for CertificateChain {
    fn from_iter<I: IntoIterator<Item = CertificateStatus>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for CertificateChain {
    type Item = CertificateStatus;
    type IntoIter = std::vec::IntoIter<CertificateStatus>;

    fn into_iter(self) -> Self::IntoIter {
        self.certificates.into_iter()
    }
}

impl<'a> IntoIterator for &'a CertificateChain {
    type Item = &'a CertificateStatus;
    type IntoIter = std::slice::Iter<'a, CertificateStatus>;

    fn into_iter(self) -> Self::IntoIter {
        self.certificates.iter()
    }
}

/// Whole days in `delta`, rounded towards negative infinity
fn floor_days(delta: TimeDelta) -> i64 {
    let whole = delta.num_days();
    if delta < TimeDelta::days(whole) {
        whole - 1
    } else {
        whole
    }
}

/// Convert ASN.1 time to chrono DateTime
fn asn1_time_to_datetime(time: ASN1Time) -> Result<DateTime<Utc>, CertificateError> {
    let timestamp = time.timestamp();
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .ok_or(CertificateError::InvalidTimestamp { timestamp })
}

fn to_hex(bytes: &[u8], separator: &str) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(separator)
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_hex(bytes, ""))
}

fn serialize_decimal<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
