//! Shared helpers: throwaway certificates and local TLS servers

#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rcgen::{
    BasicConstraints, CertificateParams, CustomExtension, DnType, IsCa, KeyPair, SerialNumber,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tracing_subscriber::EnvFilter;

pub const TEST_SERIAL: u8 = 42;

/// Private enterprise arc no X.509 implementation knows about
const UNKNOWN_EXTENSION_OID: &[u64] = &[1, 3, 6, 1, 4, 1, 99999, 1];

/// Install a test-friendly subscriber once; `RUST_LOG` overrides the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A certificate chain (leaf first) plus the leaf's private key
pub struct TestChain {
    pub certificates: Vec<CertificateDer<'static>>,
    pub key: PrivateKeyDer<'static>,
    pub not_afters: Vec<DateTime<Utc>>,
}

/// `Utc::now() + offset`, truncated to whole seconds as X.509 stores it
pub fn from_now(offset: TimeDelta) -> DateTime<Utc> {
    let at = Utc::now() + offset;
    Utc.timestamp_opt(at.timestamp(), 0).unwrap()
}

fn params(not_after: DateTime<Utc>, serial: u8) -> CertificateParams {
    let mut params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
    params
        .distinguished_name
        .push(DnType::OrganizationName, "Haz Expired Certs");
    params.serial_number = Some(SerialNumber::from_slice(&[serial]));
    params.not_before = to_offset(not_after - TimeDelta::days(365));
    params.not_after = to_offset(not_after);
    params
}

fn to_offset(at: DateTime<Utc>) -> time::OffsetDateTime {
    time::OffsetDateTime::from_unix_timestamp(at.timestamp()).unwrap()
}

/// A single self-signed certificate expiring at `not_after`
pub fn self_signed(not_after: DateTime<Utc>) -> TestChain {
    self_signed_from(params(not_after, TEST_SERIAL), not_after)
}

/// A self-signed certificate carrying an unrecognised critical extension
///
/// Strict X.509 parsers reject it; rustls refuses it in `with_single_cert`.
pub fn self_signed_with_unknown_critical_extension(not_after: DateTime<Utc>) -> TestChain {
    let mut extension = CustomExtension::from_oid_content(UNKNOWN_EXTENSION_OID, vec![0x05, 0x00]);
    extension.set_criticality(true);

    let mut params = params(not_after, TEST_SERIAL);
    params.custom_extensions.push(extension);
    self_signed_from(params, not_after)
}

fn self_signed_from(params: CertificateParams, not_after: DateTime<Utc>) -> TestChain {
    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();

    TestChain {
        certificates: vec![cert.der().clone()],
        key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der())),
        not_afters: vec![not_after],
    }
}

/// A leaf issued by a CA, served as `[leaf, ca]`
pub fn leaf_and_ca(leaf_not_after: DateTime<Utc>, ca_not_after: DateTime<Utc>) -> TestChain {
    let ca_key = KeyPair::generate().unwrap();
    let mut ca_params = params(ca_not_after, 1);
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params
        .distinguished_name
        .push(DnType::CommonName, "Haz Expired Test CA");
    let ca_cert = ca_params.self_signed(&ca_key).unwrap();

    let leaf_key = KeyPair::generate().unwrap();
    let leaf_cert = params(leaf_not_after, 2)
        .signed_by(&leaf_key, &ca_cert, &ca_key)
        .unwrap();

    TestChain {
        certificates: vec![leaf_cert.der().clone(), ca_cert.der().clone()],
        key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(leaf_key.serialize_der())),
        not_afters: vec![leaf_not_after, ca_not_after],
    }
}

/// A local server that stops accepting when dropped
pub struct TestServer {
    pub address: String,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    (listener, address)
}

/// Hands out one certificate chain without inspecting it
#[derive(Debug)]
struct FixedCert(Arc<CertifiedKey>);

impl ResolvesServerCert for FixedCert {
    fn resolve(&self, _client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        Some(Arc::clone(&self.0))
    }
}

/// Serve `chain` over TLS on an ephemeral localhost port
///
/// The chain is served as-is, even when rustls would refuse to load it
/// through `with_single_cert`.
pub async fn serve_tls(chain: &TestChain) -> TestServer {
    let key = rustls::crypto::ring::sign::any_supported_type(&chain.key).unwrap();
    let certified = CertifiedKey::new(chain.certificates.clone(), key);

    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_cert_resolver(Arc::new(FixedCert(Arc::new(certified))));
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let (listener, address) = bind().await;
    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut tls) = acceptor.accept(stream).await {
                    let mut buf = [0u8; 2];
                    let _ = tls.read(&mut buf).await;
                }
            });
        }
    });

    TestServer { address, handle }
}

/// A server that answers the ClientHello with plaintext HTTP
pub async fn serve_plaintext() -> TestServer {
    let (listener, address) = bind().await;
    let handle = tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 512];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\n\r\n")
                    .await;
                let _ = stream.shutdown().await;
            });
        }
    });

    TestServer { address, handle }
}

/// A server that accepts TCP connections and never speaks
pub async fn serve_silent() -> TestServer {
    let (listener, address) = bind().await;
    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(stream);
            });
        }
    });

    TestServer { address, handle }
}

/// An address on which nothing is listening
pub async fn closed_address() -> String {
    let (listener, address) = bind().await;
    drop(listener);
    address
}
