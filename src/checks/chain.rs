//! Peer certificate chain fetcher
//!
//! Connects to a TLS endpoint, completes a handshake without judging the
//! peer's certificates, and turns every presented certificate into a
//! [`CertificateStatus`] evaluated at one shared instant.

use crate::checks::verifier::AcceptAnyServerCert;
use crate::config::FetchSettings;
use crate::models::{CertificateChain, CertificateStatus};
use crate::utils::ConnectionError;
use chrono::Utc;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use std::sync::{Arc, OnceLock};
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};
use tokio_rustls::TlsConnector;
use tracing::{debug, trace};

/// Fetches and evaluates the certificate chain a TLS endpoint presents
///
/// The fetcher holds only immutable configuration, so one instance can be
/// cloned and shared between concurrent calls. Every fetch opens its own
/// connection; nothing is cached.
#[derive(Debug, Clone)]
pub struct ChainFetcher {
    settings: FetchSettings,
    config: Arc<ClientConfig>,
    provider: Arc<CryptoProvider>,
}

impl ChainFetcher {
    /// Create a new fetcher with the given settings
    pub fn new(settings: FetchSettings) -> Self {
        // A process-wide provider is required by `ClientConfig::builder`; keep
        // any provider the embedding application already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();
        let provider = CryptoProvider::get_default()
            .cloned()
            .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()));

        // The builder picks the same process default, so the handshake and the
        // verifier share one provider.
        let verifier = AcceptAnyServerCert::new(Arc::clone(&provider));
        let config = ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_no_client_auth();

        Self {
            settings,
            config: Arc::new(config),
            provider,
        }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// The crypto provider used for both the handshake and the verifier
    pub fn provider(&self) -> &Arc<CryptoProvider> {
        &self.provider
    }

    /// Fetch the peer certificate chain of `address` (`host:port`)
    ///
    /// Certificates come back in the order the peer sent them. An error never
    /// carries a partial chain.
    pub async fn fetch_chain(&self, address: &str) -> Result<CertificateChain, ConnectionError> {
        let (host, port) = split_host_port(address)?;

        let server_name = ServerName::try_from(host.to_string()).map_err(|_| {
            ConnectionError::InvalidServerName {
                address: address.to_string(),
                host: host.to_string(),
            }
        })?;

        let stream = tokio::time::timeout(
            self.settings.connect_timeout(),
            connect(address, host, port),
        )
        .await
        .map_err(|_| ConnectionError::ConnectTimeout {
            address: address.to_string(),
            timeout: self.settings.connect_timeout(),
        })??;

        let connector = TlsConnector::from(Arc::clone(&self.config));
        let mut tls_stream = tokio::time::timeout(
            self.settings.handshake_timeout(),
            connector.connect(server_name, stream),
        )
        .await
        .map_err(|_| ConnectionError::HandshakeTimeout {
            address: address.to_string(),
            timeout: self.settings.handshake_timeout(),
        })?
        .map_err(|source| ConnectionError::Handshake {
            address: address.to_string(),
            source,
        })?;

        let now = Utc::now();
        let (_, connection) = tls_stream.get_ref();
        debug!(
            "Handshake with {} complete ({:?}, {:?})",
            address,
            connection.protocol_version(),
            connection.negotiated_cipher_suite().map(|cs| cs.suite())
        );

        let chain = match connection.peer_certificates() {
            Some(certs) => certs
                .iter()
                .enumerate()
                .map(|(index, der)| {
                    CertificateStatus::from_der(der.as_ref(), now).map_err(|e| {
                        ConnectionError::MalformedCertificate {
                            address: address.to_string(),
                            index,
                            message: e.to_string(),
                        }
                    })
                })
                .collect::<Result<CertificateChain, _>>()?,
            None => CertificateChain::default(),
        };

        debug!("{} presented {} certificate(s)", address, chain.len());
        for (index, cert) in chain.iter().enumerate() {
            trace!("{} certificate #{}: {}", address, index, cert);
        }

        if let Err(e) = tls_stream.shutdown().await {
            debug!("Closing connection to {} failed: {}", address, e);
        }

        Ok(chain)
    }
}

impl Default for ChainFetcher {
    fn default() -> Self {
        Self::new(FetchSettings::default())
    }
}

/// Shared fetcher with default settings, built on first use
pub(crate) fn default_fetcher() -> &'static ChainFetcher {
    static FETCHER: OnceLock<ChainFetcher> = OnceLock::new();
    FETCHER.get_or_init(ChainFetcher::default)
}

/// Fetch the peer certificate chain of `address` with default settings
pub async fn fetch_chain(address: &str) -> Result<CertificateChain, ConnectionError> {
    default_fetcher().fetch_chain(address).await
}

/// Resolve `host` and connect to the first address that accepts
async fn connect(address: &str, host: &str, port: u16) -> Result<TcpStream, ConnectionError> {
    let addrs = lookup_host((host, port))
        .await
        .map_err(|source| ConnectionError::Resolve {
            address: address.to_string(),
            source,
        })?;

    let mut last_error = None;
    for addr in addrs {
        trace!("Connecting to {} via {}", address, addr);
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("Connection to {} via {} failed: {}", address, addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(match last_error {
        Some(source) => ConnectionError::Connect {
            address: address.to_string(),
            source,
        },
        None => ConnectionError::NoAddresses {
            address: address.to_string(),
        },
    })
}

/// Split `host:port`, accepting bracketed IPv6 literals such as `[::1]:443`
fn split_host_port(address: &str) -> Result<(&str, u16), ConnectionError> {
    let invalid = |message: &str| ConnectionError::InvalidAddress {
        address: address.to_string(),
        message: message.to_string(),
    };

    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        rest.split_once("]:")
            .ok_or_else(|| invalid("expected [host]:port"))?
    } else {
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port"))?;
        if host.contains(':') {
            return Err(invalid("IPv6 addresses must be enclosed in brackets"));
        }
        (host, port)
    };

    if host.is_empty() {
        return Err(invalid("missing host"));
    }

    let port = port
        .parse::<u16>()
        .map_err(|_| invalid(&format!("invalid port {:?}", port)))?;

    Ok((host, port))
}
