//! Connection establishment utilities for the IRC client
//!
//! Handles TLS and TCP connection setup and wraps the stream in a framed
//! transport that reads and writes whole IRC lines.

use futures_util::{SinkExt, StreamExt};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_util::codec::{Framed, LinesCodecError};
use tracing::{debug, warn};

use crate::wire::{IrcCodec, IrcMessage};

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("TCP connection failed: {0}")]
    Tcp(#[source] std::io::Error),
    #[error("Invalid server name for TLS: {0}")]
    ServerName(String),
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),
    #[error("Transport error: {0}")]
    Transport(#[from] LinesCodecError),
}

trait IrcStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> IrcStream for T {}

/// A connected IRC stream, plain or TLS, framed into lines.
pub struct Transport {
    framed: Framed<Box<dyn IrcStream>, IrcCodec>,
}

impl Transport {
    fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let boxed: Box<dyn IrcStream> = Box::new(stream);
        Self {
            framed: Framed::new(boxed, IrcCodec::new()),
        }
    }

    /// Read the next parseable message. `Ok(None)` means the server closed
    /// the connection.
    pub async fn read_message(&mut self) -> Result<Option<IrcMessage>, ConnectionError> {
        while let Some(line) = self.framed.next().await {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match IrcMessage::parse(&line) {
                Ok(msg) => return Ok(Some(msg)),
                Err(e) => warn!(%line, error = %e, "Skipping malformed line"),
            }
        }
        Ok(None)
    }

    pub async fn write_message(&mut self, msg: &IrcMessage) -> Result<(), ConnectionError> {
        debug!(line = %msg, "->");
        self.framed.send(msg.clone()).await?;
        Ok(())
    }
}

/// Accepts any server certificate; signatures are still checked. Used when
/// `tls-verify` is off.
#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// Root store with webpki roots plus whatever the platform trusts.
fn root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let native = rustls_native_certs::load_native_certs();
    for e in &native.errors {
        warn!(error = %e, "Could not load a platform certificate");
    }
    let (added, ignored) = root_store.add_parsable_certificates(native.certs);
    debug!(added, ignored, "Loaded platform certificates");
    root_store
}

/// Create a TLS connector; `verify = false` skips certificate checks.
pub fn create_tls_connector(verify: bool) -> TlsConnector {
    let config = if verify {
        rustls::ClientConfig::builder()
            .with_root_certificates(root_store())
            .with_no_client_auth()
    } else {
        let provider = CryptoProvider::get_default()
            .cloned()
            .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()));
        rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
            .with_no_client_auth()
    };
    TlsConnector::from(Arc::new(config))
}

/// Establish a connection to an IRC server with optional TLS
pub async fn establish_connection(
    server: &str,
    port: u16,
    use_tls: bool,
    tls_verify: bool,
) -> Result<Transport, ConnectionError> {
    let stream = TcpStream::connect((server, port))
        .await
        .map_err(ConnectionError::Tcp)?;

    if !use_tls {
        return Ok(Transport::new(stream));
    }

    let connector = create_tls_connector(tls_verify);
    let server_name = ServerName::try_from(server.to_string())
        .map_err(|e| ConnectionError::ServerName(e.to_string()))?;
    let tls_stream = connector
        .connect(server_name, stream)
        .await
        .map_err(ConnectionError::Handshake)?;
    Ok(Transport::new(tls_stream))
}
