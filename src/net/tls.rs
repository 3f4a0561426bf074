//! Ephemeral TLS identity and server configuration.
//!
//! # Responsibilities
//! - Generate a self-signed certificate and key in memory at startup
//! - Build the rustls server configuration used by the TLS listener
//!
//! # Design Decisions
//! - The identity lives for one process run; nothing is written to disk
//! - Only TLS 1.3 is offered
//! - rustls has no renegotiation support, so renegotiation is off by construction

use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use rcgen::CertifiedKey;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;

/// Bound on an inbound TLS handshake.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// A self-signed certificate and its private key, held only in memory.
pub struct SelfSignedCert {
    cert: CertificateDer<'static>,
    key: PrivatePkcs8KeyDer<'static>,
}

impl SelfSignedCert {
    /// Generate a fresh certificate valid for the given subject names.
    pub fn generate(subject_alt_names: &[String]) -> Result<Self, rcgen::Error> {
        let CertifiedKey { cert, key_pair } =
            rcgen::generate_simple_self_signed(subject_alt_names.to_vec())?;

        tracing::info!(
            names = ?subject_alt_names,
            "Generated ephemeral self-signed certificate"
        );

        Ok(Self {
            cert: cert.der().clone(),
            key: PrivatePkcs8KeyDer::from(key_pair.serialize_der()),
        })
    }

    /// DER encoding of the certificate, for clients that want to trust it.
    pub fn cert_der(&self) -> &CertificateDer<'static> {
        &self.cert
    }
}

impl std::fmt::Debug for SelfSignedCert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelfSignedCert")
            .field("cert_len", &self.cert.len())
            .finish_non_exhaustive()
    }
}

/// Build a TLS 1.3-only server configuration around the certificate.
pub fn server_config(identity: &SelfSignedCert) -> Result<ServerConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .with_no_client_auth()
        .with_single_cert(
            vec![identity.cert.clone()],
            PrivateKeyDer::Pkcs8(identity.key.clone_key()),
        )?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}

/// Wrap the server configuration for axum-server's rustls acceptor.
pub fn rustls_config(identity: &SelfSignedCert) -> Result<RustlsConfig, rustls::Error> {
    Ok(RustlsConfig::from_config(Arc::new(server_config(identity)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_certificate() {
        let identity = SelfSignedCert::generate(&["localhost".to_string()]).unwrap();
        assert!(!identity.cert_der().is_empty());
    }

    #[test]
    fn each_run_gets_a_new_identity() {
        let names = vec!["localhost".to_string()];
        let a = SelfSignedCert::generate(&names).unwrap();
        let b = SelfSignedCert::generate(&names).unwrap();
        assert_ne!(a.cert_der(), b.cert_der());
    }

    #[test]
    fn server_config_offers_http1_only() {
        let identity = SelfSignedCert::generate(&["localhost".to_string()]).unwrap();
        let config = server_config(&identity).unwrap();
        assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }
}
