// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use crate::configuration::ENV_DISABLE_CERT_VERIFICATION;
use crate::util::bool_from_env;
use if_addrs::{IfAddr, Ifv4Addr};
use rustls::ClientConfig;
use rustls_platform_verifier::BuilderVerifierExt;
use std::sync::Arc;
use std::time::Duration;

pub fn my_ipv4_interfaces() -> Vec<Ifv4Addr> {
    if_addrs::get_if_addrs()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|i| {
            if i.is_loopback() {
                None
            } else {
                match i.addr {
                    IfAddr::V4(ifv4) => Some(ifv4),
                    _ => None,
                }
            }
        })
        .collect()
}

/// Create a WebSocket client for the hub event stream.
///
/// Certificate verification is disabled if `insecure` is set or the
/// `UC_DISABLE_CERT_VERIFICATION` environment variable is active. The hub only
/// presents a self-signed certificate, so this is required unless the
/// certificate has been added to the platform trust store.
pub fn new_websocket_client(connection_timeout: Duration, insecure: bool) -> awc::Client {
    let connector = awc::Connector::new().rustls_0_23(Arc::new(client_tls_config(insecure)));
    awc::ClientBuilder::new()
        .timeout(connection_timeout)
        .connector(connector)
        .finish()
}

/// Create an HTTP client for the hub REST API.
///
/// See [new_websocket_client] for `insecure` certificate handling.
pub fn new_http_client(
    connection_timeout: Duration,
    request_timeout: Duration,
    insecure: bool,
) -> awc::Client {
    let connector = awc::Connector::new()
        .timeout(connection_timeout)
        .rustls_0_23(Arc::new(client_tls_config(insecure)));
    awc::ClientBuilder::new()
        .timeout(request_timeout)
        .connector(connector)
        .finish()
}

fn client_tls_config(insecure: bool) -> ClientConfig {
    let mut config = if insecure || bool_from_env(ENV_DISABLE_CERT_VERIFICATION) {
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(danger::NoCertificateVerification::new(
                rustls::crypto::aws_lc_rs::default_provider(),
            )))
            .with_no_client_auth()
    } else {
        ClientConfig::builder()
            .with_platform_verifier()
            .expect("failed to load platform certificate store")
            .with_no_client_auth()
    };

    // http2 has (or at least had) issues with wss. Needs further investigation.
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    config
}

mod danger {
    use rustls::DigitallySignedStruct;
    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};

    /// Certificate verifier accepting any server certificate.
    ///
    /// Handshake signatures are still verified with the given crypto provider.
    #[derive(Debug)]
    pub struct NoCertificateVerification(CryptoProvider);

    impl NoCertificateVerification {
        pub fn new(provider: CryptoProvider) -> Self {
            Self(provider)
        }
    }

    impl ServerCertVerifier for NoCertificateVerification {
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
            verify_tls12_signature(
                message,
                cert,
                dss,
                &self.0.signature_verification_algorithms,
            )
        }

        fn verify_tls13_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            verify_tls13_signature(
                message,
                cert,
                dss,
                &self.0.signature_verification_algorithms,
            )
        }

        fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
            self.0.signature_verification_algorithms.supported_schemes()
        }
    }
}
