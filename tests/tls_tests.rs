//! # TLS trust tests
//!
//! A one-shot HTTPS server with a freshly generated self-signed certificate.
//! The default client must refuse it; a client that opted into
//! `TrustPolicy::AcceptAnyCertificate` must complete the call over TLS.

#![cfg(feature = "http")]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rcgen::CertifiedKey;
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{ServerConfig, ServerConnection, StreamOwned};

use dfacture::*;

const STAMPED: &str = include_str!("fixtures/cfdi_stamped.xml");

fn self_signed_config() -> Arc<ServerConfig> {
    let CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["127.0.0.1".to_string(), "localhost".to_string()])
            .expect("certificate generation failed");
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    let config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .expect("protocol versions")
    .with_no_client_auth()
    .with_single_cert(vec![cert.der().clone()], key)
    .expect("server certificate");
    Arc::new(config)
}

/// Accept one connection, read one request, answer with `body`.
///
/// Handshake failures are expected when the client rejects the certificate;
/// the thread then ends without answering. Returns the request headers seen.
fn serve_once(listener: TcpListener, body: String) -> JoinHandle<Option<String>> {
    let config = self_signed_config();
    thread::spawn(move || {
        let (tcp, _) = listener.accept().ok()?;
        let conn = ServerConnection::new(config).ok()?;
        let mut tls = StreamOwned::new(conn, tcp);

        let mut headers = String::new();
        let mut content_length = 0usize;
        {
            let mut reader = BufReader::new(&mut tls);
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).ok()? == 0 {
                    return None;
                }
                if line == "\r\n" {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().ok()?;
                    }
                }
                headers.push_str(&line);
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).ok()?;
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/xml; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        tls.write_all(response.as_bytes()).ok()?;
        tls.flush().ok()?;
        tls.conn.send_close_notify();
        let _ = tls.flush();
        Some(headers)
    })
}

fn stamp_envelope() -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><TimbrarCFDI40Response xmlns="http://tempuri.org/"><TimbrarCFDI40Result><codigo>100</codigo><mensaje>OK</mensaje><xml>{}</xml></TimbrarCFDI40Result></TimbrarCFDI40Response></s:Body></s:Envelope>"#,
        STANDARD.encode(STAMPED)
    )
}

fn https_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    (listener, format!("https://127.0.0.1:{port}/WSTimbradoSOAP.svc"))
}

#[test]
fn default_trust_rejects_self_signed_certificate() {
    let (listener, url) = https_listener();
    let server = serve_once(listener, stamp_envelope());

    let config = ClientConfig::builder("DEMODaysoft", "cfdi")
        .url(url)
        .build()
        .unwrap();
    assert_eq!(config.security(), SecurityMode::Transport);
    assert_eq!(config.binding().trust, TrustPolicy::Verify);

    let err = StampClient::new(config).stamp_xml("<x/>").unwrap_err();
    assert!(matches!(
        err,
        StampError::Transport(TransportError::Http { .. })
    ));
    assert!(server.join().expect("server thread").is_none());
}

#[test]
fn accept_any_certificate_completes_over_tls() {
    let (listener, url) = https_listener();
    let server = serve_once(listener, stamp_envelope());

    let config = ClientConfig::builder("DEMODaysoft", "cfdi")
        .url(url)
        .trust_policy(TrustPolicy::AcceptAnyCertificate)
        .build()
        .unwrap();
    let stamp = StampClient::new(config).stamp_xml("<x/>").unwrap();
    assert_eq!(stamp.uuid, "25D0B1B7-2FAE-4E92-BDE1-CF26AA1FBA22");

    let headers = server.join().expect("server thread").expect("request seen");
    assert!(headers.contains("TimbrarCFDI40"));
}

#[test]
fn trust_policy_is_per_client() {
    let (insecure_listener, insecure_url) = https_listener();
    let (strict_listener, strict_url) = https_listener();
    let insecure_server = serve_once(insecure_listener, stamp_envelope());
    let strict_server = serve_once(strict_listener, stamp_envelope());

    let insecure = StampClient::new(
        ClientConfig::builder("DEMODaysoft", "cfdi")
            .url(insecure_url)
            .accept_invalid_certificates()
            .build()
            .unwrap(),
    );
    let strict = StampClient::new(
        ClientConfig::builder("DEMODaysoft", "cfdi")
            .url(strict_url)
            .build()
            .unwrap(),
    );

    assert!(insecure.stamp_xml("<x/>").is_ok());
    assert!(strict.stamp_xml("<x/>").is_err());
    assert!(insecure_server.join().expect("server thread").is_some());
    assert!(strict_server.join().expect("server thread").is_none());
}
