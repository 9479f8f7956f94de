//! Property-based tests for result-code handling and UUID normalization.
//!
//! Run with: `cargo test --test proptest_tests`

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use proptest::prelude::*;
use std::sync::Mutex;

use dfacture::client::{Binding, Operation, SoapRequest, Transport};
use dfacture::*;

const STAMPED: &str = include_str!("fixtures/cfdi_stamped.xml");

/// Returns one canned result and remembers the last request.
struct Canned {
    code: String,
    message: String,
    xml: Option<String>,
    last: Mutex<Option<SoapRequest>>,
}

impl Canned {
    fn new(code: &str, message: &str, xml: Option<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            xml,
            last: Mutex::new(None),
        }
    }

    fn last_argument(&self, name: &str) -> Option<String> {
        self.last
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|r| r.argument(name).map(str::to_string))
    }
}

impl Transport for Canned {
    fn call(&self, _binding: &Binding, request: &SoapRequest) -> Result<String, TransportError> {
        *self.last.lock().unwrap() = Some(request.clone());
        let m = request.operation().method();
        let msg = self
            .message
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        let xml = self
            .xml
            .as_deref()
            .map(|x| format!("<xml>{x}</xml>"))
            .unwrap_or_default();
        Ok(format!(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><{m}Response xmlns="http://tempuri.org/"><{m}Result><codigo>{}</codigo><mensaje>{msg}</mensaje>{xml}</{m}Result></{m}Response></s:Body></s:Envelope>"#,
            self.code
        ))
    }
}

fn client(transport: &Canned) -> StampClient<&Canned> {
    let config = ClientConfig::builder("DEMO", "cfdi")
        .url(URL_TEST)
        .build()
        .unwrap();
    StampClient::with_transport(config, transport)
}

fn cancellation(uuid: &str) -> CancellationRequest {
    CancellationRequest::new(
        "AAA010101AAA",
        "XAXX010101000",
        uuid,
        "100.00",
        "Y2VydA==",
        "a2V5",
        "secret",
        CancellationReason::OperationNotCarriedOut,
    )
}

// ── Strategies ──────────────────────────────────────────────────────────────

/// Three-digit result codes other than the stamp success code.
fn arb_rejection_code() -> impl Strategy<Value = String> {
    "[0-9]{3}".prop_filter("not the success code", |c| c != "100")
}

/// Messages with XML-special chars and whitespace at either edge.
fn arb_message() -> impl Strategy<Value = String> {
    "[ \t\n]{0,3}[A-Za-z0-9áéíóúñ&<>'\". ]{0,40}[ \t\n]{0,3}"
}

fn arb_uuid() -> impl Strategy<Value = String> {
    "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}"
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn non_success_stamp_codes_are_rejections(code in arb_rejection_code(), message in arb_message()) {
        // Payload is garbage: decoding would fail with a different error.
        let transport = Canned::new(&code, &message, Some("***".into()));
        let err = client(&transport).stamp_xml("<cfdi:Comprobante/>").unwrap_err();
        match err {
            StampError::BusinessRejection { code: c, message: m } => {
                prop_assert_eq!(c, code);
                prop_assert_eq!(m, message);
            }
            other => prop_assert!(false, "expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn non_success_recover_codes_are_rejections(code in arb_rejection_code(), uuid in arb_uuid()) {
        let transport = Canned::new(&code, "rechazado", Some(STANDARD.encode(STAMPED)));
        let err = client(&transport).get_stamp("AAA010101AAA", &uuid).unwrap_err();
        prop_assert_eq!(err.code(), Some(code.as_str()));
    }

    #[test]
    fn recover_always_sends_upper_case(uuid in arb_uuid()) {
        let transport = Canned::new("100", "", Some(STANDARD.encode(STAMPED)));
        client(&transport).get_stamp("AAA010101AAA", &uuid).unwrap();
        prop_assert_eq!(transport.last_argument("uuid"), Some(uuid.to_uppercase()));
    }

    #[test]
    fn cancel_always_sends_upper_case(uuid in arb_uuid()) {
        let transport = Canned::new("201", "", None);
        client(&transport).cancel(&cancellation(&uuid)).unwrap();
        prop_assert_eq!(transport.last_argument("uuid"), Some(uuid.to_uppercase()));
    }

    #[test]
    fn cancel_codes_outside_accepted_set_are_rejections(
        code in "[0-9]{3}".prop_filter("accepted", |c| !["201", "202", "214"].contains(&c.as_str())),
        message in arb_message(),
    ) {
        let transport = Canned::new(&code, &message, None);
        let err = client(&transport).cancel(&cancellation("ABC")).unwrap_err();
        match err {
            StampError::BusinessRejection { code: c, message: m } => {
                prop_assert_eq!(c, code);
                prop_assert_eq!(m, message);
            }
            other => prop_assert!(false, "expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn stamp_payload_is_base64_of_input(xml in "[ -~]{0,200}") {
        let transport = Canned::new("100", "", Some(STANDARD.encode(STAMPED)));
        client(&transport).stamp_xml(&xml).unwrap();
        let sent = transport.last_argument("xmlComprobanteBase64").unwrap_or_default();
        prop_assert_eq!(STANDARD.decode(sent).unwrap(), xml.into_bytes());
    }
}

#[test]
fn operations_name_their_remote_procedures() {
    assert_eq!(Operation::Stamp.method(), "TimbrarCFDI40");
    assert_eq!(Operation::Recover.method(), "RecuperarXML");
    assert_eq!(Operation::Cancel.method(), "CancelarCFDI");
    assert_eq!(Operation::Cancel.parameters().len(), 11);
}
