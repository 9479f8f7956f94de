//! SOAP 1.1 envelopes for the `WSTimbradoSOAP` service.
//!
//! Requests are document/literal calls in the `http://tempuri.org/`
//! namespace. Every response carries `codigo`, `mensaje` and, for stamp and
//! recover, a base64 `xml` element inside `<Operation>Result`. Response
//! elements are matched by local name since the service prefixes its data
//! contract members.

use quick_xml::Reader;
use quick_xml::events::Event;

use super::config::ChannelLimits;
use crate::cfdi::xml_utils::{XmlWriter, local_name};
use crate::core::{DocumentError, MalformedResponse, StampError, TransportError};

pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SERVICE_NS: &str = "http://tempuri.org/";
pub const SERVICE_CONTRACT: &str = "IWSTimbradoSOAP";

/// Remote procedures exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Stamp,
    Recover,
    Cancel,
}

impl Operation {
    /// Remote method name.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Stamp => "TimbrarCFDI40",
            Self::Recover => "RecuperarXML",
            Self::Cancel => "CancelarCFDI",
        }
    }

    /// Parameter names in wire order.
    pub fn parameters(&self) -> &'static [&'static str] {
        match self {
            Self::Stamp => &["usuario", "contrasena", "xmlComprobanteBase64"],
            Self::Recover => &["usuario", "contrasena", "uuid"],
            Self::Cancel => &[
                "usuario",
                "contrasena",
                "rfcEmisor",
                "rfcReceptor",
                "uuid",
                "total",
                "certificado",
                "llavePrivada",
                "passwordLlave",
                "motivo",
                "folioSustitucion",
            ],
        }
    }

    /// Value of the `SOAPAction` header.
    pub fn soap_action(&self) -> String {
        format!("{SERVICE_NS}{SERVICE_CONTRACT}/{}", self.method())
    }

    fn result_element(&self) -> String {
        format!("{}Result", self.method())
    }
}

/// A serialized call, ready for a [`Transport`](super::Transport).
#[derive(Clone)]
pub struct SoapRequest {
    operation: Operation,
    arguments: Vec<(&'static str, Option<String>)>,
    envelope: String,
}

impl SoapRequest {
    /// Build the envelope. `None` arguments are omitted from the body.
    ///
    /// `arguments` must line up with [`Operation::parameters`].
    pub(crate) fn new(
        operation: Operation,
        arguments: Vec<Option<String>>,
    ) -> Result<Self, DocumentError> {
        let names = operation.parameters();
        debug_assert_eq!(
            arguments.len(),
            names.len(),
            "{} takes {} arguments",
            operation.method(),
            names.len()
        );
        let arguments: Vec<_> = names.iter().copied().zip(arguments).collect();

        let mut w = XmlWriter::bare();
        w.start_element_with_attrs("s:Envelope", &[("xmlns:s", SOAP_ENVELOPE_NS)])?;
        w.start_element("s:Body")?;
        w.start_element_with_attrs(operation.method(), &[("xmlns", SERVICE_NS)])?;
        for (name, value) in &arguments {
            if let Some(value) = value {
                w.text_element(name, value)?;
            }
        }
        w.end_element(operation.method())?;
        w.end_element("s:Body")?;
        w.end_element("s:Envelope")?;

        Ok(Self {
            operation,
            arguments,
            envelope: w.into_string()?,
        })
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn soap_action(&self) -> String {
        self.operation.soap_action()
    }

    pub fn envelope(&self) -> &str {
        &self.envelope
    }

    /// Value sent for a named parameter.
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.as_deref())
    }
}

impl std::fmt::Debug for SoapRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoapRequest")
            .field("operation", &self.operation)
            .field("envelope_len", &self.envelope.len())
            .finish()
    }
}

/// Business result of one remote call. Lives only for the duration of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoteResponse {
    pub code: String,
    pub message: String,
    pub xml: Option<String>,
}

impl RemoteResponse {
    /// Turn a non-accepted code into a business rejection.
    /// Codes compare without surrounding whitespace; a rejection keeps them as sent.
    pub fn accept(self, accepted: &[&str]) -> Result<Self, StampError> {
        if accepted.contains(&self.code.trim()) {
            Ok(self)
        } else {
            Err(StampError::BusinessRejection {
                code: self.code,
                message: self.message,
            })
        }
    }
}

#[derive(Default)]
struct Fault {
    code: String,
    message: String,
}

/// Read a response envelope, enforcing the reader quotas.
pub(crate) fn parse_response(
    operation: Operation,
    body: &str,
    limits: &ChannelLimits,
) -> Result<RemoteResponse, StampError> {
    let result_element = operation.result_element();
    // Text is kept as sent; `mensaje` reaches callers verbatim.
    let mut reader = Reader::from_str(body);

    let mut path: Vec<String> = Vec::new();
    let mut code: Option<String> = None;
    let mut message: Option<String> = None;
    let mut xml: Option<String> = None;
    let mut in_result = false;
    let mut fault: Option<Fault> = None;

    loop {
        let text = match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(&String::from_utf8_lossy(e.name().as_ref())).to_string();
                if path.len() >= limits.max_depth {
                    return Err(TransportError::QuotaExceeded(format!(
                        "element depth exceeds {}",
                        limits.max_depth
                    ))
                    .into());
                }
                if name == result_element {
                    in_result = true;
                }
                if name == "Fault" {
                    fault = Some(Fault::default());
                }
                path.push(name);
                continue;
            }
            Ok(Event::End(_)) => {
                if let Some(ended) = path.pop() {
                    if ended == result_element {
                        in_result = false;
                    }
                    if ended == "Fault" {
                        if let Some(f) = fault.take() {
                            return Err(TransportError::Fault {
                                code: f.code,
                                message: f.message,
                            }
                            .into());
                        }
                    }
                }
                continue;
            }
            Ok(Event::Text(ref e)) => e
                .unescape()
                .map_err(|e| MalformedResponse::InvalidEnvelope(e.to_string()))?
                .into_owned(),
            Ok(Event::CData(e)) => String::from_utf8_lossy(&e.into_inner()).into_owned(),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MalformedResponse::InvalidEnvelope(format!(
                    "parse error at position {}: {e}",
                    reader.error_position()
                ))
                .into());
            }
            _ => continue,
        };

        if text.len() > limits.max_string_content_length {
            return Err(TransportError::QuotaExceeded(format!(
                "text content of {} bytes exceeds {}",
                text.len(),
                limits.max_string_content_length
            ))
            .into());
        }

        let Some(current) = path.last() else {
            continue;
        };
        if let Some(f) = fault.as_mut() {
            match current.as_str() {
                "faultcode" => f.code.push_str(&text),
                "faultstring" => f.message.push_str(&text),
                _ => {}
            }
        } else if in_result {
            let slot = match current.as_str() {
                "codigo" => &mut code,
                "mensaje" => &mut message,
                "xml" => &mut xml,
                _ => continue,
            };
            slot.get_or_insert_with(String::new).push_str(&text);
        }
    }

    let code = code.ok_or_else(|| {
        MalformedResponse::InvalidEnvelope(format!("{result_element} has no codigo"))
    })?;
    Ok(RemoteResponse {
        code,
        message: message.unwrap_or_default(),
        xml: xml.filter(|x| !x.trim().is_empty()),
    })
}
