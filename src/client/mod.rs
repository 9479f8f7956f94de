//! Stamping, retrieval and cancellation against the DFacture service.
//!
//! Every operation opens its own channel, makes exactly one remote call and
//! returns either a typed result or a [`StampError`]. Retrying is left to
//! the caller.
//!
//! # Example
//!
//! ```no_run
//! use dfacture::client::{ClientConfig, StampClient, URL_TEST};
//!
//! let config = ClientConfig::builder("DEMO", "cfdi").url(URL_TEST).build()?;
//! let client = StampClient::new(config);
//! let stamp = client.stamp_xml(&std::fs::read_to_string("signed.xml")?)?;
//! println!("{}", stamp.uuid);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod soap;
mod transport;

pub use config::{
    Binding, ChannelLimits, ClientConfig, ClientConfigBuilder, SecurityMode, TrustPolicy,
    URL_PRODUCTION, URL_TEST,
};
pub use soap::{Operation, SERVICE_CONTRACT, SERVICE_NS, SOAP_ENVELOPE_NS, SoapRequest};
pub use transport::Transport;
#[cfg(feature = "http")]
pub use transport::HttpTransport;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::marker::PhantomData;
use tracing::debug;

use crate::cfdi::{Cfdi, Document};
use crate::core::{
    CancellationRequest, CancellationStatus, ConfigError, MalformedResponse, StampError,
    StampResult,
};
use soap::{RemoteResponse, parse_response};

/// Result code of a successful stamp or recover call.
pub const CODE_STAMPED: &str = "100";

/// Result codes accepted for a cancellation.
pub const CANCELLATION_ACCEPTED_CODES: [&str; 3] = ["201", "202", "214"];

/// Client for the stamping service.
///
/// `T` carries the request; `D` is the document type returned documents are
/// parsed into.
pub struct StampClient<T, D = Cfdi> {
    config: ClientConfig,
    transport: T,
    _document: PhantomData<fn() -> D>,
}

#[cfg(feature = "http")]
impl StampClient<HttpTransport> {
    /// Client over HTTP that reads responses as [`Cfdi`].
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T: Transport, D: Document> StampClient<T, D> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            _document: PhantomData,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Retarget the client. The next call uses the new endpoint and the
    /// security mode derived from its scheme.
    pub fn set_url(&mut self, url: &str) -> Result<(), ConfigError> {
        self.config.set_url(url)
    }

    /// Stamp a signed document.
    pub fn stamp(&self, document: &D) -> Result<StampResult, StampError> {
        let bytes = document.to_xml_bytes()?;
        self.stamp_bytes(&bytes)
    }

    /// Stamp a signed document given as XML text.
    pub fn stamp_xml(&self, xml: &str) -> Result<StampResult, StampError> {
        self.stamp_bytes(xml.as_bytes())
    }

    /// Stamp a signed document given as raw XML bytes.
    pub fn stamp_bytes(&self, xml: &[u8]) -> Result<StampResult, StampError> {
        self.stamp_base64(&STANDARD.encode(xml))
    }

    /// Stamp a document that is already base64-encoded.
    ///
    /// # Errors
    ///
    /// - [`StampError::BusinessRejection`] for any code other than `100`.
    /// - [`StampError::MalformedResponse`] when the returned document is
    ///   missing, unreadable or carries no `TimbreFiscalDigital`.
    /// - [`StampError::Transport`] for channel failures.
    pub fn stamp_base64(&self, xml_base64: &str) -> Result<StampResult, StampError> {
        let response = self.invoke(
            Operation::Stamp,
            vec![
                Some(self.config.username().to_string()),
                Some(self.config.password().to_string()),
                Some(xml_base64.to_string()),
            ],
        )?;
        extract_stamp::<D>(response.accept(&[CODE_STAMPED])?)
    }

    /// Fetch the stamp of a previously stamped document.
    ///
    /// The UUID is sent upper-cased. `issuer` identifies the emitting RFC for
    /// tracing; the remote procedure keys on the UUID alone.
    pub fn get_stamp(&self, issuer: &str, uuid: &str) -> Result<StampResult, StampError> {
        debug!(issuer, "recovering stamp");
        let response = self.invoke(
            Operation::Recover,
            vec![
                Some(self.config.username().to_string()),
                Some(self.config.password().to_string()),
                Some(uuid.to_uppercase()),
            ],
        )?;
        extract_stamp::<D>(response.accept(&[CODE_STAMPED])?)
    }

    /// Cancel a stamped document. `Ok(true)` for every accepted state.
    pub fn cancel(&self, request: &CancellationRequest) -> Result<bool, StampError> {
        self.cancel_with_status(request).map(|_| true)
    }

    /// Cancel a stamped document and report which accepted state the
    /// service answered with.
    pub fn cancel_with_status(
        &self,
        request: &CancellationRequest,
    ) -> Result<CancellationStatus, StampError> {
        let response = self.invoke(
            Operation::Cancel,
            vec![
                Some(self.config.username().to_string()),
                Some(self.config.password().to_string()),
                Some(request.issuer.clone()),
                Some(request.recipient.clone()),
                Some(request.uuid.to_uppercase()),
                Some(request.total.clone()),
                Some(request.certificate_base64.clone()),
                Some(request.private_key_base64.clone()),
                Some(request.private_key_password.clone()),
                Some(request.reason.code().to_string()),
                // Normalized like `uuid` on purpose; callers may pass either case.
                request.related_uuid.as_deref().map(str::to_uppercase),
            ],
        )?;
        let response = response.accept(&CANCELLATION_ACCEPTED_CODES)?;
        CancellationStatus::from_code(response.code.trim()).ok_or_else(|| {
            StampError::BusinessRejection {
                code: response.code,
                message: response.message,
            }
        })
    }

    fn invoke(
        &self,
        operation: Operation,
        arguments: Vec<Option<String>>,
    ) -> Result<RemoteResponse, StampError> {
        let binding = self.config.binding();
        debug!(
            operation = operation.method(),
            endpoint = %binding.endpoint(),
            security = ?binding.security(),
            "calling stamping service"
        );
        let request = SoapRequest::new(operation, arguments)?;
        let body = self.transport.call(binding, &request)?;
        let response = parse_response(operation, &body, &binding.limits)?;
        debug!(
            operation = operation.method(),
            code = %response.code,
            "stamping service answered"
        );
        Ok(response)
    }
}

/// Decode the returned document and copy out its first stamp.
fn extract_stamp<D: Document>(response: RemoteResponse) -> Result<StampResult, StampError> {
    let payload = response.xml.ok_or(MalformedResponse::MissingPayload)?;
    // Line-wrapped payloads are valid; drop every whitespace byte before decoding.
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| MalformedResponse::InvalidBase64(e.to_string()))?;
    let document = D::from_xml_bytes(&bytes).map_err(MalformedResponse::InvalidDocument)?;
    let tfd = document
        .find_stamp()
        .ok_or(MalformedResponse::StampNotFound)?;
    Ok(StampResult::from_complement(tfd))
}

impl<T: std::fmt::Debug, D> std::fmt::Debug for StampClient<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StampClient")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .finish()
    }
}
