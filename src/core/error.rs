use thiserror::Error;

/// Errors returned by the stamping, retrieval and cancellation operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StampError {
    /// The service answered but rejected the request with a non-success code.
    #[error("stamping service rejected the request [{code}]: {message}")]
    BusinessRejection {
        /// Result code exactly as returned by the service.
        code: String,
        /// Human-readable message exactly as returned by the service.
        message: String,
    },

    /// The service reported success but the response breaks the service contract.
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] MalformedResponse),

    /// Network, TLS, HTTP or SOAP fault.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The caller's document could not be serialized.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
}

impl StampError {
    /// Result code of a business rejection, if this is one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::BusinessRejection { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Ways a success response can violate the service contract.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MalformedResponse {
    /// The returned document carries no `TimbreFiscalDigital` complement.
    #[error("TimbreFiscalDigital not found in response")]
    StampNotFound,

    /// The success response carries no document payload.
    #[error("response has no document payload")]
    MissingPayload,

    /// The document payload is not valid base64.
    #[error("document payload is not valid base64: {0}")]
    InvalidBase64(String),

    /// The decoded payload is not a readable document.
    #[error("document payload could not be parsed: {0}")]
    InvalidDocument(DocumentError),

    /// The SOAP envelope is missing required elements or is not well-formed XML.
    #[error("invalid SOAP envelope: {0}")]
    InvalidEnvelope(String),
}

/// Channel-level failures. Raised before any business result is read.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Connection, TLS or timeout failure from the HTTP stack.
    #[cfg(feature = "http")]
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    /// Non-SOAP HTTP status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The service answered with a SOAP fault.
    #[error("SOAP fault [{code}]: {message}")]
    Fault { code: String, message: String },

    /// Response body exceeded `max_received_message_size`.
    #[error("response of {size} bytes exceeds the {limit} byte message limit")]
    MessageTooLarge { size: usize, limit: usize },

    /// Envelope exceeded one of the reader quotas.
    #[error("reader quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Failure reported by a custom transport.
    #[error("transport error: {0}")]
    Other(String),
}

/// Invalid endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The URL could not be parsed.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Only `http` and `https` endpoints are supported.
    #[error("unsupported URL scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),
}

/// Errors raised by a [`Document`](crate::cfdi::Document) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DocumentError {
    /// XML is not well-formed.
    #[error("XML error: {0}")]
    Xml(String),

    /// Bytes are not valid UTF-8.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A required element or attribute is missing.
    #[error("missing {0}")]
    Missing(String),

    /// An attribute has an unparseable value.
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: String, value: String },
}
