use super::config::Binding;
use super::soap::SoapRequest;
use crate::core::TransportError;

/// Sends one SOAP request and returns the raw response envelope.
///
/// Implementations open a channel for the call and release it before
/// returning, on success and on error alike.
pub trait Transport {
    fn call(&self, binding: &Binding, request: &SoapRequest) -> Result<String, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn call(&self, binding: &Binding, request: &SoapRequest) -> Result<String, TransportError> {
        (**self).call(binding, request)
    }
}

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use reqwest::StatusCode;
    use reqwest::blocking::Client;
    use reqwest::header::{CONTENT_TYPE, HeaderValue};

    use super::*;
    use crate::client::config::{SecurityMode, TrustPolicy};

    /// Blocking HTTP transport on `reqwest` + rustls.
    ///
    /// A fresh client is built for every call and dropped when the call
    /// returns, so no connection outlives a single operation.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct HttpTransport;

    impl HttpTransport {
        pub fn new() -> Self {
            Self
        }

        fn open(binding: &Binding) -> Result<Client, TransportError> {
            let mut builder = Client::builder().https_only(binding.security() == SecurityMode::Transport);
            if binding.trust == TrustPolicy::AcceptAnyCertificate {
                builder = builder.danger_accept_invalid_certs(true);
            }
            if let Some(timeout) = binding.timeout {
                builder = builder.timeout(timeout);
            }
            builder.build().map_err(|source| TransportError::Http {
                endpoint: binding.endpoint().to_string(),
                source,
            })
        }
    }

    impl Transport for HttpTransport {
        fn call(&self, binding: &Binding, request: &SoapRequest) -> Result<String, TransportError> {
            let endpoint = binding.endpoint().to_string();
            let http_err = |source| TransportError::Http {
                endpoint: endpoint.clone(),
                source,
            };
            let limit = binding.limits.max_received_message_size;

            let channel = Self::open(binding)?;
            let resp = channel
                .post(binding.endpoint().clone())
                .header(CONTENT_TYPE, HeaderValue::from_static("text/xml; charset=utf-8"))
                .header("SOAPAction", format!("\"{}\"", request.soap_action()))
                .body(request.envelope().to_string())
                .send()
                .map_err(http_err)?;

            if let Some(len) = resp.content_length() {
                let size = usize::try_from(len).unwrap_or(usize::MAX);
                if size > limit {
                    return Err(TransportError::MessageTooLarge { size, limit });
                }
            }

            let status = resp.status();
            let body = resp.text().map_err(http_err)?;
            if body.len() > limit {
                return Err(TransportError::MessageTooLarge {
                    size: body.len(),
                    limit,
                });
            }

            // SOAP 1.1 faults arrive as 500 with an envelope body.
            if status.is_success() || (status == StatusCode::INTERNAL_SERVER_ERROR && !body.is_empty()) {
                Ok(body)
            } else {
                Err(TransportError::Status {
                    endpoint,
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
