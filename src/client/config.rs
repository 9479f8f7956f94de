use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::core::ConfigError;

/// Production stamping endpoint.
pub const URL_PRODUCTION: &str = "https://timbradosoap.solucionesdfacture.com/WSTimbradoSOAP.svc";

/// Test stamping endpoint (plain HTTP).
pub const URL_TEST: &str = "http://timbradosoap33.testdfacture.com/WSTimbradoSOAP.svc";

/// Whether the channel is encrypted. Always follows the endpoint scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SecurityMode {
    /// `https`: TLS transport security.
    Transport,
    /// `http`: no transport security.
    None,
}

/// How the server certificate is checked on `https` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustPolicy {
    /// Verify the certificate chain and host name.
    #[default]
    Verify,
    /// Accept any server certificate. Only for endpoints with broken chains.
    AcceptAnyCertificate,
}

/// Message size and reader quotas applied to every call.
///
/// Stamped documents travel base64-encoded inside the envelope and can be
/// large, so every limit defaults to its maximum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelLimits {
    /// Largest accepted response body in bytes.
    pub max_received_message_size: usize,
    /// Deepest accepted element nesting in the response envelope.
    pub max_depth: usize,
    /// Longest accepted text content in the response envelope.
    pub max_string_content_length: usize,
}

impl ChannelLimits {
    pub const UNBOUNDED: Self = Self {
        max_received_message_size: usize::MAX,
        max_depth: usize::MAX,
        max_string_content_length: usize::MAX,
    };
}

impl Default for ChannelLimits {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Channel descriptor shared by all operations of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    endpoint: Url,
    security: SecurityMode,
    /// Server certificate policy.
    pub trust: TrustPolicy,
    /// Size quotas.
    pub limits: ChannelLimits,
    /// Request timeout. `None` keeps the HTTP stack default.
    pub timeout: Option<Duration>,
}

impl Binding {
    pub fn new(url: &str) -> Result<Self, ConfigError> {
        let (endpoint, security) = parse_endpoint(url)?;
        Ok(Self {
            endpoint,
            security,
            trust: TrustPolicy::default(),
            limits: ChannelLimits::default(),
            timeout: None,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn security(&self) -> SecurityMode {
        self.security
    }

    /// Point the binding at another URL. Endpoint and security mode change
    /// together; on error neither changes.
    pub fn set_url(&mut self, url: &str) -> Result<(), ConfigError> {
        let (endpoint, security) = parse_endpoint(url)?;
        self.endpoint = endpoint;
        self.security = security;
        Ok(())
    }
}

fn parse_endpoint(url: &str) -> Result<(Url, SecurityMode), ConfigError> {
    let endpoint = Url::parse(url.trim()).map_err(|e| ConfigError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let security = match endpoint.scheme() {
        "https" => SecurityMode::Transport,
        "http" => SecurityMode::None,
        other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
    };
    Ok((endpoint, security))
}

/// Credentials and binding of a stamping client.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ClientConfigFile")]
pub struct ClientConfig {
    username: String,
    password: String,
    binding: Binding,
}

impl ClientConfig {
    /// Start a configuration against [`URL_PRODUCTION`].
    pub fn builder(username: impl Into<String>, password: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            username: username.into(),
            password: password.into(),
            url: URL_PRODUCTION.to_string(),
            trust: TrustPolicy::default(),
            limits: ChannelLimits::default(),
            timeout: None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn url(&self) -> &str {
        self.binding.endpoint.as_str()
    }

    pub fn security(&self) -> SecurityMode {
        self.binding.security
    }

    pub fn set_url(&mut self, url: &str) -> Result<(), ConfigError> {
        self.binding.set_url(url)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("binding", &self.binding)
            .finish()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
#[must_use]
pub struct ClientConfigBuilder {
    username: String,
    password: String,
    url: String,
    trust: TrustPolicy,
    limits: ChannelLimits,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn trust_policy(mut self, trust: TrustPolicy) -> Self {
        self.trust = trust;
        self
    }

    /// Shortcut for [`TrustPolicy::AcceptAnyCertificate`].
    pub fn accept_invalid_certificates(self) -> Self {
        self.trust_policy(TrustPolicy::AcceptAnyCertificate)
    }

    pub fn limits(mut self, limits: ChannelLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if the URL is unparseable or not `http`/`https`.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let mut binding = Binding::new(&self.url)?;
        binding.trust = self.trust;
        binding.limits = self.limits;
        binding.timeout = self.timeout;
        Ok(ClientConfig {
            username: self.username,
            password: self.password,
            binding,
        })
    }
}

/// On-disk shape of a [`ClientConfig`].
#[derive(Deserialize)]
struct ClientConfigFile {
    username: String,
    password: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    trust: TrustPolicy,
    #[serde(default)]
    limits: ChannelLimits,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl TryFrom<ClientConfigFile> for ClientConfig {
    type Error = ConfigError;

    fn try_from(file: ClientConfigFile) -> Result<Self, Self::Error> {
        let mut builder = ClientConfig::builder(file.username, file.password)
            .trust_policy(file.trust)
            .limits(file.limits);
        if let Some(url) = file.url {
            builder = builder.url(url);
        }
        if let Some(secs) = file.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}
