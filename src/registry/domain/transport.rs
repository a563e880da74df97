//! Backend transport configuration value objects.

use super::RegistryDomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Transport kind discriminator accepted at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Local process spoken to over its standard streams.
    Subprocess,
    /// Remote URL spoken to over streamable HTTP.
    StreamableHttp,
}

impl TransportKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subprocess => "subprocess",
            Self::StreamableHttp => "streamable_http",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransportKind {
    type Error = RegistryDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "subprocess" | "stdio" => Ok(Self::Subprocess),
            "streamable_http" | "http" => Ok(Self::StreamableHttp),
            _ => Err(RegistryDomainError::UnknownTransport(value.to_owned())),
        }
    }
}

/// Transport settings for a backend launched as a local subprocess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubprocessTransportConfig {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

impl SubprocessTransportConfig {
    /// Creates a new subprocess transport configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptySubprocessCommand`] when `command`
    /// is empty after trimming.
    pub fn new(command: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let normalized_command = command.into().trim().to_owned();
        if normalized_command.is_empty() {
            return Err(RegistryDomainError::EmptySubprocessCommand);
        }

        Ok(Self {
            command: normalized_command,
            args: Vec::new(),
            env: BTreeMap::new(),
        })
    }

    /// Replaces command-line arguments.
    #[must_use]
    pub fn with_args(mut self, values: impl IntoIterator<Item = String>) -> Self {
        self.args = values.into_iter().collect();
        self
    }

    /// Replaces process environment variables.
    #[must_use]
    pub fn with_env(mut self, values: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env = values.into_iter().collect();
        self
    }

    /// Returns the executable command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns command-line arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns environment variables.
    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }
}

/// Transport settings for a backend reachable over streamable HTTP.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamableHttpTransportConfig {
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bearer_token: Option<String>,
}

impl StreamableHttpTransportConfig {
    /// Creates a new streamable HTTP transport configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError`] when `url` is empty or does not start
    /// with `http://` or `https://`.
    pub fn new(url: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let normalized_url = url.into().trim().to_owned();
        if normalized_url.is_empty() {
            return Err(RegistryDomainError::EmptyHttpUrl);
        }

        let has_valid_prefix =
            normalized_url.starts_with("http://") || normalized_url.starts_with("https://");
        if !has_valid_prefix {
            return Err(RegistryDomainError::InvalidHttpUrl(normalized_url));
        }

        Ok(Self {
            url: normalized_url,
            bearer_token: None,
        })
    }

    /// Attaches a bearer credential sent with every request.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyBearerToken`] when the token is
    /// empty after trimming.
    pub fn with_bearer_token(
        mut self,
        token: impl Into<String>,
    ) -> Result<Self, RegistryDomainError> {
        let normalized = token.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(RegistryDomainError::EmptyBearerToken);
        }
        self.bearer_token = Some(normalized);
        Ok(self)
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the optional bearer credential.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }
}

impl fmt::Debug for StreamableHttpTransportConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StreamableHttpTransportConfig")
            .field("url", &self.url)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Supported transport configuration variants.
///
/// Stored as a discriminated JSON blob; only session adapters interpret the
/// payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "config")]
pub enum McpTransport {
    /// MCP over a local process's standard streams.
    Subprocess(SubprocessTransportConfig),
    /// MCP over streamable HTTP.
    StreamableHttp(StreamableHttpTransportConfig),
}

impl McpTransport {
    /// Creates a `subprocess` transport with no arguments or environment.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`SubprocessTransportConfig::new`].
    pub fn subprocess(command: impl Into<String>) -> Result<Self, RegistryDomainError> {
        Ok(Self::Subprocess(SubprocessTransportConfig::new(command)?))
    }

    /// Creates a `streamable_http` transport without credentials.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`StreamableHttpTransportConfig::new`].
    pub fn streamable_http(url: impl Into<String>) -> Result<Self, RegistryDomainError> {
        Ok(Self::StreamableHttp(StreamableHttpTransportConfig::new(
            url,
        )?))
    }

    /// Returns the transport discriminator.
    #[must_use]
    pub const fn kind(&self) -> TransportKind {
        match self {
            Self::Subprocess(_) => TransportKind::Subprocess,
            Self::StreamableHttp(_) => TransportKind::StreamableHttp,
        }
    }
}

/// Untyped transport fields as submitted by a registration caller.
///
/// Only the fields relevant to `kind` are consulted; [`Self::build`] turns
/// them into a validated [`McpTransport`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSpec {
    /// Transport discriminator, `subprocess` or `streamable_http`.
    pub transport: String,
    /// Subprocess command.
    #[serde(default)]
    pub command: Option<String>,
    /// Subprocess arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Subprocess environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Streamable HTTP endpoint.
    #[serde(default)]
    pub url: Option<String>,
    /// Streamable HTTP bearer credential.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl TransportSpec {
    /// Builds a subprocess spec.
    #[must_use]
    pub fn subprocess(command: impl Into<String>) -> Self {
        Self {
            transport: TransportKind::Subprocess.as_str().to_owned(),
            command: Some(command.into()),
            ..Self::default()
        }
    }

    /// Builds a streamable HTTP spec.
    #[must_use]
    pub fn streamable_http(url: impl Into<String>) -> Self {
        Self {
            transport: TransportKind::StreamableHttp.as_str().to_owned(),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Validates the fields required by the selected transport.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError`] when the transport kind is unknown or a
    /// required field is missing or malformed.
    pub fn build(self) -> Result<McpTransport, RegistryDomainError> {
        match TransportKind::try_from(self.transport.as_str())? {
            TransportKind::Subprocess => {
                let command = self
                    .command
                    .ok_or(RegistryDomainError::EmptySubprocessCommand)?;
                let config = SubprocessTransportConfig::new(command)?
                    .with_args(self.args)
                    .with_env(self.env);
                Ok(McpTransport::Subprocess(config))
            }
            TransportKind::StreamableHttp => {
                let url = self.url.ok_or(RegistryDomainError::EmptyHttpUrl)?;
                let config = StreamableHttpTransportConfig::new(url)?;
                let config = match self.bearer_token {
                    Some(token) => config.with_bearer_token(token)?,
                    None => config,
                };
                Ok(McpTransport::StreamableHttp(config))
            }
        }
    }
}
