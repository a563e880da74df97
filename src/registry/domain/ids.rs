//! Identifier and validated-name types for servers and tools.

use super::RegistryDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length for an MCP server name, matching `VARCHAR(100)`.
const MAX_SERVER_NAME_LENGTH: usize = 100;

/// Separator between the server and tool parts of a qualified tool name.
pub const TOOL_NAME_SEPARATOR: char = '.';

/// Unique identifier for a registered backend server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct McpServerId(Uuid);

impl McpServerId {
    /// Creates a new random server identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a server identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for McpServerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for McpServerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Unique identifier for a catalogued tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolId(Uuid);

impl ToolId {
    /// Creates a new random tool identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tool identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ToolId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated MCP server name.
///
/// Server names form the first half of every qualified tool name, so they
/// may not contain the [`TOOL_NAME_SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct McpServerName(String);

impl McpServerName {
    /// Creates a validated MCP server name.
    ///
    /// The input is trimmed. Only ASCII letters, digits, `_` and `-` are
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let normalized = value.into().trim().to_owned();

        if normalized.is_empty() {
            return Err(RegistryDomainError::EmptyServerName);
        }

        let is_valid = normalized.chars().all(|character| {
            character.is_ascii_alphanumeric() || character == '_' || character == '-'
        });
        if !is_valid {
            return Err(RegistryDomainError::InvalidServerName(normalized));
        }

        if normalized.len() > MAX_SERVER_NAME_LENGTH {
            return Err(RegistryDomainError::ServerNameTooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the server name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for McpServerName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for McpServerName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<String> for McpServerName {
    type Error = RegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<McpServerName> for String {
    fn from(value: McpServerName) -> Self {
        value.0
    }
}

/// Externally visible tool identifier, `<server>.<tool>`.
///
/// Tool names are unique only within their owning server, so every caller
/// outside the catalog addresses tools through this composite key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedToolName {
    server: McpServerName,
    tool: String,
}

impl QualifiedToolName {
    /// Builds a qualified name from its parts.
    ///
    /// `tool` is kept exactly as the backend reported it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyToolName`] when `tool` is empty.
    pub fn new(server: McpServerName, tool: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let reported: String = tool.into();
        if reported.is_empty() {
            return Err(RegistryDomainError::EmptyToolName);
        }
        Ok(Self {
            server,
            tool: reported,
        })
    }

    /// Parses `<server>.<tool>`.
    ///
    /// The split happens at the first separator: server names cannot contain
    /// it, tool names reported by a backend may. Surrounding whitespace is
    /// ignored on the server half only.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::MalformedQualifiedToolName`] when the
    /// separator is missing or the tool half is empty, or server-name
    /// validation errors.
    pub fn parse(value: &str) -> Result<Self, RegistryDomainError> {
        let malformed = || RegistryDomainError::MalformedQualifiedToolName(value.to_owned());
        let (server, tool) = value.split_once(TOOL_NAME_SEPARATOR).ok_or_else(malformed)?;
        if tool.is_empty() {
            return Err(malformed());
        }
        Self::new(McpServerName::new(server)?, tool)
    }

    /// Returns the owning server name.
    #[must_use]
    pub const fn server(&self) -> &McpServerName {
        &self.server
    }

    /// Returns the tool name as reported by the backend.
    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }
}

impl fmt::Display for QualifiedToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}{TOOL_NAME_SEPARATOR}{}", self.server, self.tool)
    }
}

impl Serialize for QualifiedToolName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QualifiedToolName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// What an enable or disable request addresses: one tool, or every tool of
/// one server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolTarget {
    /// A single tool.
    Tool(QualifiedToolName),
    /// All tools of a server.
    Server(McpServerName),
}

impl ToolTarget {
    /// Parses a target: values containing the separator name a tool,
    /// anything else names a server.
    ///
    /// # Errors
    ///
    /// Returns name validation errors for either form.
    pub fn parse(value: &str) -> Result<Self, RegistryDomainError> {
        if value.contains(TOOL_NAME_SEPARATOR) {
            Ok(Self::Tool(QualifiedToolName::parse(value)?))
        } else {
            Ok(Self::Server(McpServerName::new(value)?))
        }
    }
}

impl fmt::Display for ToolTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool(name) => name.fmt(formatter),
            Self::Server(name) => name.fmt(formatter),
        }
    }
}
