//! Shared value objects used across multiple bounded contexts

use crate::domain::shared::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Call identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat room identifier, as handed out by the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SIP address value object
///
/// Only the parts the orchestration core needs: who is on the other end
/// and how to show them. Full interpretation of dialed strings belongs to
/// the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SipAddress {
    display_name: Option<String>,
    user: Option<String>,
    host: String,
    port: Option<u16>,
}

impl SipAddress {
    pub fn new(user: Option<String>, host: String, port: Option<u16>) -> Self {
        Self {
            display_name: None,
            user,
            host,
            port,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Parse `sip:user@host[:port]` or `sips:...`, optionally wrapped as
    /// `"Display" <sip:...>`.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let input = input.trim();
        let (display_name, uri) = match (input.find('<'), input.rfind('>')) {
            (Some(start), Some(end)) if start < end => {
                let name = input[..start].trim().trim_matches('"').trim();
                let name = (!name.is_empty()).then(|| name.to_string());
                (name, &input[start + 1..end])
            }
            _ => (None, input),
        };

        let rest = uri
            .strip_prefix("sip:")
            .or_else(|| uri.strip_prefix("sips:"))
            .ok_or_else(|| DomainError::InvalidAddress(format!("missing sip scheme: {}", uri)))?;

        // Drop URI parameters and headers
        let rest = rest.split([';', '?']).next().unwrap_or_default();

        let (user, host_port) = match rest.rsplit_once('@') {
            Some((user, host_port)) if !user.is_empty() => (Some(user.to_string()), host_port),
            Some(_) => return Err(DomainError::InvalidAddress(format!("empty user: {}", uri))),
            None => (None, rest),
        };

        let (host, port) = match host_port.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| DomainError::InvalidAddress(format!("bad port: {}", uri)))?;
                (host, Some(port))
            }
            None => (host_port, None),
        };

        if host.is_empty() {
            return Err(DomainError::InvalidAddress(format!("empty host: {}", uri)));
        }

        Ok(Self {
            display_name,
            user,
            host: host.to_string(),
            port,
        })
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Name suitable for UI and file names: display name, then user, then
    /// the bare URI.
    pub fn friendly_name(&self) -> String {
        self.display_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| self.user.clone())
            .unwrap_or_else(|| self.uri_only())
    }

    /// The address without display name
    pub fn uri_only(&self) -> String {
        let mut uri = String::from("sip:");
        if let Some(user) = &self.user {
            uri.push_str(user);
            uri.push('@');
        }
        uri.push_str(&self.host);
        if let Some(port) = self.port {
            uri.push(':');
            uri.push_str(&port.to_string());
        }
        uri
    }
}

impl fmt::Display for SipAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "\"{}\" <{}>", name, self.uri_only()),
            None => f.write_str(&self.uri_only()),
        }
    }
}
