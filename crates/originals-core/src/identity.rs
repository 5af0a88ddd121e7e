//! # Identifier Newtypes
//!
//! Validated newtypes for the identifiers that cross crate boundaries:
//! [`Did`] for all three identifier layers, and [`SessionId`] for
//! inscription sessions and their provenance records.
//!
//! ## Path-Segment Grammar
//!
//! Web-hosted identifiers end in caller-supplied path segments that are
//! later mapped onto filesystem locations and URLs. A segment is accepted
//! only if it is non-empty, is not `.` or `..`, and contains no path
//! separators (`/`, `\`), no DID component separator (`:`), no whitespace
//! and no control characters. Validation happens before any log material
//! is produced.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IdentifierError;

/// The identifier layer a DID belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DidMethod {
    /// Ephemeral self-certifying layer for private authoring.
    Peer,
    /// Web-hosted, version-controlled layer for public discovery.
    Webvh,
    /// Bitcoin-anchored layer for transferable ownership.
    Btco,
}

impl DidMethod {
    /// Method name as it appears in the DID string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Peer => "peer",
            Self::Webvh => "webvh",
            Self::Btco => "btco",
        }
    }

    /// Parse a method name.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        match s {
            "peer" => Ok(Self::Peer),
            "webvh" => Ok(Self::Webvh),
            "btco" => Ok(Self::Btco),
            other => Err(IdentifierError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for DidMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Decentralized Identifier on one of the supported layers.
///
/// Format: `did:<method>:<method-specific-id>`, where `<method>` is one of
/// `peer`, `webvh`, `btco` and the method-specific id is non-empty and
/// free of whitespace and control characters. Method-specific structure
/// (SCID position, satoshi number) is validated by the owning crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    raw: String,
    method: DidMethod,
}

impl Did {
    /// Parse and validate a DID string.
    pub fn parse(s: impl Into<String>) -> Result<Self, IdentifierError> {
        let raw = s.into();
        let rest = raw
            .strip_prefix("did:")
            .ok_or_else(|| IdentifierError::format(&raw, "missing \"did:\" prefix"))?;
        let (method, specific) = rest
            .split_once(':')
            .ok_or_else(|| IdentifierError::format(&raw, "expected did:<method>:<id>"))?;
        let method = DidMethod::parse(method)?;
        if specific.is_empty() {
            return Err(IdentifierError::format(&raw, "empty method-specific id"));
        }
        if specific.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(IdentifierError::format(
                &raw,
                "whitespace or control character in method-specific id",
            ));
        }
        if specific.split(':').any(str::is_empty) {
            return Err(IdentifierError::format(&raw, "empty component"));
        }
        Ok(Self { raw, method })
    }

    /// The full DID string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The identifier layer.
    pub fn method(&self) -> DidMethod {
        self.method
    }

    /// Everything after `did:<method>:`.
    pub fn method_specific_id(&self) -> &str {
        let prefix_len = "did:".len() + self.method.as_str().len() + 1;
        &self.raw[prefix_len..]
    }

    /// Colon-separated components of the method-specific id.
    pub fn components(&self) -> Vec<&str> {
        self.method_specific_id().split(':').collect()
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for Did {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.raw
    }
}

// ---------------------------------------------------------------------------
// Path segments and domains
// ---------------------------------------------------------------------------

/// Validate a single identifier path segment.
///
/// Segments are URL-unreserved characters only (`[A-Za-z0-9._~-]`) and may
/// not consist solely of dots. Percent escapes, `?` and `#` are rejected so
/// a segment means the same thing as a DID component, a URL path component
/// and a directory name.
pub fn validate_path_segment(segment: &str) -> Result<(), IdentifierError> {
    if segment.is_empty() {
        return Err(IdentifierError::segment(segment, "empty segment"));
    }
    if segment.chars().all(|c| c == '.') {
        return Err(IdentifierError::segment(segment, "relative path segment"));
    }
    if let Some(c) = segment
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '-')))
    {
        return Err(IdentifierError::segment(
            segment,
            format!("forbidden character {c:?}"),
        ));
    }
    Ok(())
}

/// Validate an ordered list of path segments.
pub fn validate_path_segments<S: AsRef<str>>(segments: &[S]) -> Result<(), IdentifierError> {
    segments
        .iter()
        .try_for_each(|s| validate_path_segment(s.as_ref()))
}

/// Validate a host domain, optionally with a `:port` suffix.
///
/// Labels are `[A-Za-z0-9-]`, separated by single dots. Ports are decimal.
pub fn validate_domain(domain: &str) -> Result<(), IdentifierError> {
    let (host, port) = match domain.rsplit_once(':') {
        Some((h, p)) => (h, Some(p)),
        None => (domain, None),
    };
    if host.is_empty() {
        return Err(IdentifierError::format(domain, "empty domain"));
    }
    for label in host.split('.') {
        if label.is_empty() {
            return Err(IdentifierError::format(domain, "empty domain label"));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(IdentifierError::format(domain, "invalid domain character"));
        }
    }
    if let Some(port) = port {
        if port.is_empty() || port.parse::<u16>().is_err() {
            return Err(IdentifierError::format(domain, "invalid port"));
        }
    }
    Ok(())
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
///
/// Used when mapping a domain onto a storage location.
pub fn sanitize_domain(domain: &str) -> String {
    domain
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Unique identifier for an inscription session and its provenance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session:{}", self.0)
    }
}
