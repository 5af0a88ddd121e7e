//! # `did:webvh` Identifiers
//!
//! `did:webvh:<scid>:<domain>[:<segment>...]`. A port in the domain is
//! written with a percent-encoded colon (`example.com%3A8080`) so the colon
//! separator stays unambiguous.

use originals_core::{validate_domain, validate_path_segments, Did, DidMethod, IdentifierError};

/// Placeholder substituted for the SCID while it is being derived.
pub const SCID_PLACEHOLDER: &str = "{SCID}";

/// A parsed `did:webvh` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebvhDid {
    scid: String,
    domain: String,
    path: Vec<String>,
}

impl WebvhDid {
    /// Build from parts, validating the domain and every path segment.
    pub fn new(
        scid: impl Into<String>,
        domain: impl Into<String>,
        path: Vec<String>,
    ) -> Result<Self, IdentifierError> {
        let scid = scid.into();
        let domain = domain.into();
        validate_domain(&domain)?;
        validate_path_segments(&path)?;
        if scid.is_empty() || !scid.chars().all(|c| c.is_ascii_alphanumeric() || "{}".contains(c)) {
            return Err(IdentifierError::format(&scid, "invalid SCID"));
        }
        Ok(Self { scid, domain, path })
    }

    /// Parse a `did:webvh` string.
    ///
    /// Requires at least an SCID and a domain after the method name.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let did = Did::parse(s)?;
        if did.method() != DidMethod::Webvh {
            return Err(IdentifierError::format(s, "expected did:webvh"));
        }
        let components = did.components();
        let [scid, domain, path @ ..] = components.as_slice() else {
            return Err(IdentifierError::format(s, "expected did:webvh:<scid>:<domain>"));
        };
        let domain = domain.replace("%3A", ":").replace("%3a", ":");
        Self::new(
            *scid,
            domain,
            path.iter().map(|p| p.to_string()).collect(),
        )
        .map_err(|e| match e {
            IdentifierError::InvalidFormat { reason, .. } => IdentifierError::format(s, reason),
            other => other,
        })
    }

    /// The self-certifying identifier component.
    pub fn scid(&self) -> &str {
        &self.scid
    }

    /// Host domain, with any port decoded (`example.com:8080`).
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Ordered path segments.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Same domain and path with a different SCID.
    pub(crate) fn with_scid(&self, scid: &str) -> Self {
        Self {
            scid: scid.to_string(),
            domain: self.domain.clone(),
            path: self.path.clone(),
        }
    }

    /// Same identifier ignoring the SCID.
    pub fn same_location(&self, other: &Self) -> bool {
        self.domain == other.domain && self.path == other.path
    }
}

impl std::fmt::Display for WebvhDid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "did:webvh:{}:{}", self.scid, self.domain.replace(':', "%3A"))?;
        for seg in &self.path {
            write!(f, ":{seg}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for WebvhDid {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
