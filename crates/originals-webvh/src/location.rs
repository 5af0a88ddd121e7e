//! # Document Location
//!
//! Storage path: `<sanitized domain>/<segment>.../did.jsonl`.
//! Resolution URL: `https://<domain>/<segment>.../did.jsonl`, or
//! `https://<domain>/.well-known/did.jsonl` when there are no segments.

use std::path::PathBuf;

use originals_core::{sanitize_domain, validate_domain, validate_path_segments};

use crate::did::WebvhDid;
use crate::error::WebvhError;

/// Fixed log file name.
pub const LOG_FILE_NAME: &str = "did.jsonl";

/// Relative storage path for the log of `domain` + `segments`.
pub fn log_path<S: AsRef<str>>(domain: &str, segments: &[S]) -> Result<PathBuf, WebvhError> {
    validate_path_segments(segments)?;
    validate_domain(domain)?;
    let mut path = PathBuf::from(sanitize_domain(domain));
    for seg in segments {
        path.push(seg.as_ref());
    }
    path.push(LOG_FILE_NAME);
    Ok(path)
}

/// HTTPS URL the log is served from.
pub fn log_url<S: AsRef<str>>(domain: &str, segments: &[S]) -> Result<String, WebvhError> {
    validate_domain(domain)?;
    validate_path_segments(segments)?;
    if segments.is_empty() {
        return Ok(format!("https://{domain}/.well-known/{LOG_FILE_NAME}"));
    }
    let joined: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
    Ok(format!("https://{domain}/{}/{LOG_FILE_NAME}", joined.join("/")))
}

impl WebvhDid {
    /// Storage path of this identifier's log.
    pub fn log_path(&self) -> Result<PathBuf, WebvhError> {
        log_path(self.domain(), self.path())
    }

    /// Resolution URL of this identifier's log.
    pub fn log_url(&self) -> Result<String, WebvhError> {
        log_url(self.domain(), self.path())
    }
}
