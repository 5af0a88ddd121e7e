//! Cache errors.

use originals_core::CanonicalizationError;
use thiserror::Error;

/// Errors from cache writes.
///
/// Reads never fail: expiry and integrity problems degrade to a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The document could not be canonicalized for hashing.
    #[error("cannot hash document for {id}: {source}")]
    Canonicalization {
        id: String,
        #[source]
        source: CanonicalizationError,
    },

    /// A zero TTL was requested.
    #[error("TTL for {id} must be greater than zero")]
    InvalidTtl { id: String },
}
