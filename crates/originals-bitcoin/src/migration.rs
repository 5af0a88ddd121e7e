//! # Migration Provenance
//!
//! A finalized inscription session yields a [`MigrationRecord`] linking the
//! source identifier to the new `did:btco` identifier. Neither identifier
//! is modified; the record is the only link between them.

use std::str::FromStr;

use originals_core::{ContentDigest, DigestAlgorithm, SessionId, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::Network;
use crate::error::{BitcoinError, Result};

/// `did:btco:[<net>:]<sat>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BtcoDid {
    pub network: Network,
    pub sat: u64,
}

impl BtcoDid {
    pub fn new(network: Network, sat: u64) -> Self {
        Self { network, sat }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &str| BitcoinError::InvalidDid {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let rest = s
            .strip_prefix("did:btco:")
            .ok_or_else(|| invalid("missing \"did:btco:\" prefix"))?;
        let (network, sat) = match rest.split_once(':') {
            None => (Network::Mainnet, rest),
            Some(("test", sat)) => (Network::Testnet, sat),
            Some(("sig", sat)) => (Network::Signet, sat),
            Some(("reg", sat)) => (Network::Regtest, sat),
            Some(_) => return Err(invalid("unknown network prefix")),
        };
        if sat.is_empty() || !sat.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("satoshi number must be decimal digits"));
        }
        let sat = sat
            .parse::<u64>()
            .map_err(|_| invalid("satoshi number out of range"))?;
        Ok(Self { network, sat })
    }
}

impl std::fmt::Display for BtcoDid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "did:btco:{}{}", self.network.btco_prefix(), self.sat)
    }
}

impl FromStr for BtcoDid {
    type Err = BitcoinError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for BtcoDid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BtcoDid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Inscription id of the first inscription in a reveal transaction.
pub fn inscription_id(reveal_txid: &bitcoin::Txid) -> String {
    format!("{reveal_txid}i0")
}

/// SHA-256 of raw inscription body bytes.
pub fn payload_digest(body: &[u8]) -> ContentDigest {
    ContentDigest::new(DigestAlgorithm::Sha256, Sha256::digest(body).into())
}

/// Provenance of one web-to-Bitcoin migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    pub session_id: SessionId,
    pub source_did: String,
    pub target_did: BtcoDid,
    pub inscription_id: String,
    pub commit_txid: String,
    pub reveal_txid: String,
    /// `sha256:<hex>` of the inscribed body.
    pub payload_digest: String,
    pub timestamp: Timestamp,
}
