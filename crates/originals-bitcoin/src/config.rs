//! Network selection and Bitcoin settings.

use std::str::FromStr;

use bitcoin::Amount;
use originals_core::{env_parse, ConfigError};
use serde::{Deserialize, Serialize};

use crate::error::{BitcoinError, Result};
use crate::fee::FeeRate;

/// Default fee rate in sat/vB.
pub const DEFAULT_FEE_RATE: f64 = 10.0;

/// Default dust floor in sats.
pub const DEFAULT_DUST_FLOOR: u64 = 546;

/// Default postage carried by the inscribed output, in sats.
pub const DEFAULT_POSTAGE: u64 = 546;

/// Bitcoin network. Selects address prefixes and the `did:btco` prefix only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Signet,
    Regtest,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Signet => "signet",
            Self::Regtest => "regtest",
        }
    }

    pub fn to_bitcoin_network(self) -> bitcoin::Network {
        match self {
            Self::Mainnet => bitcoin::Network::Bitcoin,
            Self::Testnet => bitcoin::Network::Testnet,
            Self::Signet => bitcoin::Network::Signet,
            Self::Regtest => bitcoin::Network::Regtest,
        }
    }

    /// Network component of a `did:btco` identifier, including the
    /// trailing colon. Empty on mainnet.
    pub fn btco_prefix(&self) -> &'static str {
        match self {
            Self::Mainnet => "",
            Self::Testnet => "test:",
            Self::Signet => "sig:",
            Self::Regtest => "reg:",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "signet" => Ok(Self::Signet),
            "regtest" => Ok(Self::Regtest),
            other => Err(format!("unknown network {other:?}")),
        }
    }
}

/// Settings for commit/reveal construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BitcoinConfig {
    pub network: Network,
    /// Default fee rate in sat/vB.
    pub fee_rate: f64,
    pub dust_floor: Amount,
    /// Value of the inscribed reveal output. Raised to the dust floor when lower.
    pub postage: Amount,
}

impl Default for BitcoinConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            fee_rate: DEFAULT_FEE_RATE,
            dust_floor: Amount::from_sat(DEFAULT_DUST_FLOOR),
            postage: Amount::from_sat(DEFAULT_POSTAGE),
        }
    }
}

impl BitcoinConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Load from environment variables.
    ///
    /// - `ORIGINALS_NETWORK` (default: `mainnet`)
    /// - `ORIGINALS_FEE_RATE` (default: 10, must be > 0)
    /// - `ORIGINALS_DUST_FLOOR` (default: 546)
    /// - `ORIGINALS_POSTAGE` (default: 546)
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        let network: Network = env_parse("ORIGINALS_NETWORK", Network::default())?;
        let fee_rate: f64 = env_parse("ORIGINALS_FEE_RATE", DEFAULT_FEE_RATE)?;
        if FeeRate::new(fee_rate).is_err() {
            return Err(ConfigError::invalid(
                "ORIGINALS_FEE_RATE",
                &fee_rate.to_string(),
                "must be a finite rate > 0",
            ));
        }
        let dust_floor: u64 = env_parse("ORIGINALS_DUST_FLOOR", DEFAULT_DUST_FLOOR)?;
        let postage: u64 = env_parse("ORIGINALS_POSTAGE", DEFAULT_POSTAGE)?;
        Ok(Self {
            network,
            fee_rate,
            dust_floor: Amount::from_sat(dust_floor),
            postage: Amount::from_sat(postage),
        })
    }

    pub fn with_fee_rate(mut self, fee_rate: f64) -> Result<Self> {
        FeeRate::new(fee_rate)?;
        self.fee_rate = fee_rate;
        Ok(self)
    }

    pub fn with_dust_floor(mut self, dust_floor: Amount) -> Self {
        self.dust_floor = dust_floor;
        self
    }

    pub fn with_postage(mut self, postage: Amount) -> Self {
        self.postage = postage;
        self
    }

    /// Postage actually used: the configured value, never below dust.
    pub fn effective_postage(&self) -> Amount {
        self.postage.max(self.dust_floor)
    }

    /// Parse an address string and check it belongs to the configured network.
    pub fn parse_address(&self, address: &str) -> Result<bitcoin::Address> {
        let unchecked = bitcoin::Address::from_str(address)?;
        unchecked
            .require_network(self.network.to_bitcoin_network())
            .map_err(|e| BitcoinError::InvalidAddress(format!("{address}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_names_round_trip() {
        for net in [Network::Mainnet, Network::Testnet, Network::Signet, Network::Regtest] {
            assert_eq!(net.name().parse::<Network>().unwrap(), net);
        }
        assert!("litecoin".parse::<Network>().is_err());
        assert_eq!(Network::Regtest.btco_prefix(), "reg:");
        assert_eq!(Network::Mainnet.btco_prefix(), "");
    }

    #[test]
    fn postage_never_below_dust() {
        let cfg = BitcoinConfig::default().with_postage(Amount::from_sat(100));
        assert_eq!(cfg.effective_postage(), Amount::from_sat(546));
        let cfg = cfg.with_postage(Amount::from_sat(10_000));
        assert_eq!(cfg.effective_postage(), Amount::from_sat(10_000));
    }

    #[test]
    fn rejects_bad_fee_rate() {
        assert!(BitcoinConfig::default().with_fee_rate(0.0).is_err());
        assert!(BitcoinConfig::default().with_fee_rate(f64::NAN).is_err());
        assert!(BitcoinConfig::default().with_fee_rate(2.5).is_ok());
    }

    #[test]
    fn address_network_is_checked() {
        let secp = bitcoin::secp256k1::Secp256k1::new();
        let keypair = bitcoin::secp256k1::Keypair::new(&secp, &mut bitcoin::secp256k1::rand::thread_rng());
        let (xonly, _) = keypair.x_only_public_key();
        let regtest = bitcoin::Address::p2tr(&secp, xonly, None, bitcoin::Network::Regtest);

        let cfg = BitcoinConfig::new(Network::Regtest);
        assert_eq!(cfg.parse_address(&regtest.to_string()).unwrap(), regtest);
        assert!(cfg
            .parse_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4")
            .is_err());
        assert!(cfg.parse_address("not-an-address").is_err());
    }

    // Single test for all environment cases so parallel tests never race.
    #[test]
    fn from_env_overrides_and_validation() {
        std::env::set_var("ORIGINALS_NETWORK", "signet");
        std::env::set_var("ORIGINALS_FEE_RATE", "3.5");
        std::env::set_var("ORIGINALS_DUST_FLOOR", "330");
        let cfg = BitcoinConfig::from_env().unwrap();
        assert_eq!(cfg.network, Network::Signet);
        assert_eq!(cfg.fee_rate, 3.5);
        assert_eq!(cfg.dust_floor, Amount::from_sat(330));

        std::env::set_var("ORIGINALS_FEE_RATE", "-1");
        assert!(BitcoinConfig::from_env().is_err());
        std::env::set_var("ORIGINALS_FEE_RATE", "3.5");
        std::env::set_var("ORIGINALS_NETWORK", "moon");
        assert!(BitcoinConfig::from_env().is_err());

        for var in [
            "ORIGINALS_NETWORK",
            "ORIGINALS_FEE_RATE",
            "ORIGINALS_DUST_FLOOR",
        ] {
            std::env::remove_var(var);
        }
        assert_eq!(BitcoinConfig::from_env().unwrap(), BitcoinConfig::default());
    }
}
