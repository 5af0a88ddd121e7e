//! # Inscription Script Builder
//!
//! Builds the ordinal inscription envelope and the single-leaf Taproot tree
//! committing to it.
//!
//! ```text
//! <reveal x-only key> OP_CHECKSIG
//! OP_FALSE OP_IF
//!   "ord"
//!   01 <content-type>
//!   [02 <pointer, little-endian, trailing zeros trimmed>]
//!   [05 <metadata chunk>]*
//!   OP_0 <body chunk>*
//! OP_ENDIF
//! ```
//!
//! Data longer than the 520-byte push limit is split into consecutive
//! pushes. The internal key of the Taproot output is the same one-time key
//! that signs the reveal, so the commit address can be recomputed from the
//! reveal public key and the leaf script alone ([`verify_commitment`]).

use bitcoin::blockdata::opcodes;
use bitcoin::blockdata::script::{Builder, PushBytes, Script, ScriptBuf};
use bitcoin::secp256k1::{Keypair, Secp256k1, XOnlyPublicKey};
use bitcoin::taproot::{ControlBlock, LeafVersion, TapLeafHash, TapNodeHash, TaprootBuilder};
use bitcoin::Address;

use crate::config::Network;
use crate::error::{BitcoinError, Result};

/// Maximum bytes in a single script push.
pub const MAX_PUSH_SIZE: usize = 520;

/// Envelope protocol marker.
pub const PROTOCOL_ID: &[u8; 3] = b"ord";

const CONTENT_TYPE_TAG: [u8; 1] = [1];
const POINTER_TAG: [u8; 1] = [2];
const METADATA_TAG: [u8; 1] = [5];

/// Payload plus its envelope fields. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InscriptionEnvelope {
    content_type: String,
    body: Vec<u8>,
    metadata: Option<Vec<u8>>,
    pointer: Option<u64>,
}

impl InscriptionEnvelope {
    pub fn new(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Result<Self> {
        let content_type = content_type.into();
        if content_type.trim().is_empty() {
            return Err(BitcoinError::InvalidEnvelope("content type is empty".into()));
        }
        if content_type.len() > MAX_PUSH_SIZE {
            return Err(BitcoinError::InvalidEnvelope(format!(
                "content type is {} bytes, limit {MAX_PUSH_SIZE}",
                content_type.len()
            )));
        }
        Ok(Self {
            content_type,
            body: body.into(),
            metadata: None,
            pointer: None,
        })
    }

    /// Attach opaque metadata bytes, emitted as repeated tag-5 pushes.
    pub fn with_metadata(mut self, metadata: impl Into<Vec<u8>>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Attach a satoshi pointer (tag 2).
    pub fn with_pointer(mut self, pointer: u64) -> Self {
        self.pointer = Some(pointer);
        self
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn metadata(&self) -> Option<&[u8]> {
        self.metadata.as_deref()
    }

    pub fn pointer(&self) -> Option<u64> {
        self.pointer
    }

    /// The leaf script for `reveal_key`.
    pub fn reveal_script(&self, reveal_key: &XOnlyPublicKey) -> Result<ScriptBuf> {
        let mut builder = Builder::new()
            .push_x_only_key(reveal_key)
            .push_opcode(opcodes::all::OP_CHECKSIG)
            .push_opcode(opcodes::OP_FALSE)
            .push_opcode(opcodes::all::OP_IF)
            .push_slice(PROTOCOL_ID)
            .push_slice(CONTENT_TYPE_TAG);
        builder = push_data(builder, self.content_type.as_bytes())?;

        if let Some(pointer) = self.pointer {
            builder = builder.push_slice(POINTER_TAG);
            builder = push_data(builder, &encode_pointer(pointer))?;
        }
        if let Some(metadata) = &self.metadata {
            for chunk in metadata.chunks(MAX_PUSH_SIZE) {
                builder = builder.push_slice(METADATA_TAG);
                builder = push_data(builder, chunk)?;
            }
        }

        builder = builder.push_opcode(opcodes::all::OP_PUSHBYTES_0);
        for chunk in self.body.chunks(MAX_PUSH_SIZE) {
            builder = push_data(builder, chunk)?;
        }
        Ok(builder.push_opcode(opcodes::all::OP_ENDIF).into_script())
    }
}

fn push_data(builder: Builder, data: &[u8]) -> Result<Builder> {
    let push: &PushBytes = data
        .try_into()
        .map_err(|_| BitcoinError::InvalidEnvelope(format!("push of {} bytes", data.len())))?;
    Ok(builder.push_slice(push))
}

fn encode_pointer(pointer: u64) -> Vec<u8> {
    let mut bytes = pointer.to_le_bytes().to_vec();
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    bytes
}

/// A funded-to-be Taproot output committing to an envelope.
///
/// Holds the one-time reveal key pair; `Debug` never prints it.
#[derive(Clone)]
pub struct InscriptionCommitment {
    keypair: Keypair,
    reveal_script: ScriptBuf,
    control_block: ControlBlock,
    address: Address,
}

impl InscriptionCommitment {
    /// Commit to `envelope` under a freshly generated reveal key.
    pub fn new(envelope: &InscriptionEnvelope, network: Network) -> Result<Self> {
        let secp = Secp256k1::new();
        let keypair = Keypair::new(&secp, &mut bitcoin::secp256k1::rand::thread_rng());
        Self::with_keypair(envelope, keypair, network)
    }

    /// Commit to `envelope` under a caller-chosen reveal key.
    pub fn with_keypair(
        envelope: &InscriptionEnvelope,
        keypair: Keypair,
        network: Network,
    ) -> Result<Self> {
        let secp = Secp256k1::new();
        let (internal_key, _) = keypair.x_only_public_key();
        let reveal_script = envelope.reveal_script(&internal_key)?;

        let spend_info = TaprootBuilder::new()
            .add_leaf(0, reveal_script.clone())
            .map_err(|e| BitcoinError::Taproot(e.to_string()))?
            .finalize(&secp, internal_key)
            .map_err(|_| BitcoinError::Taproot("script tree is incomplete".into()))?;
        let control_block = spend_info
            .control_block(&(reveal_script.clone(), LeafVersion::TapScript))
            .ok_or_else(|| BitcoinError::Taproot("reveal leaf missing from tree".into()))?;
        let address = Address::p2tr_tweaked(spend_info.output_key(), network.to_bitcoin_network());

        Ok(Self {
            keypair,
            reveal_script,
            control_block,
            address,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn script_pubkey(&self) -> ScriptBuf {
        self.address.script_pubkey()
    }

    pub fn reveal_public_key(&self) -> XOnlyPublicKey {
        self.keypair.x_only_public_key().0
    }

    pub fn reveal_script(&self) -> &Script {
        &self.reveal_script
    }

    pub fn control_block(&self) -> &ControlBlock {
        &self.control_block
    }

    pub fn leaf_hash(&self) -> TapLeafHash {
        TapLeafHash::from_script(&self.reveal_script, LeafVersion::TapScript)
    }

    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for InscriptionCommitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InscriptionCommitment")
            .field("keypair", &"<one-time>")
            .field("reveal_public_key", &self.reveal_public_key())
            .field("address", &self.address)
            .finish()
    }
}

/// Recompute the commit output from the reveal key and leaf script and
/// check it matches `commit_script_pubkey` and the control block.
pub fn verify_commitment(
    commit_script_pubkey: &Script,
    reveal_key: &XOnlyPublicKey,
    reveal_script: &Script,
    control_block: &ControlBlock,
) -> bool {
    if control_block.internal_key != *reveal_key
        || control_block.leaf_version != LeafVersion::TapScript
        || !control_block.merkle_branch.is_empty()
    {
        return false;
    }
    let secp = Secp256k1::verification_only();
    let merkle_root = TapNodeHash::from(TapLeafHash::from_script(reveal_script, LeafVersion::TapScript));
    let expected = ScriptBuf::new_p2tr(&secp, *reveal_key, Some(merkle_root));
    if expected.as_script() != commit_script_pubkey {
        return false;
    }
    // Witness program is the 32-byte tweaked output key.
    match XOnlyPublicKey::from_slice(&expected.as_bytes()[2..]) {
        Ok(output_key) => control_block.verify_taproot_commitment(&secp, output_key, reveal_script),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::blockdata::script::Instruction;

    fn keypair(byte: u8) -> Keypair {
        let secp = Secp256k1::new();
        Keypair::from_seckey_slice(&secp, &[byte; 32]).unwrap()
    }

    fn pushes(script: &Script) -> Vec<Vec<u8>> {
        script
            .instructions()
            .filter_map(|i| match i.unwrap() {
                Instruction::PushBytes(p) => Some(p.as_bytes().to_vec()),
                Instruction::Op(_) => None,
            })
            .collect()
    }

    #[test]
    fn envelope_layout() {
        let env = InscriptionEnvelope::new("text/plain", b"hello".to_vec())
            .unwrap()
            .with_pointer(256);
        let key = keypair(1).x_only_public_key().0;
        let script = env.reveal_script(&key).unwrap();
        let bytes = script.as_bytes();

        assert_eq!(bytes[0], 0x20);
        assert_eq!(&bytes[1..33], &key.serialize());
        assert_eq!(bytes[33], opcodes::all::OP_CHECKSIG.to_u8());
        assert_eq!(bytes[34], 0x00);
        assert_eq!(bytes[35], opcodes::all::OP_IF.to_u8());
        assert_eq!(*bytes.last().unwrap(), opcodes::all::OP_ENDIF.to_u8());

        // OP_FALSE and the OP_0 body separator surface as empty pushes.
        let data = pushes(&script);
        assert!(data[1].is_empty());
        assert_eq!(data[2], b"ord");
        assert_eq!(data[3], vec![1]);
        assert_eq!(data[4], b"text/plain");
        assert_eq!(data[5], vec![2]);
        // 256 little-endian with trailing zeros trimmed.
        assert_eq!(data[6], vec![0, 1]);
        assert!(data[7].is_empty());
        assert_eq!(data[8], b"hello");
        assert_eq!(data.len(), 9);
    }

    #[test]
    fn large_body_and_metadata_are_chunked() {
        let body = vec![0xabu8; 1300];
        let env = InscriptionEnvelope::new("application/octet-stream", body.clone())
            .unwrap()
            .with_metadata(vec![7u8; 600]);
        let script = env.reveal_script(&keypair(2).x_only_public_key().0).unwrap();
        let data = pushes(&script);

        let metadata_tags = data.iter().filter(|d| d.as_slice() == [5]).count();
        assert_eq!(metadata_tags, 2);
        let body_chunks: Vec<_> = data.iter().rev().take(3).collect();
        assert_eq!(body_chunks[0].len(), 260);
        assert_eq!(body_chunks[1].len(), MAX_PUSH_SIZE);
        assert_eq!(body_chunks[2].len(), MAX_PUSH_SIZE);
        assert!(data.iter().all(|d| d.len() <= MAX_PUSH_SIZE));
    }

    #[test]
    fn rejects_empty_content_type() {
        assert!(matches!(
            InscriptionEnvelope::new(" ", b"x".to_vec()),
            Err(BitcoinError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn commitment_verifies_and_is_deterministic_for_a_key() {
        let env = InscriptionEnvelope::new("text/plain", b"originals".to_vec()).unwrap();
        let a = InscriptionCommitment::with_keypair(&env, keypair(3), Network::Regtest).unwrap();
        let b = InscriptionCommitment::with_keypair(&env, keypair(3), Network::Regtest).unwrap();
        assert_eq!(a.address(), b.address());
        assert!(a.address().to_string().starts_with("bcrt1p"));
        assert!(verify_commitment(
            &a.script_pubkey(),
            &a.reveal_public_key(),
            a.reveal_script(),
            a.control_block()
        ));
    }

    #[test]
    fn fresh_keys_give_fresh_addresses() {
        let env = InscriptionEnvelope::new("text/plain", b"originals".to_vec()).unwrap();
        let a = InscriptionCommitment::new(&env, Network::Mainnet).unwrap();
        let b = InscriptionCommitment::new(&env, Network::Mainnet).unwrap();
        assert_ne!(a.address(), b.address());
        assert!(a.address().to_string().starts_with("bc1p"));
    }

    #[test]
    fn verification_rejects_foreign_parts() {
        let env = InscriptionEnvelope::new("text/plain", b"one".to_vec()).unwrap();
        let other = InscriptionEnvelope::new("text/plain", b"two".to_vec()).unwrap();
        let a = InscriptionCommitment::with_keypair(&env, keypair(4), Network::Signet).unwrap();
        let b = InscriptionCommitment::with_keypair(&other, keypair(4), Network::Signet).unwrap();
        let c = InscriptionCommitment::with_keypair(&env, keypair(5), Network::Signet).unwrap();

        assert!(!verify_commitment(&a.script_pubkey(), &a.reveal_public_key(), b.reveal_script(), a.control_block()));
        assert!(!verify_commitment(&a.script_pubkey(), &c.reveal_public_key(), a.reveal_script(), c.control_block()));
        assert!(!verify_commitment(&b.script_pubkey(), &a.reveal_public_key(), a.reveal_script(), a.control_block()));
    }

    #[test]
    fn debug_hides_keypair() {
        let env = InscriptionEnvelope::new("text/plain", b"x".to_vec()).unwrap();
        let c = InscriptionCommitment::with_keypair(&env, keypair(6), Network::Mainnet).unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<one-time>"));
        assert!(!dbg.contains(&hex::encode([6u8; 32])));
    }
}
