//! # Web-to-Bitcoin Migration
//!
//! Drives an asset from a freshly created `did:webvh` log through the
//! resolution cache and into a Bitcoin inscription, with an in-memory chain
//! standing in for the node. Ends with the provenance record that links the
//! web identifier to the inscribed satoshi.

use originals_bitcoin::bitcoin::consensus;
use originals_bitcoin::bitcoin::hashes::Hash;
use originals_bitcoin::bitcoin::secp256k1::{Keypair, Secp256k1};
use originals_bitcoin::bitcoin::{Address, Amount, KnownHrp, Txid};
use originals_bitcoin::{
    verify_commitment, BitcoinConfig, BitcoinError, BtcoDid, InMemoryChainData,
    InscriptionEnvelope, InscriptionSession, Network, SessionState, Utxo,
};
use originals_cache::{CacheConfig, ResolutionCache};
use originals_core::{digest_value, sha256_digest};
use originals_crypto::LocalKeyProvider;
use originals_webvh::{
    create, validate, CreateOptions, CryptosuiteRegistry, DocumentPointer, KeyProviderSigner,
    VerificationMethodRegistry,
};

fn regtest_address(seed: u8) -> Address {
    let secp = Secp256k1::new();
    let keypair = Keypair::from_seckey_slice(&secp, &[seed; 32]).unwrap();
    Address::p2tr(&secp, keypair.x_only_public_key().0, None, KnownHrp::Regtest)
}

#[test]
fn web_identifier_migrates_to_inscription() {
    // ── Web layer ───────────────────────────────────────────────────
    let signer = KeyProviderSigner::new(LocalKeyProvider::from_seed(&[21; 32]));
    let created = create("example.com", &["alice", "asset-1"], &signer, CreateOptions::default())
        .unwrap();
    let validated = validate(
        &created.log,
        &VerificationMethodRegistry::new(),
        &CryptosuiteRegistry::default(),
    )
    .unwrap();
    assert_eq!(validated.entry_count, 1);

    // ── Resolution cache ────────────────────────────────────────────
    let cache = ResolutionCache::new(CacheConfig::default());
    let did = validated.did.to_string();
    cache.set(&did, validated.document.clone()).unwrap();
    assert_eq!(cache.get(&did), Some(validated.document.clone()));

    // ── Inscription payload ─────────────────────────────────────────
    let pointer = DocumentPointer::from_validated(&validated).unwrap();
    assert_eq!(
        pointer.document_digest,
        digest_value(&validated.document).unwrap().to_string()
    );
    let body = pointer.to_canonical_bytes().unwrap().into_bytes();
    let envelope = InscriptionEnvelope::new(DocumentPointer::CONTENT_TYPE, body.clone()).unwrap();

    // ── Commit ──────────────────────────────────────────────────────
    let chain = InMemoryChainData::new();
    let funding = regtest_address(1);
    chain.add_utxo(
        &funding,
        Utxo::new(
            Txid::from_byte_array([0x42; 32]),
            0,
            Amount::from_sat(50_000),
            funding.script_pubkey(),
        ),
    );

    let mut session = InscriptionSession::new(envelope, BitcoinConfig::new(Network::Regtest));
    let change = regtest_address(2).script_pubkey();
    let commit = session
        .build_commit_from_chain(&chain, &funding, change, 4.0)
        .unwrap()
        .clone();
    assert_eq!(session.state(), SessionState::CommitBuilt);
    assert_eq!(commit.transaction.input.len(), 1);

    let commit_txid = chain.insert_transaction(&commit.transaction);
    session.mark_commit_broadcast(commit_txid).unwrap();
    assert_eq!(session.refresh(&chain).unwrap(), None);
    chain.confirm(commit_txid, 1, 800_000);
    assert_eq!(session.refresh(&chain).unwrap(), Some(SessionState::CommitConfirmed));

    // ── Reveal ──────────────────────────────────────────────────────
    let recipient = regtest_address(3).script_pubkey();
    let reveal = session
        .build_reveal_from_chain(&chain, recipient.clone(), 4.0)
        .unwrap()
        .clone();
    assert_eq!(reveal.commit_outpoint.txid, commit_txid);
    assert_eq!(reveal.transaction.output[0].script_pubkey, recipient);
    assert_eq!(reveal.transaction.output[0].value, Amount::from_sat(546));

    // The revealed leaf proves membership in the funded output.
    let witness = &reveal.transaction.input[0].witness;
    assert_eq!(witness.len(), 3);
    let commitment = session.commitment().unwrap();
    assert!(verify_commitment(
        &commit.transaction.output[0].script_pubkey,
        &commitment.reveal_public_key(),
        commitment.reveal_script(),
        commitment.control_block(),
    ));

    let reveal_txid = chain.insert_transaction(&reveal.transaction);
    session.mark_reveal_broadcast(reveal_txid).unwrap();
    chain.confirm(reveal_txid, 1, 800_001);
    assert_eq!(session.refresh(&chain).unwrap(), Some(SessionState::Finalized));
    assert!(session.state().is_terminal());

    // ── Provenance ──────────────────────────────────────────────────
    let record = session.provenance(&did, 1_234_567).unwrap();
    assert_eq!(record.source_did, did);
    assert_eq!(record.target_did, BtcoDid::new(Network::Regtest, 1_234_567));
    assert_eq!(record.target_did.to_string(), "did:btco:reg:1234567");
    assert_eq!(record.inscription_id, format!("{reveal_txid}i0"));
    assert_eq!(record.commit_txid, commit_txid.to_string());
    assert_eq!(
        record.payload_digest,
        sha256_digest(&pointer.to_canonical_bytes().unwrap()).to_string()
    );

    let states: Vec<&str> = session
        .transition_log()
        .iter()
        .map(|t| t.to_state.as_str())
        .collect();
    assert_eq!(
        states,
        [
            "COMMIT_BUILT",
            "COMMIT_BROADCAST",
            "COMMIT_CONFIRMED",
            "REVEAL_BUILT",
            "REVEAL_BROADCAST",
            "FINALIZED"
        ]
    );

    // The serialized reveal carries the payload bytes in its witness.
    let raw = consensus::serialize(&reveal.transaction);
    assert!(raw.windows(body.len()).any(|w| w == body.as_slice()));
}

#[test]
fn reveal_against_a_different_commit_is_rejected() {
    let envelope = InscriptionEnvelope::new("text/plain", b"first".to_vec()).unwrap();
    let mut a = InscriptionSession::new(envelope.clone(), BitcoinConfig::new(Network::Regtest));
    let mut b = InscriptionSession::new(envelope, BitcoinConfig::new(Network::Regtest));
    let utxo = |byte| {
        vec![Utxo::new(
            Txid::from_byte_array([byte; 32]),
            0,
            Amount::from_sat(30_000),
            regtest_address(5).script_pubkey(),
        )]
    };
    a.build_commit(&utxo(1), regtest_address(6).script_pubkey(), 2.0).unwrap();
    let b_commit = b
        .build_commit(&utxo(2), regtest_address(6).script_pubkey(), 2.0)
        .unwrap()
        .transaction
        .clone();

    let a_txid = a.commit().unwrap().txid();
    a.mark_commit_broadcast(a_txid).unwrap();
    a.mark_commit_confirmed().unwrap();

    // Session b's commit pays a different one-time key.
    let err = a
        .build_reveal(
            &consensus::serialize(&b_commit),
            regtest_address(7).script_pubkey(),
            2.0,
        )
        .unwrap_err();
    assert!(matches!(err, BitcoinError::CommitOutputNotFound { .. }));
    assert_eq!(a.state(), SessionState::CommitConfirmed);
}

#[test]
fn cache_detects_rotated_document() {
    let signer = KeyProviderSigner::new(LocalKeyProvider::from_seed(&[22; 32]));
    let mut created = create("example.com", &["bob"], &signer, CreateOptions::default()).unwrap();
    let methods = VerificationMethodRegistry::new();
    let suites = CryptosuiteRegistry::default();
    let first = validate(&created.log, &methods, &suites).unwrap();

    let cache = ResolutionCache::new(CacheConfig::default());
    let did = first.did.to_string();
    cache.set(&did, first.document.clone()).unwrap();
    assert!(!cache.validate(&did, first.document.clone()).unwrap());

    let mut doc = first.document.clone();
    doc["service"] = serde_json::json!([{
        "id": "#files",
        "type": "LinkedResource",
        "serviceEndpoint": "https://example.com/bob/files"
    }]);
    originals_webvh::update(
        &mut created.log,
        originals_webvh::LogUpdate {
            state: Some(doc),
            ..Default::default()
        },
        &signer,
    )
    .unwrap();
    let second = validate(&created.log, &methods, &suites).unwrap();

    assert!(cache.validate(&did, second.document.clone()).unwrap());
    assert_eq!(cache.get(&did), Some(second.document.clone()));
    assert_ne!(
        DocumentPointer::from_validated(&first).unwrap(),
        DocumentPointer::from_validated(&second).unwrap()
    );
}
