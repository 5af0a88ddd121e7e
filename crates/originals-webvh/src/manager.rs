//! # Version-Log Manager
//!
//! Creates, extends and validates `did:webvh` version logs.
//!
//! ## SCID Derivation
//!
//! The genesis entry is first built with the literal `{SCID}` in every
//! position the SCID will occupy (`versionId`, `parameters.scid`, the
//! document `id` and verification-method ids). The SCID is the base58btc
//! SHA2-256 multihash of that entry's JCS form. The placeholder is then
//! substituted, the entry hash is computed with the SCID as predecessor,
//! and the entry is signed.
//!
//! ## Validation
//!
//! [`validate`] walks the chain from entry 1. For each entry it checks the
//! sequence number, the SCID (genesis), the parameter fold, time ordering,
//! the entry hash against its predecessor, the document id, and every
//! proof. Entry N is authorized by the `updateKeys` active after entry
//! N−1; the genesis entry by its own. A key rotated out later still
//! validates the entries it signed.

use originals_core::{validate_domain, validate_path_segments, CanonicalBytes, Timestamp};
use originals_crypto::{sha256_multihash_b58, VerifyingKey};
use serde_json::{json, Value};

use crate::did::{WebvhDid, SCID_PLACEHOLDER};
use crate::entry::{ActiveParameters, LogEntry, Parameters, METHOD_VERSION};
use crate::error::WebvhError;
use crate::log::DidLog;
use crate::proof::{CryptosuiteRegistry, ProofOptions, ASSERTION_METHOD};
use crate::registry::VerificationMethodRegistry;
use crate::signer::Signer;

const DID_CONTEXTS: [&str; 2] = [
    "https://www.w3.org/ns/did/v1",
    "https://w3id.org/security/multikey/v1",
];

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// Options for [`create`].
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Allow the identifier to move to another domain or path later.
    pub portable: bool,
    /// Document verification methods. Defaults to the signer's update key.
    pub verification_methods: Vec<VerifyingKey>,
    /// `service` entries for the document.
    pub services: Vec<Value>,
    /// Genesis `versionTime`. Defaults to now.
    pub version_time: Option<Timestamp>,
    /// Resolver cache hint in seconds.
    pub ttl: Option<u64>,
}

/// A newly created log.
#[derive(Debug, Clone)]
pub struct CreatedLog {
    pub did: WebvhDid,
    pub scid: String,
    pub log: DidLog,
}

impl CreatedLog {
    /// The signed genesis entry.
    pub fn genesis(&self) -> Option<&LogEntry> {
        self.log.first()
    }
}

/// Changes applied by [`update`]. `Default` appends an entry that only
/// re-signs the current state.
#[derive(Debug, Clone, Default)]
pub struct LogUpdate {
    /// Replacement DID document.
    pub state: Option<Value>,
    /// Key rotation: the new `updateKeys` (multikeys).
    pub update_keys: Option<Vec<String>>,
    /// Set to `false` to give up portability.
    pub portable: Option<bool>,
    /// Deactivate the identifier. Clears `updateKeys`.
    pub deactivate: bool,
    /// New resolver cache hint.
    pub ttl: Option<u64>,
    /// Entry `versionTime`. Defaults to now.
    pub version_time: Option<Timestamp>,
}

/// Summary of a log that passed [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLog {
    pub did: WebvhDid,
    pub scid: String,
    pub version_id: String,
    pub version_time: Timestamp,
    pub document: Value,
    pub parameters: ActiveParameters,
    pub entry_count: usize,
}

// ---------------------------------------------------------------------------
// create
// ---------------------------------------------------------------------------

/// Create the genesis entry for `did:webvh:<scid>:<domain>[:<path>...]`.
///
/// Path segments and the domain are validated before any key or hash
/// operation.
pub fn create<S: AsRef<str>>(
    domain: &str,
    path: &[S],
    signer: &dyn Signer,
    options: CreateOptions,
) -> Result<CreatedLog, WebvhError> {
    validate_path_segments(path)?;
    validate_domain(domain)?;
    let path: Vec<String> = path.iter().map(|s| s.as_ref().to_string()).collect();
    let placeholder_did = WebvhDid::new(SCID_PLACEHOLDER, domain, path)?;

    let update_key = signer.update_key()?;
    VerifyingKey::from_multikey(&update_key)?;
    let doc_keys: Vec<String> = if options.verification_methods.is_empty() {
        vec![update_key.clone()]
    } else {
        options
            .verification_methods
            .iter()
            .map(VerifyingKey::to_multikey)
            .collect()
    };

    let version_time = options.version_time.unwrap_or_else(Timestamp::now);
    let preliminary = LogEntry {
        version_id: SCID_PLACEHOLDER.to_string(),
        version_time,
        parameters: Parameters {
            method: Some(METHOD_VERSION.to_string()),
            scid: Some(SCID_PLACEHOLDER.to_string()),
            update_keys: Some(vec![update_key]),
            portable: options.portable.then_some(true),
            deactivated: None,
            ttl: options.ttl,
        },
        state: build_document(&placeholder_did.to_string(), &doc_keys, &options.services),
        proof: Vec::new(),
    };

    let scid = sha256_multihash_b58(&CanonicalBytes::from_value(preliminary.unsigned_value()?)?);
    let substituted = serde_json::to_string(&preliminary)?.replace(SCID_PLACEHOLDER, &scid);
    let mut genesis: LogEntry = serde_json::from_str(&substituted)?;
    genesis.version_id = format!("1-{}", genesis.entry_hash(&scid)?);
    sign_entry(&mut genesis, signer, version_time)?;

    let did = placeholder_did.with_scid(&scid);
    tracing::info!(did = %did, version_id = %genesis.version_id, "created did:webvh log");
    Ok(CreatedLog {
        did,
        scid,
        log: DidLog::from_entries(vec![genesis]),
    })
}

fn build_document(did: &str, keys: &[String], services: &[Value]) -> Value {
    let methods: Vec<Value> = keys
        .iter()
        .enumerate()
        .map(|(i, mk)| {
            json!({
                "id": format!("{did}#key-{}", i + 1),
                "type": "Multikey",
                "controller": did,
                "publicKeyMultibase": mk,
            })
        })
        .collect();
    let ids: Vec<Value> = methods.iter().map(|m| m["id"].clone()).collect();
    let mut doc = json!({
        "@context": DID_CONTEXTS,
        "id": did,
        "verificationMethod": methods,
        "authentication": ids,
        "assertionMethod": ids,
    });
    if !services.is_empty() {
        doc["service"] = Value::Array(services.to_vec());
    }
    doc
}

fn sign_entry(
    entry: &mut LogEntry,
    signer: &dyn Signer,
    created: Timestamp,
) -> Result<(), WebvhError> {
    let options = ProofOptions::new(signer.verification_method()?, created);
    let data = options.signing_input(&entry.unsigned_value()?)?;
    let proof = signer.sign(options, &data)?;
    entry.proof.push(proof);
    Ok(())
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

/// Append a signed entry to `log`.
///
/// The signer must hold one of the currently active `updateKeys`. This does
/// not re-verify earlier proofs; run [`validate`] on untrusted input first.
pub fn update<'a>(
    log: &'a mut DidLog,
    changes: LogUpdate,
    signer: &dyn Signer,
) -> Result<&'a LogEntry, WebvhError> {
    let last = log.last().ok_or(WebvhError::EmptyLog)?;
    let active = log.active_parameters()?;
    let current_did = document_did(last)?;
    if active.deactivated {
        return Err(WebvhError::Deactivated {
            did: current_did.to_string(),
        });
    }

    let next_seq = log.len() as u64 + 1;
    let pending_id = next_seq.to_string();
    let key = signer.update_key()?;
    if !active.authorizes(&key) {
        return Err(WebvhError::UnauthorizedKey {
            key,
            version_id: pending_id,
        });
    }

    let version_time = changes.version_time.unwrap_or_else(Timestamp::now);
    if version_time < last.version_time {
        return Err(WebvhError::TimeOrder {
            version_id: pending_id,
            actual: version_time.to_string(),
            previous: last.version_time.to_string(),
        });
    }

    if let Some(keys) = &changes.update_keys {
        for mk in keys {
            VerifyingKey::from_multikey(mk)?;
        }
    }
    let parameters = Parameters {
        update_keys: if changes.deactivate {
            Some(Vec::new())
        } else {
            changes.update_keys
        },
        portable: changes.portable,
        deactivated: changes.deactivate.then_some(true),
        ttl: changes.ttl,
        ..Parameters::default()
    };
    active.apply(&parameters, &pending_id)?;

    let genesis_did = log.first().map(document_did).transpose()?;
    let mut entry = LogEntry {
        version_id: String::new(),
        version_time,
        parameters,
        state: changes.state.unwrap_or_else(|| last.state.clone()),
        proof: Vec::new(),
    };
    check_document_id(&entry, &active, genesis_did.as_ref(), &pending_id)?;

    entry.version_id = format!("{next_seq}-{}", entry.entry_hash(&last.version_id)?);
    sign_entry(&mut entry, signer, version_time)?;
    tracing::info!(
        did = %current_did,
        version_id = %entry.version_id,
        deactivated = changes.deactivate,
        "appended did:webvh log entry"
    );
    log.push(entry);
    log.last().ok_or(WebvhError::EmptyLog)
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Validate a candidate log end to end.
pub fn validate(
    log: &DidLog,
    methods: &VerificationMethodRegistry,
    suites: &CryptosuiteRegistry,
) -> Result<ValidatedLog, WebvhError> {
    walk_chain(log, methods, suites).map_err(|e| {
        tracing::warn!(error = %e, entries = log.len(), "rejected did:webvh log");
        e
    })
}

/// Boolean form of [`validate`].
pub fn is_valid(
    log: &DidLog,
    methods: &VerificationMethodRegistry,
    suites: &CryptosuiteRegistry,
) -> bool {
    validate(log, methods, suites).is_ok()
}

fn walk_chain(
    log: &DidLog,
    methods: &VerificationMethodRegistry,
    suites: &CryptosuiteRegistry,
) -> Result<ValidatedLog, WebvhError> {
    let genesis = log.first().ok_or(WebvhError::EmptyLog)?;
    let genesis_params = ActiveParameters::genesis(&genesis.parameters, &genesis.version_id)?;
    let computed = genesis_scid(genesis, &genesis_params.scid)?;
    if computed != genesis_params.scid {
        return Err(WebvhError::ScidMismatch {
            declared: genesis_params.scid,
            computed,
        });
    }
    let scid = genesis_params.scid.clone();
    let genesis_did = document_did(genesis)?;

    let mut active = genesis_params.clone();
    let mut predecessor = scid.clone();
    let mut previous: Option<&LogEntry> = None;

    for (i, entry) in log.entries().iter().enumerate() {
        let version = entry.parsed_version_id()?;
        let expected = i as u64 + 1;
        if version.seq != expected {
            return Err(WebvhError::SequenceMismatch {
                expected,
                actual: version.seq,
                version_id: entry.version_id.clone(),
            });
        }

        let authorized = match previous {
            None => genesis_params.clone(),
            Some(prev) => {
                if active.deactivated {
                    return Err(WebvhError::Deactivated {
                        did: genesis_did.to_string(),
                    });
                }
                if entry.version_time < prev.version_time {
                    return Err(WebvhError::TimeOrder {
                        version_id: entry.version_id.clone(),
                        actual: entry.version_time.to_string(),
                        previous: prev.version_time.to_string(),
                    });
                }
                let authorized = active.clone();
                active = active.apply(&entry.parameters, &entry.version_id)?;
                authorized
            }
        };

        let computed = entry.entry_hash(&predecessor)?;
        if computed != version.hash {
            return Err(WebvhError::EntryHashMismatch {
                version_id: entry.version_id.clone(),
                computed,
            });
        }

        check_document_id(entry, &authorized, Some(&genesis_did), &entry.version_id)?;
        verify_proofs(entry, &authorized, methods, suites)?;

        tracing::debug!(version_id = %entry.version_id, "verified log entry");
        predecessor = entry.version_id.clone();
        previous = Some(entry);
    }

    let last = previous.ok_or(WebvhError::EmptyLog)?;
    Ok(ValidatedLog {
        did: document_did(last)?,
        scid,
        version_id: last.version_id.clone(),
        version_time: last.version_time,
        document: last.state.clone(),
        parameters: active,
        entry_count: log.len(),
    })
}

/// Recompute the SCID from a genesis entry that declares `declared`.
fn genesis_scid(genesis: &LogEntry, declared: &str) -> Result<String, WebvhError> {
    if declared.is_empty() {
        return Err(WebvhError::InvalidParameters {
            version_id: genesis.version_id.clone(),
            reason: "empty scid".to_string(),
        });
    }
    let mut value = genesis.unsigned_value()?;
    value["versionId"] = Value::String(declared.to_string());
    let restored = serde_json::to_string(&value)?.replace(declared, SCID_PLACEHOLDER);
    let restored: Value = serde_json::from_str(&restored)?;
    Ok(sha256_multihash_b58(&CanonicalBytes::from_value(restored)?))
}

fn document_did(entry: &LogEntry) -> Result<WebvhDid, WebvhError> {
    let id = entry
        .document_id()
        .ok_or_else(|| WebvhError::DocumentIdMismatch {
            version_id: entry.version_id.clone(),
            reason: "document has no id".to_string(),
        })?;
    Ok(WebvhDid::parse(id)?)
}

fn check_document_id(
    entry: &LogEntry,
    active: &ActiveParameters,
    genesis_did: Option<&WebvhDid>,
    version_id: &str,
) -> Result<(), WebvhError> {
    let mismatch = |reason: String| WebvhError::DocumentIdMismatch {
        version_id: version_id.to_string(),
        reason,
    };
    let id = entry
        .document_id()
        .ok_or_else(|| mismatch("document has no id".to_string()))?;
    let did = WebvhDid::parse(id)?;
    if did.scid() != active.scid {
        return Err(WebvhError::ScidMismatch {
            declared: did.scid().to_string(),
            computed: active.scid.clone(),
        });
    }
    if let Some(genesis) = genesis_did {
        if !active.portable && !did.same_location(genesis) {
            return Err(mismatch(format!("{did} moved from {genesis} without portability")));
        }
    }
    Ok(())
}

fn verify_proofs(
    entry: &LogEntry,
    authorized: &ActiveParameters,
    methods: &VerificationMethodRegistry,
    suites: &CryptosuiteRegistry,
) -> Result<(), WebvhError> {
    if entry.proof.is_empty() {
        return Err(WebvhError::MissingProof {
            version_id: entry.version_id.clone(),
        });
    }
    let unsigned = entry.unsigned_value()?;
    for proof in &entry.proof {
        if proof.proof_purpose != ASSERTION_METHOD {
            return Err(WebvhError::ProofInvalid {
                version_id: entry.version_id.clone(),
                reason: format!("unexpected proofPurpose {:?}", proof.proof_purpose),
            });
        }
        let key = methods.resolve(&proof.verification_method)?;
        let multikey = key.to_multikey();
        if !authorized.authorizes(&multikey) {
            return Err(WebvhError::UnauthorizedKey {
                key: multikey,
                version_id: entry.version_id.clone(),
            });
        }
        let data = proof.options().signing_input(&unsigned)?;
        suites.verify(proof, &data, &key, &entry.version_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::KeyProviderSigner;
    use originals_crypto::LocalKeyProvider;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn signer(seed: u8) -> KeyProviderSigner {
        KeyProviderSigner::new(LocalKeyProvider::from_seed(&[seed; 32]))
    }

    fn options_at(time: &str) -> CreateOptions {
        CreateOptions {
            version_time: Some(ts(time)),
            ..CreateOptions::default()
        }
    }

    fn at(time: &str) -> LogUpdate {
        LogUpdate {
            version_time: Some(ts(time)),
            ..LogUpdate::default()
        }
    }

    fn check(log: &DidLog) -> Result<ValidatedLog, WebvhError> {
        validate(log, &VerificationMethodRegistry::new(), &CryptosuiteRegistry::default())
    }

    #[test]
    fn create_single_entry_log() {
        let created = create("example.com", &["alice"], &signer(1), options_at("2026-01-01T00:00:00Z")).unwrap();
        assert!(created.did.to_string().starts_with("did:webvh:Qm"));
        assert!(created.did.to_string().ends_with(":example.com:alice"));
        assert_eq!(created.did.scid(), created.scid);

        let genesis = created.genesis().unwrap();
        assert!(genesis.version_id.starts_with("1-Qm"));
        assert_eq!(genesis.parameters.scid.as_deref(), Some(created.scid.as_str()));
        assert_eq!(genesis.document_id(), Some(created.did.to_string().as_str()));
        assert_eq!(genesis.proof.len(), 1);
        assert!(!serde_json::to_string(genesis).unwrap().contains(SCID_PLACEHOLDER));

        let validated = check(&created.log).unwrap();
        assert_eq!(validated.did, created.did);
        assert_eq!(validated.entry_count, 1);
        assert!(is_valid(&created.log, &VerificationMethodRegistry::new(), &CryptosuiteRegistry::default()));
    }

    #[test]
    fn scid_is_deterministic_from_genesis_content() {
        let a = create("example.com", &["alice"], &signer(1), options_at("2026-01-01T00:00:00Z")).unwrap();
        let b = create("example.com", &["alice"], &signer(1), options_at("2026-01-01T00:00:00Z")).unwrap();
        assert_eq!(a.scid, b.scid);
        assert_eq!(a.log, b.log);

        let other_time = create("example.com", &["alice"], &signer(1), options_at("2026-01-01T00:00:01Z")).unwrap();
        let other_key = create("example.com", &["alice"], &signer(2), options_at("2026-01-01T00:00:00Z")).unwrap();
        let other_path = create("example.com", &["bob"], &signer(1), options_at("2026-01-01T00:00:00Z")).unwrap();
        assert_ne!(a.scid, other_time.scid);
        assert_ne!(a.scid, other_key.scid);
        assert_ne!(a.scid, other_path.scid);
    }

    #[test]
    fn create_rejects_bad_input_before_signing() {
        struct PanicSigner;
        impl Signer for PanicSigner {
            fn update_key(&self) -> Result<String, WebvhError> {
                panic!("signer must not be consulted")
            }
            fn verification_method(&self) -> Result<String, WebvhError> {
                panic!("signer must not be consulted")
            }
            fn sign(&self, _: ProofOptions, _: &CanonicalBytes) -> Result<crate::proof::DataIntegrityProof, WebvhError> {
                panic!("signer must not be consulted")
            }
        }
        let err = create("example.com", &["..", "etc"], &PanicSigner, CreateOptions::default()).unwrap_err();
        assert!(err.to_string().starts_with("invalid path segment"), "{err}");
        let err = create::<&str>("not a domain", &[], &PanicSigner, CreateOptions::default()).unwrap_err();
        assert!(err.to_string().starts_with("invalid identifier format"), "{err}");
    }

    #[test]
    fn create_with_options() {
        let extra = LocalKeyProvider::from_seed(&[7; 32]);
        let created = create::<&str>(
            "localhost:8000",
            &[],
            &signer(1),
            CreateOptions {
                portable: true,
                verification_methods: vec![
                    originals_crypto::KeyProvider::verifying_key(&extra).unwrap(),
                ],
                services: vec![json!({"id": "#files", "type": "LinkedResource", "serviceEndpoint": "https://localhost:8000/files"})],
                version_time: Some(ts("2026-01-01T00:00:00Z")),
                ttl: Some(3600),
            },
        )
        .unwrap();
        let validated = check(&created.log).unwrap();
        assert!(validated.parameters.portable);
        assert_eq!(validated.parameters.ttl, Some(3600));
        assert_eq!(validated.document["service"][0]["type"], "LinkedResource");
        assert_eq!(validated.document["verificationMethod"].as_array().unwrap().len(), 1);
        assert!(created.did.to_string().contains("localhost%3A8000"));
    }

    #[test]
    fn update_chain_validates() {
        let s = signer(1);
        let mut created = create("example.com", &["alice"], &s, options_at("2026-01-01T00:00:00Z")).unwrap();
        let mut state = created.genesis().unwrap().state.clone();
        state["service"] = json!([{"id": "#web", "type": "LinkedDomains", "serviceEndpoint": "https://example.com"}]);
        let entry = update(
            &mut created.log,
            LogUpdate {
                state: Some(state),
                ..at("2026-01-02T00:00:00Z")
            },
            &s,
        )
        .unwrap();
        assert!(entry.version_id.starts_with("2-"));
        update(&mut created.log, at("2026-01-02T00:00:00Z"), &s).unwrap();

        let validated = check(&created.log).unwrap();
        assert_eq!(validated.entry_count, 3);
        assert!(validated.version_id.starts_with("3-"));
        assert_eq!(validated.document["service"][0]["type"], "LinkedDomains");
    }

    #[test]
    fn rotated_out_key_still_validates_earlier_entries() {
        let old = signer(1);
        let new = signer(2);
        let mut created = create("example.com", &["alice"], &old, options_at("2026-01-01T00:00:00Z")).unwrap();
        update(
            &mut created.log,
            LogUpdate {
                update_keys: Some(vec![new.update_key().unwrap()]),
                ..at("2026-01-02T00:00:00Z")
            },
            &old,
        )
        .unwrap();
        update(&mut created.log, at("2026-01-03T00:00:00Z"), &new).unwrap();
        check(&created.log).unwrap();

        let err = update(&mut created.log, at("2026-01-04T00:00:00Z"), &old).unwrap_err();
        assert!(matches!(err, WebvhError::UnauthorizedKey { .. }));
    }

    #[test]
    fn entry_signed_by_revoked_key_is_rejected() {
        let old = signer(1);
        let new = signer(2);
        let mut created = create("example.com", &["alice"], &old, options_at("2026-01-01T00:00:00Z")).unwrap();
        update(
            &mut created.log,
            LogUpdate {
                update_keys: Some(vec![new.update_key().unwrap()]),
                ..at("2026-01-02T00:00:00Z")
            },
            &old,
        )
        .unwrap();
        // Forge entry 3 with the rotated-out key by bypassing `update`.
        let last = created.log.last().unwrap().clone();
        let mut forged = LogEntry {
            version_id: String::new(),
            version_time: ts("2026-01-03T00:00:00Z"),
            parameters: Parameters::default(),
            state: last.state.clone(),
            proof: vec![],
        };
        forged.version_id = format!("3-{}", forged.entry_hash(&last.version_id).unwrap());
        let created_at = forged.version_time;
        sign_entry(&mut forged, &old, created_at).unwrap();
        created.log.push(forged);
        assert!(matches!(
            check(&created.log),
            Err(WebvhError::UnauthorizedKey { .. })
        ));
    }

    #[test]
    fn deactivated_log_cannot_be_extended() {
        let s = signer(1);
        let mut created = create("example.com", &["alice"], &s, options_at("2026-01-01T00:00:00Z")).unwrap();
        update(
            &mut created.log,
            LogUpdate {
                deactivate: true,
                ..at("2026-01-02T00:00:00Z")
            },
            &s,
        )
        .unwrap();
        let validated = check(&created.log).unwrap();
        assert!(validated.parameters.deactivated);
        assert!(validated.parameters.update_keys.is_empty());

        let err = update(&mut created.log, at("2026-01-03T00:00:00Z"), &s).unwrap_err();
        assert!(matches!(err, WebvhError::Deactivated { .. }));
    }

    #[test]
    fn time_cannot_go_backwards() {
        let s = signer(1);
        let mut created = create("example.com", &["alice"], &s, options_at("2026-01-05T00:00:00Z")).unwrap();
        let err = update(&mut created.log, at("2026-01-04T00:00:00Z"), &s).unwrap_err();
        assert!(matches!(err, WebvhError::TimeOrder { .. }));
    }

    #[test]
    fn non_portable_document_cannot_move() {
        let s = signer(1);
        let mut created = create("example.com", &["alice"], &s, options_at("2026-01-01T00:00:00Z")).unwrap();
        let mut state = created.genesis().unwrap().state.clone();
        state["id"] = json!(format!("did:webvh:{}:other.org:alice", created.scid));
        let err = update(
            &mut created.log,
            LogUpdate {
                state: Some(state.clone()),
                ..at("2026-01-02T00:00:00Z")
            },
            &s,
        )
        .unwrap_err();
        assert!(matches!(err, WebvhError::DocumentIdMismatch { .. }));

        let mut portable = create(
            "example.com",
            &["alice"],
            &s,
            CreateOptions {
                portable: true,
                ..options_at("2026-01-01T00:00:00Z")
            },
        )
        .unwrap();
        state["id"] = json!(format!("did:webvh:{}:other.org:alice", portable.scid));
        update(
            &mut portable.log,
            LogUpdate {
                state: Some(state),
                ..at("2026-01-02T00:00:00Z")
            },
            &s,
        )
        .unwrap();
        let validated = check(&portable.log).unwrap();
        assert_eq!(validated.did.domain(), "other.org");
    }

    #[test]
    fn structural_tampering_detected() {
        let s = signer(1);
        let mut created = create("example.com", &["alice"], &s, options_at("2026-01-01T00:00:00Z")).unwrap();
        update(&mut created.log, at("2026-01-02T00:00:00Z"), &s).unwrap();
        let entries = created.log.entries().to_vec();

        let reordered = DidLog::from_entries(vec![entries[1].clone(), entries[0].clone()]);
        assert!(check(&reordered).is_err());

        let truncated_head = DidLog::from_entries(vec![entries[1].clone()]);
        assert!(check(&truncated_head).is_err());

        let mut unsigned = entries.clone();
        unsigned[1].proof.clear();
        assert!(matches!(
            check(&DidLog::from_entries(unsigned)),
            Err(WebvhError::MissingProof { .. })
        ));

        let mut bad_scid = entries.clone();
        bad_scid[0].parameters.scid = Some("QmForged".into());
        assert!(check(&DidLog::from_entries(bad_scid)).is_err());

        assert!(matches!(check(&DidLog::default()), Err(WebvhError::EmptyLog)));
    }

    #[test]
    fn extra_proof_must_also_verify() {
        let s = signer(1);
        let created = create("example.com", &["alice"], &s, options_at("2026-01-01T00:00:00Z")).unwrap();
        let mut entries = created.log.entries().to_vec();
        let mut second = entries[0].proof[0].clone();
        second.proof_value = entries[0].proof[0].proof_value.replacen('z', "z1", 1);
        entries[0].proof.push(second);
        assert!(check(&DidLog::from_entries(entries)).is_err());
    }

    #[test]
    fn registered_verification_method_accepted() {
        struct WebvhVmSigner(LocalKeyProvider, String);
        impl Signer for WebvhVmSigner {
            fn update_key(&self) -> Result<String, WebvhError> {
                Ok(originals_crypto::KeyProvider::verifying_key(&self.0)?.to_multikey())
            }
            fn verification_method(&self) -> Result<String, WebvhError> {
                Ok(self.1.clone())
            }
            fn sign(&self, options: ProofOptions, data: &CanonicalBytes) -> Result<crate::proof::DataIntegrityProof, WebvhError> {
                let sig = originals_crypto::KeyProvider::sign(&self.0, data)?;
                Ok(options.into_proof(sig.to_multibase()))
            }
        }
        let signer = WebvhVmSigner(LocalKeyProvider::from_seed(&[5; 32]), "https://keys.example/vm#1".into());
        let created = create("example.com", &["carol"], &signer, options_at("2026-01-01T00:00:00Z")).unwrap();

        let suites = CryptosuiteRegistry::default();
        let mut methods = VerificationMethodRegistry::new();
        assert!(matches!(
            validate(&created.log, &methods, &suites),
            Err(WebvhError::UnresolvedVerificationMethod { .. })
        ));
        methods.register(
            "https://keys.example/vm#1",
            originals_crypto::KeyProvider::verifying_key(&signer.0).unwrap(),
        );
        validate(&created.log, &methods, &suites).unwrap();
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn sample_jsonl() -> String {
            let s = signer(1);
            let mut created = create("example.com", &["alice"], &s, options_at("2026-01-01T00:00:00Z")).unwrap();
            update(&mut created.log, at("2026-01-02T00:00:00Z"), &s).unwrap();
            created.log.to_jsonl().unwrap()
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn any_single_byte_mutation_is_detected(pos in any::<prop::sample::Index>(), bit in 0u8..7) {
                let jsonl = sample_jsonl();
                let mut bytes = jsonl.into_bytes();
                let body_len = bytes.len() - 1;
                let i = pos.index(body_len);
                bytes[i] ^= 1 << bit;

                let rejected = match String::from_utf8(bytes) {
                    Err(_) => true,
                    Ok(text) => match DidLog::from_jsonl(&text) {
                        Err(_) => true,
                        Ok(log) => check(&log).is_err(),
                    },
                };
                prop_assert!(rejected, "mutation at byte {} went undetected", i);
            }
        }
    }
}
