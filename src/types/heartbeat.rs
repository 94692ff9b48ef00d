/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Per-round liveness claims, and the bundles in which hosts exchange their signatures over them.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};

use super::{
    crypto_primitives::{commitment, verify, Keypair},
    data_types::{CryptoHash, Entropy, HeartbeatId, HeartbeatListId, SignatureBytes, SwarmId, VerifyingKeyBytes},
};

/// A storage commitment waiting to be carried by the next heartbeat. Opaque to the consensus engine.
#[derive(Clone, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct PendingRecord(Vec<u8>);

impl PendingRecord {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A claim by `host` that it is alive in the current round.
///
/// ## Commit-reveal
///
/// `entropy_stage1` commits to a fresh secret, and `entropy_stage2` reveals the secret committed to
/// by this host's previous heartbeat. A heartbeat continues the chain iff
/// `hash(entropy_stage2) == previous.entropy_stage1`. Hosts starting a chain reveal
/// [`Entropy::zero`], which matches the sentinel commitment every seat begins with.
///
/// ## Authenticity
///
/// `host_signature` is `host`'s own signature over [`signing_bytes`](Self::signing_bytes). Peers
/// only take in heartbeats for which [`is_authentic`](Self::is_authentic) holds, so a relayed copy
/// cannot alter the commitment or the records of the host it names.
#[derive(Clone, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct Heartbeat {
    pub id: HeartbeatId,
    pub swarm_id: SwarmId,
    pub host: VerifyingKeyBytes,
    pub entropy_stage1: CryptoHash,
    pub entropy_stage2: Entropy,
    pub pending_records: Vec<PendingRecord>,
    pub host_signature: SignatureBytes,
}

impl Heartbeat {
    /// Create a heartbeat hosted, and signed, by `host` with a freshly drawn [`HeartbeatId`].
    pub fn new(
        host: &Keypair,
        swarm_id: SwarmId,
        entropy_stage1: CryptoHash,
        entropy_stage2: Entropy,
        pending_records: Vec<PendingRecord>,
    ) -> Self {
        let mut heartbeat = Self {
            id: HeartbeatId::random(),
            swarm_id,
            host: host.public_bytes(),
            entropy_stage1,
            entropy_stage2,
            pending_records,
            host_signature: SignatureBytes::new([0u8; 64]),
        };
        heartbeat.host_signature = host.sign(&heartbeat.signing_bytes());
        heartbeat
    }

    /// The bytes that the host and its peers sign: every field except `host_signature`.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.id.try_to_vec().unwrap());
        bytes.extend_from_slice(&self.swarm_id.try_to_vec().unwrap());
        bytes.extend_from_slice(&self.host.try_to_vec().unwrap());
        bytes.extend_from_slice(&self.entropy_stage1.try_to_vec().unwrap());
        bytes.extend_from_slice(&self.entropy_stage2.try_to_vec().unwrap());
        bytes.extend_from_slice(&self.pending_records.try_to_vec().unwrap());
        bytes
    }

    /// Whether `host_signature` is `host`'s signature over this heartbeat's content.
    pub fn is_authentic(&self) -> bool {
        verify(&self.host, &self.signing_bytes(), &self.host_signature)
    }

    /// Whether this heartbeat reveals the secret behind `predecessor`.
    pub fn reveals(&self, predecessor: &CryptoHash) -> bool {
        commitment(&self.entropy_stage2) == *predecessor
    }
}

/// Every heartbeat `host` has seen this round, together with `host`'s signature over each one it
/// found valid. Broadcast during the signing phase.
#[derive(Clone, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct HeartbeatList {
    pub id: HeartbeatListId,
    pub swarm_id: SwarmId,
    pub host: VerifyingKeyBytes,
    pub heartbeats: Vec<Heartbeat>,
    pub signatures: BTreeMap<HeartbeatId, SignatureBytes>,
}

impl HeartbeatList {
    pub fn new(
        swarm_id: SwarmId,
        host: VerifyingKeyBytes,
        heartbeats: Vec<Heartbeat>,
        signatures: BTreeMap<HeartbeatId, SignatureBytes>,
    ) -> Self {
        Self {
            id: HeartbeatListId::random(),
            swarm_id,
            host,
            heartbeats,
            signatures,
        }
    }

    pub fn heartbeat(&self, id: &HeartbeatId) -> Option<&Heartbeat> {
        self.heartbeats.iter().find(|heartbeat| heartbeat.id == *id)
    }
}
