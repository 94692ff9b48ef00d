//! Round-local collection of heartbeats and signatures, and the decision rule applied to them.

use std::collections::{btree_map::Entry, BTreeMap};

use crate::types::{
    block::{Block, SignatureSet},
    data_types::{HeartbeatId, SignatureBytes, VerifyingKeyBytes},
    heartbeat::{Heartbeat, HeartbeatList},
};

/// The acceptance threshold: strictly more than half of the `known` participants.
pub const fn exceeds_half(count: usize, known: usize) -> bool {
    count * 2 > known
}

/// Heartbeats and signatures seen so far in the current round.
///
/// A `RoundAccumulator` is owned by the state machine thread alone. Merges are idempotent: merging
/// the same bundle twice leaves the accumulator as merging it once would.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundAccumulator {
    heartbeats: BTreeMap<HeartbeatId, Heartbeat>,
    signatures: SignatureSet,
}

/// How many of the signatures in a merged bundle were taken, and how many failed validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub accepted: usize,
    pub rejected: usize,
}

impl RoundAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `heartbeat`. Returns false if a heartbeat with the same id was already present, in
    /// which case the stored one is kept.
    pub fn insert_heartbeat(&mut self, heartbeat: Heartbeat) -> bool {
        match self.heartbeats.entry(heartbeat.id) {
            Entry::Vacant(entry) => {
                entry.insert(heartbeat);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Record `signer`'s signature over the stored heartbeat `id`. Returns false if no such
    /// heartbeat is stored. The caller must have validated the signature.
    pub fn add_signature(&mut self, id: HeartbeatId, signer: VerifyingKeyBytes, signature: SignatureBytes) -> bool {
        if !self.heartbeats.contains_key(&id) {
            return false;
        }
        self.signatures.entry(id).or_default().insert(signer, signature);
        true
    }

    /// Merge the signatures carried by `list`. Each one is checked with `is_valid` against the
    /// heartbeat it signs before it is taken. Heartbeats not seen before are adopted along with their
    /// first valid signature.
    pub fn merge_heartbeat_list(
        &mut self,
        list: &HeartbeatList,
        mut is_valid: impl FnMut(&Heartbeat, &VerifyingKeyBytes, &SignatureBytes) -> bool,
    ) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for (id, signature) in &list.signatures {
            match list.heartbeat(id) {
                Some(heartbeat) if self.merge_one(heartbeat, &list.host, signature, &mut is_valid) => {
                    outcome.accepted += 1
                }
                _ => outcome.rejected += 1,
            }
        }
        outcome
    }

    /// Merge the signatures carried by a candidate `block`, validating each as
    /// [`merge_heartbeat_list`](Self::merge_heartbeat_list) does.
    pub fn merge_block(
        &mut self,
        block: &Block,
        mut is_valid: impl FnMut(&Heartbeat, &VerifyingKeyBytes, &SignatureBytes) -> bool,
    ) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for (id, signers) in &block.signatures {
            let heartbeat = block.heartbeat(id);
            for (signer, signature) in signers {
                match heartbeat {
                    Some(heartbeat) if self.merge_one(heartbeat, signer, signature, &mut is_valid) => {
                        outcome.accepted += 1
                    }
                    _ => outcome.rejected += 1,
                }
            }
        }
        outcome
    }

    fn merge_one(
        &mut self,
        heartbeat: &Heartbeat,
        signer: &VerifyingKeyBytes,
        signature: &SignatureBytes,
        is_valid: &mut impl FnMut(&Heartbeat, &VerifyingKeyBytes, &SignatureBytes) -> bool,
    ) -> bool {
        // A differing heartbeat under a known id cannot be what the stored signatures cover.
        if self.heartbeats.get(&heartbeat.id).is_some_and(|stored| stored != heartbeat) {
            return false;
        }
        if !is_valid(heartbeat, signer, signature) {
            return false;
        }
        self.insert_heartbeat(heartbeat.clone());
        self.add_signature(heartbeat.id, *signer, *signature)
    }

    pub fn heartbeats(&self) -> &BTreeMap<HeartbeatId, Heartbeat> {
        &self.heartbeats
    }

    pub fn signatures(&self) -> &SignatureSet {
        &self.signatures
    }

    pub fn signature_count(&self, id: &HeartbeatId) -> usize {
        self.signatures.get(id).map_or(0, BTreeMap::len)
    }

    /// Heartbeats whose signature count so far exceeds half of `known`, at most one per host, sorted by
    /// host, together with their signatures. This is a copy: later merges do not affect it.
    pub fn candidate(&self, known: usize) -> (Vec<Heartbeat>, SignatureSet) {
        let mut best_per_host: BTreeMap<VerifyingKeyBytes, &Heartbeat> = BTreeMap::new();
        for heartbeat in self.heartbeats.values() {
            let count = self.signature_count(&heartbeat.id);
            if !exceeds_half(count, known) {
                continue;
            }
            // Keep the better-signed heartbeat if a host sent more than one. Ties go to the lower id,
            // which is the one iterated first.
            match best_per_host.entry(heartbeat.host) {
                Entry::Vacant(entry) => {
                    entry.insert(heartbeat);
                }
                Entry::Occupied(mut entry) => {
                    if count > self.signature_count(&entry.get().id) {
                        entry.insert(heartbeat);
                    }
                }
            }
        }

        let heartbeats: Vec<Heartbeat> = best_per_host.into_values().cloned().collect();
        let signatures = heartbeats
            .iter()
            .filter_map(|heartbeat| {
                self.signatures
                    .get(&heartbeat.id)
                    .map(|signers| (heartbeat.id, signers.clone()))
            })
            .collect();
        (heartbeats, signatures)
    }

    /// Apply the decision rule: keep the heartbeats that gathered signatures from more than half of
    /// `known` participants, and accept them only if they too number more than half of `known`.
    pub fn decide(&self, known: usize) -> Option<(Vec<Heartbeat>, SignatureSet)> {
        let (heartbeats, signatures) = self.candidate(known);
        if exceeds_half(heartbeats.len(), known) {
            Some((heartbeats, signatures))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.heartbeats.clear();
        self.signatures.clear();
    }
}
