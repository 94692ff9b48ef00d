/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The consensus output of one round.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};

use super::{
    data_types::{HeartbeatId, RoundNumber, SeatIndex, SignatureBytes, SwarmId, Timestamp, VerifyingKeyBytes},
    heartbeat::Heartbeat,
};

/// Signatures collected over a round's heartbeats: heartbeat id → signer → signature.
pub type SignatureSet = BTreeMap<HeartbeatId, BTreeMap<VerifyingKeyBytes, SignatureBytes>>;

/// The heartbeats of one round that gathered signatures from more than half of the known
/// participants, along with those signatures.
///
/// The same type carries the best-effort candidate broadcast during `BlockGeneration`; only a block
/// that passed the decision in `BlockDecision` is ever appended to the
/// [`Blockchain`](crate::ledger::Blockchain).
#[derive(Clone, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct Block {
    pub swarm_id: SwarmId,
    pub round: RoundNumber,
    pub producer_seat: SeatIndex,
    pub producer: VerifyingKeyBytes,
    pub heartbeats: Vec<Heartbeat>,
    pub signatures: SignatureSet,
    /// When the round after this one begins.
    pub next_round_deadline: Timestamp,
}

impl Block {
    pub fn new(
        swarm_id: SwarmId,
        round: RoundNumber,
        producer_seat: SeatIndex,
        producer: VerifyingKeyBytes,
        heartbeats: Vec<Heartbeat>,
        signatures: SignatureSet,
        next_round_deadline: Timestamp,
    ) -> Self {
        Self {
            swarm_id,
            round,
            producer_seat,
            producer,
            heartbeats,
            signatures,
            next_round_deadline,
        }
    }

    pub fn heartbeat(&self, id: &HeartbeatId) -> Option<&Heartbeat> {
        self.heartbeats.iter().find(|heartbeat| heartbeat.id == *id)
    }

    pub fn heartbeat_of(&self, host: &VerifyingKeyBytes) -> Option<&Heartbeat> {
        self.heartbeats.iter().find(|heartbeat| heartbeat.host == *host)
    }

    /// Whether `host` is among the surviving heartbeats of this block.
    pub fn contains_host(&self, host: &VerifyingKeyBytes) -> bool {
        self.heartbeat_of(host).is_some()
    }
}
