/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The ledger that the three-phase protocol produces, and the bookkeeping it carries.
//!
//! A [`Blockchain`] is a shared handle. The state machine appends decided blocks and swaps the
//! current [`Policy`] through it, while higher-level storage logic uses it to queue pending records,
//! manage wallets, and ask whether a host is alive. Every field sits behind one mutex, and no
//! operation holds that mutex across a network call.
//!
//! ## Bounded history
//!
//! Only the most recent blocks are kept: appending to a full history evicts the oldest block first.
//! The default capacity is [`DEFAULT_HISTORY_CAPACITY`].
//!
//! ## DRNG seed
//!
//! Each accepted block replaces the seed with the hash of the secrets its heartbeats reveal, in block
//! order. [`Blockchain::random_number`] hash-advances the seed, so every node that accepted the same
//! blocks draws the same sequence.

pub mod wallets;

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    policy::Policy,
    types::{
        block::Block,
        crypto_primitives::{hash, sentinel_commitment},
        data_types::{CryptoHash, SwarmId, VerifyingKeyBytes, ENTROPY_VOLUME},
        heartbeat::PendingRecord,
    },
};

pub use wallets::{WalletError, Wallets};

pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

#[derive(Clone)]
pub struct Blockchain {
    state: Arc<Mutex<LedgerState>>,
}

struct LedgerState {
    swarm_id: SwarmId,
    history: VecDeque<Block>,
    capacity: usize,
    policy: Policy,
    wallets: Wallets,
    pending_records: Vec<PendingRecord>,
    drng_seed: CryptoHash,
}

impl Blockchain {
    /// Create an empty ledger for `swarm_id` that keeps at most `capacity` blocks. A node starts
    /// under the [informed](crate::policy::InformedPolicy) policy.
    pub fn new(swarm_id: SwarmId, capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState {
                swarm_id,
                history: VecDeque::with_capacity(capacity),
                capacity,
                policy: Policy::informed(),
                wallets: Wallets::new(),
                pending_records: Vec::new(),
                drng_seed: sentinel_commitment(),
            })),
        }
    }

    pub fn swarm_id(&self) -> SwarmId {
        self.lock().swarm_id
    }

    /// Push `block` onto the history, evicting the oldest block if the history is full, and fold the
    /// block's reveals into the DRNG seed.
    pub fn append_block(&self, block: Block) {
        let mut state = self.lock();
        let mut reveals = Vec::with_capacity(block.heartbeats.len() * ENTROPY_VOLUME);
        for heartbeat in &block.heartbeats {
            reveals.extend_from_slice(&heartbeat.entropy_stage2.bytes());
        }
        state.drng_seed = hash(&reveals);

        if state.capacity == 0 {
            return;
        }
        while state.history.len() >= state.capacity {
            state.history.pop_front();
        }
        state.history.push_back(block);
    }

    /// The most recently appended block.
    ///
    /// # Errors
    /// [`LedgerError::EmptyHistory`] if no block has been accepted yet.
    pub fn last_block(&self) -> Result<Block, LedgerError> {
        self.lock().history.back().cloned().ok_or(LedgerError::EmptyHistory)
    }

    /// Copy of the retained history, oldest first.
    pub fn blocks(&self) -> Vec<Block> {
        self.lock().history.iter().cloned().collect()
    }

    pub fn block_count(&self) -> usize {
        self.lock().history.len()
    }

    /// Whether `host` has a heartbeat in the most recent block. False before the first block.
    pub fn is_host_active(&self, host: &VerifyingKeyBytes) -> bool {
        self.lock()
            .history
            .back()
            .is_some_and(|block| block.contains_host(host))
    }

    /// Replace the current policy, returning the one it replaced.
    pub fn switch_policy(&self, policy: Policy) -> Policy {
        std::mem::replace(&mut self.lock().policy, policy)
    }

    pub fn current_policy(&self) -> Policy {
        self.lock().policy
    }

    pub fn add_wallet(&self, id: &str, balance: u64) -> Result<(), WalletError> {
        self.lock().wallets.add(id, balance)
    }

    pub fn move_balance(&self, src: &str, dst: &str, amount: u64) -> Result<(), WalletError> {
        self.lock().wallets.move_balance(src, dst, amount)
    }

    pub fn balance(&self, id: &str) -> Option<u64> {
        self.lock().wallets.balance(id)
    }

    pub fn current_wallets(&self) -> BTreeMap<String, u64> {
        self.lock().wallets.snapshot()
    }

    /// Queue `record` for the next heartbeat this node produces.
    pub fn add_pending_record(&self, record: PendingRecord) {
        self.lock().pending_records.push(record)
    }

    /// Copy of the queue. The queue itself is left untouched.
    pub fn pending_records(&self) -> Vec<PendingRecord> {
        self.lock().pending_records.clone()
    }

    /// Take every queued record, leaving the queue empty. Ownership passes to the caller.
    pub fn drain_pending_records(&self) -> Vec<PendingRecord> {
        std::mem::take(&mut self.lock().pending_records)
    }

    pub fn drng_seed(&self) -> CryptoHash {
        self.lock().drng_seed
    }

    /// Advance the DRNG seed by one step and return its new value.
    pub fn random_number(&self) -> CryptoHash {
        let mut state = self.lock();
        state.drng_seed = hash(&state.drng_seed.bytes());
        state.drng_seed
    }

    /// A number in `0..bound` drawn from [`random_number`](Self::random_number). None if `bound` is 0.
    pub fn random_int(&self, bound: u64) -> Option<u64> {
        if bound == 0 {
            return None;
        }
        let bytes = self.random_number().bytes();
        let mut head = [0u8; 8];
        head.copy_from_slice(&bytes[..8]);
        Some(u64::from_le_bytes(head) % bound)
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerError {
    EmptyHistory,
}
