//! The local host's end of the commit-reveal chain.
//!
//! Peers only move their record of our commitment forward when a block is accepted. The chain
//! therefore keeps two secrets: the one peers currently expect us to reveal, and the one our latest
//! heartbeat committed to. The latter replaces the former only once an accepted block carries its
//! commitment, so a round without a block leaves both sides where they were.

use crate::types::{
    crypto_primitives::commitment,
    data_types::{CryptoHash, Entropy},
    heartbeat::Heartbeat,
};

pub struct EntropyChain {
    // Secret behind the commitment peers recorded from the last accepted block.
    expected: Entropy,
    // Secret behind the commitment in the most recently produced heartbeat.
    pending: Entropy,
}

impl EntropyChain {
    /// A chain that has committed to nothing yet. Its first reveal is [`Entropy::zero`].
    pub fn new() -> Self {
        Self {
            expected: Entropy::zero(),
            pending: Entropy::zero(),
        }
    }

    /// Reveal the secret peers expect and commit to a fresh one. Returns `(stage1, stage2)`: the new
    /// commitment and the revealed secret.
    pub fn reveal_and_recommit(&mut self) -> (CryptoHash, Entropy) {
        self.pending = Entropy::random();
        (commitment(&self.pending), self.expected)
    }

    /// Start the chain over: reveal [`Entropy::zero`] and commit to a fresh secret.
    pub fn restart(&mut self) -> (CryptoHash, Entropy) {
        self.expected = Entropy::zero();
        self.pending = Entropy::random();
        (commitment(&self.pending), Entropy::zero())
    }

    /// Follow peers' view of the chain after a block is accepted. `included` is the local host's
    /// heartbeat in that block, if any.
    ///
    /// If the block carries the commitment to the pending secret, that secret is revealed next.
    /// Otherwise peers reset our record to the sentinel, and the next reveal is zero.
    pub fn on_block_accepted(&mut self, included: Option<&Heartbeat>) {
        self.expected = match included {
            Some(heartbeat) if heartbeat.entropy_stage1 == commitment(&self.pending) => self.pending,
            _ => Entropy::zero(),
        };
    }
}

impl Default for EntropyChain {
    fn default() -> Self {
        Self::new()
    }
}
