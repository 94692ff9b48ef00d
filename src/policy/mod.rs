/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The behavioral variants that parameterize the three-phase state machine.
//!
//! A node runs one [`Policy`] at a time. The policy decides how the node produces its own heartbeat,
//! which peer heartbeats it is willing to sign, how it signs and checks signatures, and what it does
//! with a decided block. The current policy lives in the [`Blockchain`] so that it can be swapped
//! atomically when a block is accepted, without stopping message delivery.
//!
//! ## Variants
//!
//! - [`InformedPolicy`]: the node is joining, or has dropped out of the last block. It restarts its
//!   entropy chain every round and signs any heartbeat from a seated host. It becomes
//!   [`SteadyPolicy`] as soon as an accepted block shows the local host as active.
//! - [`SteadyPolicy`]: the node is an active member. It continues its entropy chain and only signs
//!   heartbeats whose reveal matches the host's recorded commitment. It falls back to
//!   [`InformedPolicy`] when an accepted block leaves the local host out.

pub mod entropy;

pub mod informed;

pub mod steady;

use crate::{
    ledger::Blockchain,
    membership::MembershipRegistry,
    types::{
        block::Block,
        crypto_primitives::{verify, Keypair},
        data_types::{CryptoHash, Entropy, SignatureBytes, SwarmId, VerifyingKeyBytes},
        heartbeat::Heartbeat,
    },
};

pub use entropy::EntropyChain;
pub use informed::InformedPolicy;
pub use steady::SteadyPolicy;

/// Everything a policy may read or update while handling one step of a round.
pub struct PolicyContext<'a> {
    pub swarm_id: SwarmId,
    pub keypair: &'a Keypair,
    pub membership: &'a MembershipRegistry,
    pub ledger: &'a Blockchain,
}

/// The capabilities the three-phase state machine needs from a policy.
pub trait NetHandler {
    /// Produce the local host's heartbeat for this round, consuming the ledger's pending records.
    fn produce_heartbeat(&self, ctx: &PolicyContext, entropy: &mut EntropyChain) -> Heartbeat;

    /// Whether the local host should endorse `heartbeat`.
    fn validate_heartbeat(&self, ctx: &PolicyContext, heartbeat: &Heartbeat) -> bool;

    fn sign_heartbeat(&self, ctx: &PolicyContext, heartbeat: &Heartbeat) -> SignatureBytes;

    /// Whether `signature` by `signer` over `heartbeat` counts towards the round's tally.
    fn validate_signature(
        &self,
        ctx: &PolicyContext,
        heartbeat: &Heartbeat,
        signer: &VerifyingKeyBytes,
        signature: &SignatureBytes,
    ) -> bool;

    /// Handle a decided block. Returns the policy the node switched to, if it switched.
    fn on_block_accepted(&self, ctx: &PolicyContext, block: Block) -> Option<Policy>;
}

/// Tagged union of the policy variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    Informed(InformedPolicy),
    Steady(SteadyPolicy),
}

impl Policy {
    pub fn informed() -> Self {
        Policy::Informed(InformedPolicy)
    }

    pub fn steady() -> Self {
        Policy::Steady(SteadyPolicy)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Policy::Informed(_) => "Informed",
            Policy::Steady(_) => "Steady",
        }
    }
}

impl NetHandler for Policy {
    fn produce_heartbeat(&self, ctx: &PolicyContext, entropy: &mut EntropyChain) -> Heartbeat {
        match self {
            Policy::Informed(policy) => policy.produce_heartbeat(ctx, entropy),
            Policy::Steady(policy) => policy.produce_heartbeat(ctx, entropy),
        }
    }

    fn validate_heartbeat(&self, ctx: &PolicyContext, heartbeat: &Heartbeat) -> bool {
        match self {
            Policy::Informed(policy) => policy.validate_heartbeat(ctx, heartbeat),
            Policy::Steady(policy) => policy.validate_heartbeat(ctx, heartbeat),
        }
    }

    fn sign_heartbeat(&self, ctx: &PolicyContext, heartbeat: &Heartbeat) -> SignatureBytes {
        match self {
            Policy::Informed(policy) => policy.sign_heartbeat(ctx, heartbeat),
            Policy::Steady(policy) => policy.sign_heartbeat(ctx, heartbeat),
        }
    }

    fn validate_signature(
        &self,
        ctx: &PolicyContext,
        heartbeat: &Heartbeat,
        signer: &VerifyingKeyBytes,
        signature: &SignatureBytes,
    ) -> bool {
        match self {
            Policy::Informed(policy) => policy.validate_signature(ctx, heartbeat, signer, signature),
            Policy::Steady(policy) => policy.validate_signature(ctx, heartbeat, signer, signature),
        }
    }

    fn on_block_accepted(&self, ctx: &PolicyContext, block: Block) -> Option<Policy> {
        match self {
            Policy::Informed(policy) => policy.on_block_accepted(ctx, block),
            Policy::Steady(policy) => policy.on_block_accepted(ctx, block),
        }
    }
}

// Behavior shared by both variants.

fn sign(ctx: &PolicyContext, heartbeat: &Heartbeat) -> SignatureBytes {
    ctx.keypair.sign(&heartbeat.signing_bytes())
}

fn signature_is_valid(
    ctx: &PolicyContext,
    heartbeat: &Heartbeat,
    signer: &VerifyingKeyBytes,
    signature: &SignatureBytes,
) -> bool {
    ctx.membership.is_seated(signer) && verify(signer, &heartbeat.signing_bytes(), signature)
}

fn heartbeat_from(ctx: &PolicyContext, (stage1, stage2): (CryptoHash, Entropy)) -> Heartbeat {
    Heartbeat::new(
        ctx.keypair,
        ctx.swarm_id,
        stage1,
        stage2,
        ctx.ledger.drain_pending_records(),
    )
}

/// Append `block` to the ledger and move every seat's entropy chain past it. Returns whether the
/// local host is active in `block`.
fn record_block(ctx: &PolicyContext, block: Block) -> bool {
    ctx.membership.advance_commitments(&block);
    let local_is_active = block.contains_host(&ctx.keypair.public_bytes());
    ctx.ledger.append_block(block);
    local_is_active
}
