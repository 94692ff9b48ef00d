//! Policy of an active member of the quorum.

use crate::types::{
    block::Block,
    data_types::{SignatureBytes, VerifyingKeyBytes},
    heartbeat::Heartbeat,
};

use super::{heartbeat_from, record_block, sign, signature_is_valid, EntropyChain, NetHandler, Policy, PolicyContext};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SteadyPolicy;

impl NetHandler for SteadyPolicy {
    fn produce_heartbeat(&self, ctx: &PolicyContext, entropy: &mut EntropyChain) -> Heartbeat {
        heartbeat_from(ctx, entropy.reveal_and_recommit())
    }

    /// Endorse `heartbeat` only if it reveals the secret behind its host's recorded commitment.
    fn validate_heartbeat(&self, ctx: &PolicyContext, heartbeat: &Heartbeat) -> bool {
        if heartbeat.swarm_id != ctx.swarm_id || !heartbeat.is_authentic() {
            return false;
        }
        match ctx.membership.predecessor_commitment(&heartbeat.host) {
            Some(predecessor) => heartbeat.reveals(&predecessor),
            None => false,
        }
    }

    fn sign_heartbeat(&self, ctx: &PolicyContext, heartbeat: &Heartbeat) -> SignatureBytes {
        sign(ctx, heartbeat)
    }

    fn validate_signature(
        &self,
        ctx: &PolicyContext,
        heartbeat: &Heartbeat,
        signer: &VerifyingKeyBytes,
        signature: &SignatureBytes,
    ) -> bool {
        signature_is_valid(ctx, heartbeat, signer, signature)
    }

    fn on_block_accepted(&self, ctx: &PolicyContext, block: Block) -> Option<Policy> {
        if record_block(ctx, block) {
            None
        } else {
            let informed = Policy::informed();
            ctx.ledger.switch_policy(informed);
            Some(informed)
        }
    }
}
