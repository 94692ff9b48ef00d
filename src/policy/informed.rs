//! Policy of a node that is joining, or rejoining, the active set.

use crate::types::{
    block::Block,
    data_types::{SignatureBytes, VerifyingKeyBytes},
    heartbeat::Heartbeat,
};

use super::{heartbeat_from, record_block, sign, signature_is_valid, EntropyChain, NetHandler, Policy, PolicyContext};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InformedPolicy;

impl NetHandler for InformedPolicy {
    fn produce_heartbeat(&self, ctx: &PolicyContext, entropy: &mut EntropyChain) -> Heartbeat {
        // Peers reset our predecessor to the sentinel when we miss a block, so we reveal zero.
        heartbeat_from(ctx, entropy.restart())
    }

    /// An informed node does not yet trust its view of peers' chains, so it endorses any authentic
    /// heartbeat from a seated host.
    fn validate_heartbeat(&self, ctx: &PolicyContext, heartbeat: &Heartbeat) -> bool {
        heartbeat.swarm_id == ctx.swarm_id
            && ctx.membership.is_seated(&heartbeat.host)
            && heartbeat.is_authentic()
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
            let steady = Policy::steady();
            ctx.ledger.switch_policy(steady);
            Some(steady)
        } else {
            None
        }
    }
}
