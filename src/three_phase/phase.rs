//! The phases of a round, the order they run in, and which messages each one admits.

use super::messages::ConsensusMessageKind;

/// The action the state machine will run the next time its phase timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Heartbeat,
    HeartbeatSigning,
    BlockGeneration,
    BlockDecision,
    /// Terminal. Entered only on shutdown.
    Dead,
}

impl Phase {
    /// The transition table. Rounds cycle through the four live phases in order, and `Dead` never
    /// leaves.
    pub const fn next(self) -> Phase {
        match self {
            Phase::Heartbeat => Phase::HeartbeatSigning,
            Phase::HeartbeatSigning => Phase::BlockGeneration,
            Phase::BlockGeneration => Phase::BlockDecision,
            Phase::BlockDecision => Phase::Heartbeat,
            Phase::Dead => Phase::Dead,
        }
    }

    /// The admission table. A message of `kind` arriving while `self` is the pending phase is
    /// processed only if this returns true, otherwise it is stale (or early) and dropped.
    pub const fn admits(self, kind: ConsensusMessageKind) -> bool {
        match kind {
            ConsensusMessageKind::Heartbeat => {
                matches!(self, Phase::Heartbeat | Phase::HeartbeatSigning)
            }
            ConsensusMessageKind::HeartbeatList => {
                matches!(self, Phase::HeartbeatSigning | Phase::BlockGeneration)
            }
            ConsensusMessageKind::Block => {
                matches!(self, Phase::BlockGeneration | Phase::BlockDecision)
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Phase::Heartbeat => "Heartbeat",
            Phase::HeartbeatSigning => "HeartbeatSigning",
            Phase::BlockGeneration => "BlockGeneration",
            Phase::BlockDecision => "BlockDecision",
            Phase::Dead => "Dead",
        }
    }
}

/// Number of live phases in a round.
pub const PHASES_PER_ROUND: u32 = 4;
