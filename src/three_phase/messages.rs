//! Messages exchanged during a round of the three-phase protocol.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::types::{
    block::Block,
    data_types::SwarmId,
    heartbeat::{Heartbeat, HeartbeatList},
};

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum ConsensusMessage {
    Heartbeat(Heartbeat),
    HeartbeatList(HeartbeatList),
    Block(Block),
}

/// The tag of a [`ConsensusMessage`], used to decide in which phases it is admitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsensusMessageKind {
    Heartbeat,
    HeartbeatList,
    Block,
}

impl ConsensusMessage {
    pub fn swarm_id(&self) -> SwarmId {
        match self {
            ConsensusMessage::Heartbeat(heartbeat) => heartbeat.swarm_id,
            ConsensusMessage::HeartbeatList(list) => list.swarm_id,
            ConsensusMessage::Block(block) => block.swarm_id,
        }
    }

    pub fn kind(&self) -> ConsensusMessageKind {
        match self {
            ConsensusMessage::Heartbeat(_) => ConsensusMessageKind::Heartbeat,
            ConsensusMessage::HeartbeatList(_) => ConsensusMessageKind::HeartbeatList,
            ConsensusMessage::Block(_) => ConsensusMessageKind::Block,
        }
    }
}
