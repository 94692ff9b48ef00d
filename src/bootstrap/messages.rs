//! Messages exchanged to admit hosts into a quorum.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::types::{
    data_types::SwarmId,
    participant::{Participant, ParticipantDescriptor},
};

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum BootstrapMessage {
    JoinRequest(JoinRequest),
    SeatAnnouncement(SeatAnnouncement),
}

impl BootstrapMessage {
    pub fn swarm_id(&self) -> SwarmId {
        match self {
            BootstrapMessage::JoinRequest(request) => request.swarm_id,
            BootstrapMessage::SeatAnnouncement(announcement) => announcement.swarm_id,
        }
    }
}

/// Sent by a host to the bootstrap address to ask for a seat.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct JoinRequest {
    pub swarm_id: SwarmId,
    pub candidate: ParticipantDescriptor,
}

/// "This seat is filled by this participant." Broadcast by the bootstrap node after it assigns a
/// seat, and sent point-to-point as a courtesy reply when a node learns of a new peer.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SeatAnnouncement {
    pub swarm_id: SwarmId,
    pub participant: Participant,
}
