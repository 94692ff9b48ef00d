//! Exhaustive enumerations around every message variant used in quorum_rs.

use std::io;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    bootstrap::messages::{BootstrapMessage, JoinRequest, SeatAnnouncement},
    three_phase::messages::ConsensusMessage,
    types::{
        block::Block,
        heartbeat::{Heartbeat, HeartbeatList},
    },
};

/// All message variants used in quorum_rs. Each variant is tagged on the wire, so a dispatcher can
/// route a decoded message without inspecting its contents.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Message {
    /// See: [`BootstrapMessage`].
    BootstrapMessage(BootstrapMessage),

    /// See: [`ConsensusMessage`].
    ConsensusMessage(ConsensusMessage),
}

impl Message {
    /// Serialize this message for a transport that moves bytes.
    pub fn encode(&self) -> Vec<u8> {
        self.try_to_vec().unwrap()
    }

    /// Deserialize a message produced by [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Message, DecodeError> {
        Message::try_from_slice(bytes).map_err(DecodeError)
    }
}

/// The bytes handed to [`Message::decode`] are not a message.
#[derive(Debug)]
pub struct DecodeError(pub io::Error);

impl From<JoinRequest> for Message {
    fn from(value: JoinRequest) -> Self {
        Message::BootstrapMessage(BootstrapMessage::JoinRequest(value))
    }
}

impl From<SeatAnnouncement> for Message {
    fn from(value: SeatAnnouncement) -> Self {
        Message::BootstrapMessage(BootstrapMessage::SeatAnnouncement(value))
    }
}

impl From<Heartbeat> for Message {
    fn from(value: Heartbeat) -> Self {
        Message::ConsensusMessage(ConsensusMessage::Heartbeat(value))
    }
}

impl From<HeartbeatList> for Message {
    fn from(value: HeartbeatList) -> Self {
        Message::ConsensusMessage(ConsensusMessage::HeartbeatList(value))
    }
}

impl From<Block> for Message {
    fn from(value: Block) -> Self {
        Message::ConsensusMessage(ConsensusMessage::Block(value))
    }
}
