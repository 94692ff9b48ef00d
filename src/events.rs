//! Definitions of quorum_rs events for event handling and logging.
//!
//! An event for a given action indicates that the action has been completed. Events are published by
//! the bootstrap server and the three-phase state machine onto a channel drained by the
//! [event bus](crate::event_bus), which runs the handlers registered on the
//! [`NodeSpec`](crate::node::NodeSpec).

use std::sync::mpsc::Sender;
use std::time::SystemTime;

use crate::{
    membership::MembershipError,
    policy::Policy,
    three_phase::{messages::ConsensusMessageKind, phase::Phase},
    types::{
        block::Block,
        data_types::{Address, HeartbeatId, RoundNumber, SeatIndex, VerifyingKeyBytes},
        heartbeat::{Heartbeat, HeartbeatList},
        participant::{Participant, ParticipantDescriptor},
    },
};

pub enum Event {
    // Bootstrap events.
    SendJoinRequest(SendJoinRequestEvent),
    AssignSeat(AssignSeatEvent),
    RejectJoin(RejectJoinEvent),
    RecordParticipant(RecordParticipantEvent),
    RejectAnnouncement(RejectAnnouncementEvent),
    StartTicking(StartTickingEvent),
    // Events that involve broadcasting a consensus message.
    ProduceHeartbeat(ProduceHeartbeatEvent),
    SignHeartbeats(SignHeartbeatsEvent),
    ProposeBlock(ProposeBlockEvent),
    // Events that involve receiving a consensus message.
    ReceiveHeartbeat(ReceiveHeartbeatEvent),
    ReceiveHeartbeatList(ReceiveHeartbeatListEvent),
    ReceiveBlock(ReceiveBlockEvent),
    DropMessage(DropMessageEvent),
    RejectHeartbeat(RejectHeartbeatEvent),
    // Events that conclude a round.
    AcceptBlock(AcceptBlockEvent),
    DiscardRound(DiscardRoundEvent),
    SwitchPolicy(SwitchPolicyEvent),
    Die(DieEvent),
}

impl Event {
    /// Publish `event` if the node has an event bus. A bus that has already shut down is ignored.
    pub(crate) fn publish(event_publisher: &Option<Sender<Event>>, event: Event) {
        if let Some(event_publisher) = event_publisher {
            let _ = event_publisher.send(event);
        }
    }
}

pub struct SendJoinRequestEvent {
    pub timestamp: SystemTime,
    pub bootstrap: Address,
    pub candidate: ParticipantDescriptor,
}

/// The local node, acting as bootstrap, gave `participant` a seat.
pub struct AssignSeatEvent {
    pub timestamp: SystemTime,
    pub participant: Participant,
}

pub struct RejectJoinEvent {
    pub timestamp: SystemTime,
    pub candidate: ParticipantDescriptor,
    pub reason: MembershipError,
}

/// A seat announcement filled a seat in the local registry that was empty before.
pub struct RecordParticipantEvent {
    pub timestamp: SystemTime,
    pub origin: Address,
    pub participant: Participant,
}

/// A seat announcement from `origin` could not be recorded. The registry is unchanged.
pub struct RejectAnnouncementEvent {
    pub timestamp: SystemTime,
    pub origin: Address,
    pub participant: Participant,
    pub reason: MembershipError,
}

/// The local node learnt its own seat and will start running rounds.
pub struct StartTickingEvent {
    pub timestamp: SystemTime,
    pub seat: SeatIndex,
}

pub struct ProduceHeartbeatEvent {
    pub timestamp: SystemTime,
    pub round: RoundNumber,
    pub heartbeat: Heartbeat,
}

pub struct SignHeartbeatsEvent {
    pub timestamp: SystemTime,
    pub round: RoundNumber,
    pub heartbeat_list: HeartbeatList,
}

pub struct ProposeBlockEvent {
    pub timestamp: SystemTime,
    pub block: Block,
}

pub struct ReceiveHeartbeatEvent {
    pub timestamp: SystemTime,
    pub origin: Address,
    pub heartbeat: Heartbeat,
}

pub struct ReceiveHeartbeatListEvent {
    pub timestamp: SystemTime,
    pub origin: Address,
    pub host: VerifyingKeyBytes,
    pub accepted_signatures: usize,
    pub rejected_signatures: usize,
}

pub struct ReceiveBlockEvent {
    pub timestamp: SystemTime,
    pub origin: Address,
    pub producer: VerifyingKeyBytes,
    pub accepted_signatures: usize,
    pub rejected_signatures: usize,
}

/// A consensus message arrived outside the phases that admit it, or from an unseated host.
pub struct DropMessageEvent {
    pub timestamp: SystemTime,
    pub origin: Address,
    pub kind: ConsensusMessageKind,
    pub phase: Phase,
}

/// The local policy refused to sign a heartbeat.
pub struct RejectHeartbeatEvent {
    pub timestamp: SystemTime,
    pub heartbeat: HeartbeatId,
    pub host: VerifyingKeyBytes,
}

pub struct AcceptBlockEvent {
    pub timestamp: SystemTime,
    pub block: Block,
}

/// A round ended without a majority of well-signed heartbeats.
pub struct DiscardRoundEvent {
    pub timestamp: SystemTime,
    pub round: RoundNumber,
    pub surviving_heartbeats: usize,
    pub known_participants: usize,
}

pub struct SwitchPolicyEvent {
    pub timestamp: SystemTime,
    pub from: Policy,
    pub to: Policy,
}

pub struct DieEvent {
    pub timestamp: SystemTime,
    pub round: RoundNumber,
}
