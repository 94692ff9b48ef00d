/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The thread that runs user-registered event handlers and the built-in loggers.

use crate::events::*;
use crate::logging::Logger;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub(crate) type HandlerPtr<T> = Box<dyn Fn(&T) + Send>;

// How long the bus waits for an event before checking for shutdown again.
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Default)]
pub(crate) struct EventHandlers {
    pub(crate) send_join_request_handlers: Vec<HandlerPtr<SendJoinRequestEvent>>,
    pub(crate) assign_seat_handlers: Vec<HandlerPtr<AssignSeatEvent>>,
    pub(crate) reject_join_handlers: Vec<HandlerPtr<RejectJoinEvent>>,
    pub(crate) record_participant_handlers: Vec<HandlerPtr<RecordParticipantEvent>>,
    pub(crate) reject_announcement_handlers: Vec<HandlerPtr<RejectAnnouncementEvent>>,
    pub(crate) start_ticking_handlers: Vec<HandlerPtr<StartTickingEvent>>,
    pub(crate) produce_heartbeat_handlers: Vec<HandlerPtr<ProduceHeartbeatEvent>>,
    pub(crate) sign_heartbeats_handlers: Vec<HandlerPtr<SignHeartbeatsEvent>>,
    pub(crate) propose_block_handlers: Vec<HandlerPtr<ProposeBlockEvent>>,
    pub(crate) receive_heartbeat_handlers: Vec<HandlerPtr<ReceiveHeartbeatEvent>>,
    pub(crate) receive_heartbeat_list_handlers: Vec<HandlerPtr<ReceiveHeartbeatListEvent>>,
    pub(crate) receive_block_handlers: Vec<HandlerPtr<ReceiveBlockEvent>>,
    pub(crate) drop_message_handlers: Vec<HandlerPtr<DropMessageEvent>>,
    pub(crate) reject_heartbeat_handlers: Vec<HandlerPtr<RejectHeartbeatEvent>>,
    pub(crate) accept_block_handlers: Vec<HandlerPtr<AcceptBlockEvent>>,
    pub(crate) discard_round_handlers: Vec<HandlerPtr<DiscardRoundEvent>>,
    pub(crate) switch_policy_handlers: Vec<HandlerPtr<SwitchPolicyEvent>>,
    pub(crate) die_handlers: Vec<HandlerPtr<DieEvent>>,
}

impl EventHandlers {
    /// Collect the user's handlers, adding a logger for every event kind if `log_events` is true.
    pub(crate) fn new(
        log_events: bool,
        send_join_request_handler: Option<HandlerPtr<SendJoinRequestEvent>>,
        assign_seat_handler: Option<HandlerPtr<AssignSeatEvent>>,
        reject_join_handler: Option<HandlerPtr<RejectJoinEvent>>,
        record_participant_handler: Option<HandlerPtr<RecordParticipantEvent>>,
        reject_announcement_handler: Option<HandlerPtr<RejectAnnouncementEvent>>,
        start_ticking_handler: Option<HandlerPtr<StartTickingEvent>>,
        produce_heartbeat_handler: Option<HandlerPtr<ProduceHeartbeatEvent>>,
        sign_heartbeats_handler: Option<HandlerPtr<SignHeartbeatsEvent>>,
        propose_block_handler: Option<HandlerPtr<ProposeBlockEvent>>,
        receive_heartbeat_handler: Option<HandlerPtr<ReceiveHeartbeatEvent>>,
        receive_heartbeat_list_handler: Option<HandlerPtr<ReceiveHeartbeatListEvent>>,
        receive_block_handler: Option<HandlerPtr<ReceiveBlockEvent>>,
        drop_message_handler: Option<HandlerPtr<DropMessageEvent>>,
        reject_heartbeat_handler: Option<HandlerPtr<RejectHeartbeatEvent>>,
        accept_block_handler: Option<HandlerPtr<AcceptBlockEvent>>,
        discard_round_handler: Option<HandlerPtr<DiscardRoundEvent>>,
        switch_policy_handler: Option<HandlerPtr<SwitchPolicyEvent>>,
        die_handler: Option<HandlerPtr<DieEvent>>,
    ) -> Self {
        let mut handlers = Self::default();

        handlers.send_join_request_handlers.extend(send_join_request_handler);
        handlers.assign_seat_handlers.extend(assign_seat_handler);
        handlers.reject_join_handlers.extend(reject_join_handler);
        handlers.record_participant_handlers.extend(record_participant_handler);
        handlers.reject_announcement_handlers.extend(reject_announcement_handler);
        handlers.start_ticking_handlers.extend(start_ticking_handler);
        handlers.produce_heartbeat_handlers.extend(produce_heartbeat_handler);
        handlers.sign_heartbeats_handlers.extend(sign_heartbeats_handler);
        handlers.propose_block_handlers.extend(propose_block_handler);
        handlers.receive_heartbeat_handlers.extend(receive_heartbeat_handler);
        handlers.receive_heartbeat_list_handlers.extend(receive_heartbeat_list_handler);
        handlers.receive_block_handlers.extend(receive_block_handler);
        handlers.drop_message_handlers.extend(drop_message_handler);
        handlers.reject_heartbeat_handlers.extend(reject_heartbeat_handler);
        handlers.accept_block_handlers.extend(accept_block_handler);
        handlers.discard_round_handlers.extend(discard_round_handler);
        handlers.switch_policy_handlers.extend(switch_policy_handler);
        handlers.die_handlers.extend(die_handler);

        if log_events {
            handlers.send_join_request_handlers.push(SendJoinRequestEvent::get_logger());
            handlers.assign_seat_handlers.push(AssignSeatEvent::get_logger());
            handlers.reject_join_handlers.push(RejectJoinEvent::get_logger());
            handlers.record_participant_handlers.push(RecordParticipantEvent::get_logger());
            handlers.reject_announcement_handlers.push(RejectAnnouncementEvent::get_logger());
            handlers.start_ticking_handlers.push(StartTickingEvent::get_logger());
            handlers.produce_heartbeat_handlers.push(ProduceHeartbeatEvent::get_logger());
            handlers.sign_heartbeats_handlers.push(SignHeartbeatsEvent::get_logger());
            handlers.propose_block_handlers.push(ProposeBlockEvent::get_logger());
            handlers.receive_heartbeat_handlers.push(ReceiveHeartbeatEvent::get_logger());
            handlers.receive_heartbeat_list_handlers.push(ReceiveHeartbeatListEvent::get_logger());
            handlers.receive_block_handlers.push(ReceiveBlockEvent::get_logger());
            handlers.drop_message_handlers.push(DropMessageEvent::get_logger());
            handlers.reject_heartbeat_handlers.push(RejectHeartbeatEvent::get_logger());
            handlers.accept_block_handlers.push(AcceptBlockEvent::get_logger());
            handlers.discard_round_handlers.push(DiscardRoundEvent::get_logger());
            handlers.switch_policy_handlers.push(SwitchPolicyEvent::get_logger());
            handlers.die_handlers.push(DieEvent::get_logger());
        }

        handlers
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.send_join_request_handlers.is_empty()
            && self.assign_seat_handlers.is_empty()
            && self.reject_join_handlers.is_empty()
            && self.record_participant_handlers.is_empty()
            && self.reject_announcement_handlers.is_empty()
            && self.start_ticking_handlers.is_empty()
            && self.produce_heartbeat_handlers.is_empty()
            && self.sign_heartbeats_handlers.is_empty()
            && self.propose_block_handlers.is_empty()
            && self.receive_heartbeat_handlers.is_empty()
            && self.receive_heartbeat_list_handlers.is_empty()
            && self.receive_block_handlers.is_empty()
            && self.drop_message_handlers.is_empty()
            && self.reject_heartbeat_handlers.is_empty()
            && self.accept_block_handlers.is_empty()
            && self.discard_round_handlers.is_empty()
            && self.switch_policy_handlers.is_empty()
            && self.die_handlers.is_empty()
    }

    pub(crate) fn fire_handlers(&self, event: Event) {
        match event {
            Event::SendJoinRequest(event) => fire(&self.send_join_request_handlers, &event),
            Event::AssignSeat(event) => fire(&self.assign_seat_handlers, &event),
            Event::RejectJoin(event) => fire(&self.reject_join_handlers, &event),
            Event::RecordParticipant(event) => fire(&self.record_participant_handlers, &event),
            Event::RejectAnnouncement(event) => fire(&self.reject_announcement_handlers, &event),
            Event::StartTicking(event) => fire(&self.start_ticking_handlers, &event),
            Event::ProduceHeartbeat(event) => fire(&self.produce_heartbeat_handlers, &event),
            Event::SignHeartbeats(event) => fire(&self.sign_heartbeats_handlers, &event),
            Event::ProposeBlock(event) => fire(&self.propose_block_handlers, &event),
            Event::ReceiveHeartbeat(event) => fire(&self.receive_heartbeat_handlers, &event),
            Event::ReceiveHeartbeatList(event) => fire(&self.receive_heartbeat_list_handlers, &event),
            Event::ReceiveBlock(event) => fire(&self.receive_block_handlers, &event),
            Event::DropMessage(event) => fire(&self.drop_message_handlers, &event),
            Event::RejectHeartbeat(event) => fire(&self.reject_heartbeat_handlers, &event),
            Event::AcceptBlock(event) => fire(&self.accept_block_handlers, &event),
            Event::DiscardRound(event) => fire(&self.discard_round_handlers, &event),
            Event::SwitchPolicy(event) => fire(&self.switch_policy_handlers, &event),
            Event::Die(event) => fire(&self.die_handlers, &event),
        }
    }
}

fn fire<T>(handlers: &[HandlerPtr<T>], event: &T) {
    handlers.iter().for_each(|handler| handler(event))
}

pub(crate) fn start_event_bus(
    event_handlers: EventHandlers,
    event_subscriber: Receiver<Event>,
    shutdown_signal: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        match shutdown_signal.try_recv() {
            Ok(()) => {
                // Flush what the other threads published before they stopped.
                event_subscriber
                    .try_iter()
                    .for_each(|event| event_handlers.fire_handlers(event));
                return;
            }
            Err(TryRecvError::Empty) => (),
            Err(TryRecvError::Disconnected) => {
                panic!("event_bus thread disconnected from main thread")
            }
        }

        match event_subscriber.recv_timeout(EVENT_POLL_INTERVAL) {
            Ok(event) => event_handlers.fire_handlers(event),
            Err(RecvTimeoutError::Timeout) => (),
            Err(RecvTimeoutError::Disconnected) => thread::sleep(EVENT_POLL_INTERVAL),
        }
    })
}
