/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out events.
//!
//! The logs defined in this module are printed if the user enabled them via the node's
//! [config](crate::node::Configuration).
//!
//! quorum_rs logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
//! printed onto a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! ## Log message format
//!
//! Log messages are CSVs (Comma Separated Values) with at least two values. The first two values are
//! always:
//! 1. The name of the [event](crate::events) in PascalCase (defined in this module as constants).
//! 2. The time the event was emitted (as number of seconds since the Unix Epoch).
//!
//! The rest of the values differ depending on the kind of event. For example, the following snippet
//! is how an [AcceptBlock](crate::events::AcceptBlockEvent) is printed:
//!
//! ```text
//! AcceptBlock, 1701329264, 426813, Id5u7f6, 3
//! ```
//!
//! In the snippet:
//! - The third value is the round number of the block.
//! - The fourth value is the first seven characters of the Base64 encoding of the public key of the
//!   block's producer.
//! - The fifth value is the number of heartbeats in the block.

use crate::events::*;
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use log;
use std::time::SystemTime;

// Names of each event in PascalCase for printing:
pub const SEND_JOIN_REQUEST: &str = "SendJoinRequest";
pub const ASSIGN_SEAT: &str = "AssignSeat";
pub const REJECT_JOIN: &str = "RejectJoin";
pub const RECORD_PARTICIPANT: &str = "RecordParticipant";
pub const REJECT_ANNOUNCEMENT: &str = "RejectAnnouncement";
pub const START_TICKING: &str = "StartTicking";

pub const PRODUCE_HEARTBEAT: &str = "ProduceHeartbeat";
pub const SIGN_HEARTBEATS: &str = "SignHeartbeats";
pub const PROPOSE_BLOCK: &str = "ProposeBlock";

pub const RECEIVE_HEARTBEAT: &str = "ReceiveHeartbeat";
pub const RECEIVE_HEARTBEAT_LIST: &str = "ReceiveHeartbeatList";
pub const RECEIVE_BLOCK: &str = "ReceiveBlock";
pub const DROP_MESSAGE: &str = "DropMessage";
pub const REJECT_HEARTBEAT: &str = "RejectHeartbeat";

pub const ACCEPT_BLOCK: &str = "AcceptBlock";
pub const DISCARD_ROUND: &str = "DiscardRound";
pub const SWITCH_POLICY: &str = "SwitchPolicy";
pub const DIE: &str = "Die";

pub(crate) trait Logger {
    fn get_logger() -> Box<dyn Fn(&Self) + Send>;
}

impl Logger for SendJoinRequestEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |send_join_request_event: &SendJoinRequestEvent| {
            log::info!(
                "{}, {}, {}, {}",
                SEND_JOIN_REQUEST,
                secs_since_unix_epoch(send_join_request_event.timestamp),
                send_join_request_event.bootstrap,
                first_seven_base64_chars(&send_join_request_event.candidate.public_key),
            )
        };
        Box::new(logger)
    }
}

impl Logger for AssignSeatEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |assign_seat_event: &AssignSeatEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                ASSIGN_SEAT,
                secs_since_unix_epoch(assign_seat_event.timestamp),
                assign_seat_event.participant.seat,
                assign_seat_event.participant.address,
                first_seven_base64_chars(&assign_seat_event.participant.public_key),
            )
        };
        Box::new(logger)
    }
}

impl Logger for RejectJoinEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |reject_join_event: &RejectJoinEvent| {
            log::info!(
                "{}, {}, {}, {:?}",
                REJECT_JOIN,
                secs_since_unix_epoch(reject_join_event.timestamp),
                first_seven_base64_chars(&reject_join_event.candidate.public_key),
                reject_join_event.reason,
            )
        };
        Box::new(logger)
    }
}

impl Logger for RecordParticipantEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |record_participant_event: &RecordParticipantEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                RECORD_PARTICIPANT,
                secs_since_unix_epoch(record_participant_event.timestamp),
                record_participant_event.origin,
                record_participant_event.participant.seat,
                first_seven_base64_chars(&record_participant_event.participant.public_key),
            )
        };
        Box::new(logger)
    }
}

impl Logger for RejectAnnouncementEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |reject_announcement_event: &RejectAnnouncementEvent| {
            log::info!(
                "{}, {}, {}, {}, {}, {:?}",
                REJECT_ANNOUNCEMENT,
                secs_since_unix_epoch(reject_announcement_event.timestamp),
                reject_announcement_event.origin,
                reject_announcement_event.participant.seat,
                first_seven_base64_chars(&reject_announcement_event.participant.public_key),
                reject_announcement_event.reason,
            )
        };
        Box::new(logger)
    }
}

impl Logger for StartTickingEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |start_ticking_event: &StartTickingEvent| {
            log::info!(
                "{}, {}, {}",
                START_TICKING,
                secs_since_unix_epoch(start_ticking_event.timestamp),
                start_ticking_event.seat,
            )
        };
        Box::new(logger)
    }
}

impl Logger for ProduceHeartbeatEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |produce_heartbeat_event: &ProduceHeartbeatEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                PRODUCE_HEARTBEAT,
                secs_since_unix_epoch(produce_heartbeat_event.timestamp),
                produce_heartbeat_event.round,
                produce_heartbeat_event.heartbeat.id,
                produce_heartbeat_event.heartbeat.pending_records.len(),
            )
        };
        Box::new(logger)
    }
}

impl Logger for SignHeartbeatsEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |sign_heartbeats_event: &SignHeartbeatsEvent| {
            log::info!(
                "{}, {}, {}, {}",
                SIGN_HEARTBEATS,
                secs_since_unix_epoch(sign_heartbeats_event.timestamp),
                sign_heartbeats_event.round,
                sign_heartbeats_event.heartbeat_list.signatures.len(),
            )
        };
        Box::new(logger)
    }
}

impl Logger for ProposeBlockEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |propose_block_event: &ProposeBlockEvent| {
            log::info!(
                "{}, {}, {}, {}",
                PROPOSE_BLOCK,
                secs_since_unix_epoch(propose_block_event.timestamp),
                propose_block_event.block.round,
                propose_block_event.block.heartbeats.len(),
            )
        };
        Box::new(logger)
    }
}

impl Logger for ReceiveHeartbeatEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |receive_heartbeat_event: &ReceiveHeartbeatEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                RECEIVE_HEARTBEAT,
                secs_since_unix_epoch(receive_heartbeat_event.timestamp),
                receive_heartbeat_event.origin,
                first_seven_base64_chars(&receive_heartbeat_event.heartbeat.host),
                receive_heartbeat_event.heartbeat.id,
            )
        };
        Box::new(logger)
    }
}

impl Logger for ReceiveHeartbeatListEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |receive_heartbeat_list_event: &ReceiveHeartbeatListEvent| {
            log::info!(
                "{}, {}, {}, {}, {}, {}",
                RECEIVE_HEARTBEAT_LIST,
                secs_since_unix_epoch(receive_heartbeat_list_event.timestamp),
                receive_heartbeat_list_event.origin,
                first_seven_base64_chars(&receive_heartbeat_list_event.host),
                receive_heartbeat_list_event.accepted_signatures,
                receive_heartbeat_list_event.rejected_signatures,
            )
        };
        Box::new(logger)
    }
}

impl Logger for ReceiveBlockEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |receive_block_event: &ReceiveBlockEvent| {
            log::info!(
                "{}, {}, {}, {}, {}, {}",
                RECEIVE_BLOCK,
                secs_since_unix_epoch(receive_block_event.timestamp),
                receive_block_event.origin,
                first_seven_base64_chars(&receive_block_event.producer),
                receive_block_event.accepted_signatures,
                receive_block_event.rejected_signatures,
            )
        };
        Box::new(logger)
    }
}

impl Logger for DropMessageEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |drop_message_event: &DropMessageEvent| {
            log::info!(
                "{}, {}, {}, {:?}, {}",
                DROP_MESSAGE,
                secs_since_unix_epoch(drop_message_event.timestamp),
                drop_message_event.origin,
                drop_message_event.kind,
                drop_message_event.phase.name(),
            )
        };
        Box::new(logger)
    }
}

impl Logger for RejectHeartbeatEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |reject_heartbeat_event: &RejectHeartbeatEvent| {
            log::info!(
                "{}, {}, {}, {}",
                REJECT_HEARTBEAT,
                secs_since_unix_epoch(reject_heartbeat_event.timestamp),
                reject_heartbeat_event.heartbeat,
                first_seven_base64_chars(&reject_heartbeat_event.host),
            )
        };
        Box::new(logger)
    }
}

impl Logger for AcceptBlockEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |accept_block_event: &AcceptBlockEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                ACCEPT_BLOCK,
                secs_since_unix_epoch(accept_block_event.timestamp),
                accept_block_event.block.round,
                first_seven_base64_chars(&accept_block_event.block.producer),
                accept_block_event.block.heartbeats.len(),
            )
        };
        Box::new(logger)
    }
}

impl Logger for DiscardRoundEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |discard_round_event: &DiscardRoundEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                DISCARD_ROUND,
                secs_since_unix_epoch(discard_round_event.timestamp),
                discard_round_event.round,
                discard_round_event.surviving_heartbeats,
                discard_round_event.known_participants,
            )
        };
        Box::new(logger)
    }
}

impl Logger for SwitchPolicyEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |switch_policy_event: &SwitchPolicyEvent| {
            log::info!(
                "{}, {}, {}, {}",
                SWITCH_POLICY,
                secs_since_unix_epoch(switch_policy_event.timestamp),
                switch_policy_event.from.name(),
                switch_policy_event.to.name(),
            )
        };
        Box::new(logger)
    }
}

impl Logger for DieEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |die_event: &DieEvent| {
            log::info!(
                "{}, {}, {}",
                DIE,
                secs_since_unix_epoch(die_event.timestamp),
                die_event.round,
            )
        };
        Box::new(logger)
    }
}

// Get a more readable representation of a bytesequence by base64-encoding it and taking the first 7 characters.
fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

fn secs_since_unix_epoch(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|since_epoch| since_epoch.as_secs())
        .unwrap_or(0)
}
