//! Tests of a running node's reactions outside the happy path: stopping on request, and refusing
//! seat announcements it cannot record.

mod common;

use std::{thread, time::Duration};

use common::{
    logging::setup_logger,
    network::mock_network,
    node::{signing_keys, wait_until, TestNode},
};
use log::LevelFilter;
use quorum_rs::{
    bootstrap::messages::SeatAnnouncement,
    membership::MembershipError,
    networking::{messages::Message, network::Network},
    three_phase::schedule::RoundSchedule,
    types::{
        data_types::{Address, SeatIndex},
        participant::{Participant, ParticipantDescriptor},
    },
};

const PHASE_INTERVAL: Duration = Duration::from_millis(100);

#[test]
fn die_stops_heartbeats_test() {
    setup_logger(LevelFilter::Info);
    let address = Address::new("127.0.0.1:7100");
    let network = mock_network([address.clone()].into_iter()).remove(0);
    let key = signing_keys(1).remove(0);
    let node = TestNode::new(key, network, address.clone(), address, 1, PHASE_INTERVAL);

    // A quorum of one runs rounds on its own once it has seated itself.
    let produced = node.produced_heartbeats.recv_timeout(Duration::from_secs(10));
    assert!(produced.is_ok());

    node.die();
    // The state machine stops at its next phase timer fire.
    let died = node.died.recv_timeout(PHASE_INTERVAL * 10);
    assert!(died.is_ok());

    // Events reach handlers in the order they were published, so anything published before the
    // node died has been delivered by now.
    node.produced_heartbeats.try_iter().for_each(drop);
    thread::sleep(RoundSchedule::new(PHASE_INTERVAL).round_length() * 2);
    assert!(node.produced_heartbeats.try_recv().is_err());
}

#[test]
fn unrecordable_announcements_are_reported_test() {
    setup_logger(LevelFilter::Info);
    let address = Address::new("127.0.0.1:7200");
    let outsider_address = Address::new("127.0.0.1:7201");
    let mut networks = mock_network([address.clone(), outsider_address.clone()].into_iter());
    let mut outsider = networks.remove(1);
    let network = networks.remove(0);

    let key = signing_keys(1).remove(0);
    let node_key = key.verifying_key().to_bytes();
    let node = TestNode::new(key, network, address.clone(), address.clone(), 2, PHASE_INTERVAL);
    assert!(wait_until(Duration::from_secs(10), || node.membership().local_seat().is_some()));

    let announce = |participant: Participant| -> Message {
        SeatAnnouncement {
            swarm_id: common::node::SWARM_ID,
            participant,
        }
        .into()
    };
    let outsider_descriptor = ParticipantDescriptor::new(outsider_address, [9; 32]);

    // A seat outside the quorum.
    outsider.send(address.clone(), announce(Participant::new(SeatIndex::new(5), outsider_descriptor)));
    assert_eq!(
        node.rejected_announcements.recv_timeout(Duration::from_secs(5)),
        Ok(MembershipError::UnrecognizedSeat { seat: SeatIndex::new(5) })
    );

    // The node itself, announced into a second seat.
    let impostor = ParticipantDescriptor::new(Address::new("127.0.0.1:7202"), node_key);
    outsider.send(address, announce(Participant::new(SeatIndex::new(1), impostor)));
    assert_eq!(
        node.rejected_announcements.recv_timeout(Duration::from_secs(5)),
        Ok(MembershipError::DuplicateJoin { seat: SeatIndex::new(0) })
    );

    // Neither announcement changed the seat table.
    assert_eq!(node.membership().seated_count(), 1);
}
