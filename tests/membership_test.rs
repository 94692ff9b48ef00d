//! Tests of seat assignment and the per-seat commit-reveal state held by the membership registry.

mod common;

use common::node::signing_keys;
use quorum_rs::{
    membership::{MembershipError, MembershipRegistry, Recorded},
    types::{
        block::Block,
        crypto_primitives::{commitment, sentinel_commitment, Keypair},
        data_types::{Address, Entropy, RoundNumber, SeatIndex, SwarmId, Timestamp},
        heartbeat::Heartbeat,
        participant::{Participant, ParticipantDescriptor},
    },
};

fn descriptor(n: u8) -> ParticipantDescriptor {
    ParticipantDescriptor::new(Address::new(format!("10.0.0.{}:7000", n)), [n; 32])
}

#[test]
fn seats_are_assigned_injectively_test() {
    let registry = MembershipRegistry::new(3, descriptor(0));

    let seats: Vec<SeatIndex> = (0..3)
        .map(|n| registry.assign_seat(descriptor(n)).unwrap().seat)
        .collect();
    assert_eq!(seats, vec![SeatIndex::new(0), SeatIndex::new(1), SeatIndex::new(2)]);

    assert_eq!(registry.assign_seat(descriptor(3)), Err(MembershipError::QuorumFull));
    assert_eq!(registry.seated_count(), 3);
    for n in 0..3 {
        assert_eq!(registry.seat_of(&[n; 32]), Some(SeatIndex::new(n as u16)));
    }
}

#[test]
fn duplicate_join_is_reported_test() {
    let registry = MembershipRegistry::new(3, descriptor(0));
    registry.assign_seat(descriptor(1)).unwrap();
    registry.assign_seat(descriptor(2)).unwrap();

    assert_eq!(
        registry.assign_seat(descriptor(2)),
        Err(MembershipError::DuplicateJoin { seat: SeatIndex::new(1) })
    );
    assert_eq!(registry.seated_count(), 2);
}

#[test]
fn record_is_idempotent_test() {
    let registry = MembershipRegistry::new(3, descriptor(0));
    let participant = Participant::new(SeatIndex::new(2), descriptor(5));

    assert_eq!(registry.record(participant.clone()), Ok(Recorded::New));
    assert_eq!(registry.record(participant.clone()), Ok(Recorded::AlreadyFilled));

    // A different host announced into the filled seat does not replace its occupant.
    let usurper = Participant::new(SeatIndex::new(2), descriptor(6));
    assert_eq!(registry.record(usurper), Ok(Recorded::AlreadyFilled));
    assert_eq!(registry.lookup(SeatIndex::new(2)), Some(participant.clone()));

    let moved = Participant::new(SeatIndex::new(0), descriptor(5));
    assert_eq!(
        registry.record(moved),
        Err(MembershipError::DuplicateJoin { seat: SeatIndex::new(2) })
    );

    let out_of_range = Participant::new(SeatIndex::new(3), descriptor(7));
    assert_eq!(
        registry.record(out_of_range),
        Err(MembershipError::UnrecognizedSeat { seat: SeatIndex::new(3) })
    );
    assert_eq!(registry.seated_count(), 1);
}

#[test]
fn local_seat_is_learnt_from_record_test() {
    let registry = MembershipRegistry::new(3, descriptor(4));
    assert_eq!(registry.local_seat(), None);
    assert_eq!(registry.local_participant(), None);

    registry.record(Participant::new(SeatIndex::new(0), descriptor(1))).unwrap();
    assert_eq!(registry.local_seat(), None);

    let local = Participant::new(SeatIndex::new(1), descriptor(4));
    assert!(registry.is_self(&local));
    assert!(!registry.is_self(&Participant::new(SeatIndex::new(1), descriptor(1))));

    registry.record(local.clone()).unwrap();
    assert_eq!(registry.local_seat(), Some(SeatIndex::new(1)));
    assert_eq!(registry.local_participant(), Some(local));
    assert_eq!(
        registry.participants().iter().map(|participant| participant.seat).collect::<Vec<_>>(),
        vec![SeatIndex::new(0), SeatIndex::new(1)]
    );
}

#[test]
fn commitments_advance_with_accepted_blocks_test() {
    let swarm_id = SwarmId::new(3);
    let hosts: Vec<Keypair> = signing_keys(2).into_iter().map(Keypair::new).collect();
    let descriptors: Vec<ParticipantDescriptor> = hosts
        .iter()
        .enumerate()
        .map(|(n, host)| ParticipantDescriptor::new(Address::new(format!("10.0.1.{}:7000", n)), host.public_bytes()))
        .collect();
    let registry = MembershipRegistry::new(2, descriptors[0].clone());
    registry.assign_seat(descriptors[0].clone()).unwrap();
    registry.assign_seat(descriptors[1].clone()).unwrap();
    assert_eq!(registry.predecessor_commitment(&hosts[0].public_bytes()), Some(sentinel_commitment()));
    assert_eq!(registry.predecessor_commitment(&[9; 32]), None);

    let next_secret = Entropy::random();
    let heartbeat = Heartbeat::new(&hosts[0], swarm_id, commitment(&next_secret), Entropy::zero(), Vec::new());
    let block = Block::new(
        swarm_id,
        RoundNumber::new(1),
        SeatIndex::new(0),
        hosts[0].public_bytes(),
        vec![heartbeat],
        Default::default(),
        Timestamp::new(0),
    );
    registry.advance_commitments(&block);

    // The seat in the block must next reveal `next_secret`. The absent seat restarts its chain.
    assert_eq!(registry.predecessor_commitment(&hosts[0].public_bytes()), Some(commitment(&next_secret)));
    assert_eq!(registry.predecessor_commitment(&hosts[1].public_bytes()), Some(sentinel_commitment()));
}
