//! Tests of the pieces the three-phase state machine is built from: the round accumulator and its
//! decision rule, policy validation of the commit-reveal chain, phase admission, and the wire format.

mod common;

use std::collections::BTreeMap;

use common::node::signing_keys;
use quorum_rs::{
    ledger::{Blockchain, DEFAULT_HISTORY_CAPACITY},
    membership::MembershipRegistry,
    networking::messages::Message,
    policy::{EntropyChain, InformedPolicy, NetHandler, Policy, PolicyContext, SteadyPolicy},
    three_phase::{
        accumulator::{exceeds_half, RoundAccumulator},
        messages::{ConsensusMessage, ConsensusMessageKind},
        phase::Phase,
    },
    types::{
        block::Block,
        crypto_primitives::{commitment, Keypair},
        data_types::{Address, Entropy, RoundNumber, SeatIndex, SwarmId, Timestamp},
        heartbeat::{Heartbeat, HeartbeatList, PendingRecord},
        participant::ParticipantDescriptor,
    },
};

const SWARM_ID: SwarmId = SwarmId::new(11);

/// A quorum of `size` keypairs whose registry, owned by the first keypair, has every seat filled.
fn seated_quorum(size: usize) -> (Vec<Keypair>, MembershipRegistry) {
    let keypairs: Vec<Keypair> = signing_keys(size).into_iter().map(Keypair::new).collect();
    let descriptors: Vec<ParticipantDescriptor> = keypairs
        .iter()
        .enumerate()
        .map(|(n, keypair)| ParticipantDescriptor::new(Address::new(format!("node-{}", n)), keypair.public_bytes()))
        .collect();
    let registry = MembershipRegistry::new(size as u16, descriptors[0].clone());
    for descriptor in descriptors {
        registry.assign_seat(descriptor).unwrap();
    }
    (keypairs, registry)
}

fn heartbeat_of(keypair: &Keypair) -> Heartbeat {
    Heartbeat::new(
        keypair,
        SWARM_ID,
        commitment(&Entropy::random()),
        Entropy::zero(),
        Vec::new(),
    )
}

/// Have the first `signers` keypairs sign every heartbeat in `accumulator`.
fn sign_all(accumulator: &mut RoundAccumulator, heartbeats: &[Heartbeat], keypairs: &[Keypair], signers: usize) {
    for heartbeat in heartbeats {
        accumulator.insert_heartbeat(heartbeat.clone());
        for keypair in &keypairs[..signers] {
            let signature = keypair.sign(&heartbeat.signing_bytes());
            assert!(accumulator.add_signature(heartbeat.id, keypair.public_bytes(), signature));
        }
    }
}

#[test]
fn threshold_is_strict_majority_test() {
    for (known, needed) in [(1, 1), (2, 2), (3, 2), (4, 3), (5, 3)] {
        assert!(exceeds_half(needed, known), "{} of {}", needed, known);
        assert!(!exceeds_half(needed - 1, known), "{} of {}", needed - 1, known);
    }
}

#[test]
fn decide_requires_majority_of_heartbeats_and_signatures_test() {
    for (size, majority) in [(1, 1), (2, 2), (4, 3), (5, 3)] {
        let (keypairs, _) = seated_quorum(size);
        let heartbeats: Vec<Heartbeat> = keypairs.iter().map(heartbeat_of).collect();

        // Every heartbeat, one signature short of a majority.
        let mut accumulator = RoundAccumulator::new();
        sign_all(&mut accumulator, &heartbeats, &keypairs, majority - 1);
        assert_eq!(accumulator.decide(size), None, "size {}", size);

        // A majority of heartbeats, each with a majority of signatures.
        let mut accumulator = RoundAccumulator::new();
        sign_all(&mut accumulator, &heartbeats[..majority], &keypairs, majority);
        let (accepted, signatures) = accumulator.decide(size).unwrap();
        assert_eq!(accepted.len(), majority, "size {}", size);
        assert_eq!(signatures.len(), majority);

        // One heartbeat fewer is not enough, however well it is signed.
        let mut accumulator = RoundAccumulator::new();
        sign_all(&mut accumulator, &heartbeats[..majority - 1], &keypairs, size);
        assert_eq!(accumulator.decide(size), None, "size {}", size);
    }
}

#[test]
fn candidate_keeps_best_signed_heartbeat_per_host_test() {
    let (keypairs, _) = seated_quorum(3);
    let first = heartbeat_of(&keypairs[0]);
    let second = heartbeat_of(&keypairs[0]);

    let mut accumulator = RoundAccumulator::new();
    sign_all(&mut accumulator, &[first.clone()], &keypairs, 2);
    sign_all(&mut accumulator, &[second.clone()], &keypairs, 3);

    let (heartbeats, signatures) = accumulator.candidate(3);
    assert_eq!(heartbeats, vec![second.clone()]);
    assert_eq!(signatures.get(&second.id).map(BTreeMap::len), Some(3));
    assert!(!signatures.contains_key(&first.id));
}

#[test]
fn heartbeat_list_merge_is_idempotent_test() {
    let (keypairs, registry) = seated_quorum(3);
    let ledger = Blockchain::new(SWARM_ID, DEFAULT_HISTORY_CAPACITY);
    let ctx = PolicyContext {
        swarm_id: SWARM_ID,
        keypair: &keypairs[0],
        membership: &registry,
        ledger: &ledger,
    };
    let policy = Policy::informed();

    let heartbeats: Vec<Heartbeat> = keypairs.iter().map(heartbeat_of).collect();
    let signer = &keypairs[1];
    let list = HeartbeatList::new(
        SWARM_ID,
        signer.public_bytes(),
        heartbeats.clone(),
        heartbeats
            .iter()
            .map(|heartbeat| (heartbeat.id, signer.sign(&heartbeat.signing_bytes())))
            .collect(),
    );

    let mut accumulator = RoundAccumulator::new();
    let outcome = accumulator.merge_heartbeat_list(&list, |heartbeat, signer, signature| {
        policy.validate_signature(&ctx, heartbeat, signer, signature)
    });
    assert_eq!(outcome.accepted, 3);
    assert_eq!(outcome.rejected, 0);
    let once = accumulator.clone();

    accumulator.merge_heartbeat_list(&list, |heartbeat, signer, signature| {
        policy.validate_signature(&ctx, heartbeat, signer, signature)
    });
    assert_eq!(accumulator, once);
    for heartbeat in &heartbeats {
        assert_eq!(accumulator.signature_count(&heartbeat.id), 1);
    }
}

#[test]
fn forged_signatures_are_rejected_on_merge_test() {
    let (keypairs, registry) = seated_quorum(3);
    let (outsiders, _) = seated_quorum(1);
    let ledger = Blockchain::new(SWARM_ID, DEFAULT_HISTORY_CAPACITY);
    let ctx = PolicyContext {
        swarm_id: SWARM_ID,
        keypair: &keypairs[0],
        membership: &registry,
        ledger: &ledger,
    };
    let policy = Policy::steady();
    let heartbeat = heartbeat_of(&keypairs[1]);

    // Signed by a host that holds no seat.
    let mut signatures = BTreeMap::new();
    signatures.insert(outsiders[0].public_bytes(), outsiders[0].sign(&heartbeat.signing_bytes()));
    // Claimed by a seated host, but made over different bytes.
    signatures.insert(keypairs[2].public_bytes(), keypairs[2].sign(b"something else"));

    let mut all_signatures = BTreeMap::new();
    all_signatures.insert(heartbeat.id, signatures);
    let block = Block::new(
        SWARM_ID,
        RoundNumber::new(1),
        SeatIndex::new(1),
        keypairs[1].public_bytes(),
        vec![heartbeat.clone()],
        all_signatures,
        Timestamp::new(0),
    );

    let mut accumulator = RoundAccumulator::new();
    let outcome = accumulator.merge_block(&block, |heartbeat, signer, signature| {
        policy.validate_signature(&ctx, heartbeat, signer, signature)
    });
    assert_eq!(outcome.accepted, 0);
    assert_eq!(outcome.rejected, 2);
    assert_eq!(accumulator.signature_count(&heartbeat.id), 0);
}

#[test]
fn steady_policy_checks_commit_reveal_chain_test() {
    let (keypairs, registry) = seated_quorum(2);
    let ledger = Blockchain::new(SWARM_ID, DEFAULT_HISTORY_CAPACITY);
    let ctx = PolicyContext {
        swarm_id: SWARM_ID,
        keypair: &keypairs[0],
        membership: &registry,
        ledger: &ledger,
    };
    let steady = SteadyPolicy;
    let informed = InformedPolicy;

    // Round N: the peer reveals zero against the sentinel and commits to its next secret.
    let mut chain = EntropyChain::new();
    let peer = PolicyContext {
        swarm_id: SWARM_ID,
        keypair: &keypairs[1],
        membership: &registry,
        ledger: &ledger,
    };
    let first = informed.produce_heartbeat(&peer, &mut chain);
    assert_eq!(first.entropy_stage2, Entropy::zero());
    assert!(steady.validate_heartbeat(&ctx, &first));

    let block = Block::new(
        SWARM_ID,
        RoundNumber::new(1),
        SeatIndex::new(1),
        keypairs[1].public_bytes(),
        vec![first.clone()],
        BTreeMap::new(),
        Timestamp::new(0),
    );
    registry.advance_commitments(&block);
    chain.on_block_accepted(block.heartbeat_of(&keypairs[1].public_bytes()));

    // Round N+1: a reveal of the committed secret is endorsed, a fresh restart is not.
    let second = steady.produce_heartbeat(&peer, &mut chain);
    assert_eq!(commitment(&second.entropy_stage2), first.entropy_stage1);
    assert!(steady.validate_heartbeat(&ctx, &second));

    let restarted = informed.produce_heartbeat(&peer, &mut EntropyChain::new());
    assert!(!steady.validate_heartbeat(&ctx, &restarted));
    assert!(informed.validate_heartbeat(&ctx, &restarted));

    // Heartbeats for another swarm are never endorsed.
    let mut foreign = second.clone();
    foreign.swarm_id = SwarmId::new(12);
    assert!(!steady.validate_heartbeat(&ctx, &foreign));
    assert!(!informed.validate_heartbeat(&ctx, &foreign));
}

#[test]
fn chain_survives_rounds_without_a_block_test() {
    let (keypairs, registry) = seated_quorum(3);
    let ledger = Blockchain::new(SWARM_ID, DEFAULT_HISTORY_CAPACITY);
    let contexts: Vec<PolicyContext> = keypairs
        .iter()
        .map(|keypair| PolicyContext {
            swarm_id: SWARM_ID,
            keypair,
            membership: &registry,
            ledger: &ledger,
        })
        .collect();
    let mut chains: Vec<EntropyChain> = keypairs.iter().map(|_| EntropyChain::new()).collect();
    let steady = SteadyPolicy;

    let produce_round = |chains: &mut Vec<EntropyChain>| -> Vec<Heartbeat> {
        contexts
            .iter()
            .zip(chains.iter_mut())
            .map(|(ctx, chain)| steady.produce_heartbeat(ctx, chain))
            .collect()
    };
    let all_validate = |heartbeats: &[Heartbeat]| {
        contexts.iter().all(|ctx| {
            heartbeats
                .iter()
                .all(|heartbeat| steady.validate_heartbeat(ctx, heartbeat))
        })
    };
    let accept = |heartbeats: Vec<Heartbeat>, chains: &mut Vec<EntropyChain>| {
        let block = Block::new(
            SWARM_ID,
            RoundNumber::new(1),
            SeatIndex::new(0),
            keypairs[0].public_bytes(),
            heartbeats,
            BTreeMap::new(),
            Timestamp::new(0),
        );
        registry.advance_commitments(&block);
        for (keypair, chain) in keypairs.iter().zip(chains.iter_mut()) {
            chain.on_block_accepted(block.heartbeat_of(&keypair.public_bytes()));
        }
    };

    // A round that becomes a block.
    let first = produce_round(&mut chains);
    assert!(all_validate(&first));
    accept(first, &mut chains);

    // Two rounds that end without a block. Every host keeps revealing the same secret.
    let quiet = produce_round(&mut chains);
    assert!(all_validate(&quiet));
    let still_quiet = produce_round(&mut chains);
    assert!(all_validate(&still_quiet));
    assert_eq!(quiet[0].entropy_stage2, still_quiet[0].entropy_stage2);

    // The next block continues the chain from the last round's commitments.
    accept(still_quiet, &mut chains);
    let after = produce_round(&mut chains);
    assert!(all_validate(&after));

    // A host left out of a block restarts from zero, which is what its peers now expect.
    accept(after[1..].to_vec(), &mut chains);
    let restarted = produce_round(&mut chains);
    assert_eq!(restarted[0].entropy_stage2, Entropy::zero());
    assert!(all_validate(&restarted));
}

#[test]
fn relayed_heartbeat_cannot_be_altered_test() {
    let (keypairs, registry) = seated_quorum(3);
    let ledger = Blockchain::new(SWARM_ID, DEFAULT_HISTORY_CAPACITY);
    let ctx = PolicyContext {
        swarm_id: SWARM_ID,
        keypair: &keypairs[0],
        membership: &registry,
        ledger: &ledger,
    };
    let genuine = heartbeat_of(&keypairs[1]);
    assert!(genuine.is_authentic());
    assert!(SteadyPolicy.validate_heartbeat(&ctx, &genuine));

    // Same reveal, different commitment: what a relaying peer would need to hijack the chain.
    let mut recommitted = genuine.clone();
    recommitted.entropy_stage1 = commitment(&Entropy::random());
    let mut padded = genuine.clone();
    padded.pending_records.push(PendingRecord::new(vec![1]));
    // Re-signed by someone other than the host it names.
    let mut resigned = recommitted.clone();
    resigned.host_signature = keypairs[2].sign(&recommitted.signing_bytes());

    for forged in [recommitted, padded, resigned] {
        assert!(!forged.is_authentic());
        assert!(!SteadyPolicy.validate_heartbeat(&ctx, &forged));
        assert!(!InformedPolicy.validate_heartbeat(&ctx, &forged));
    }
}

#[test]
fn policy_switches_with_local_activity_test() {
    let (keypairs, registry) = seated_quorum(2);
    let ledger = Blockchain::new(SWARM_ID, DEFAULT_HISTORY_CAPACITY);
    let ctx = PolicyContext {
        swarm_id: SWARM_ID,
        keypair: &keypairs[0],
        membership: &registry,
        ledger: &ledger,
    };
    let block_of = |heartbeats: Vec<Heartbeat>| {
        Block::new(
            SWARM_ID,
            RoundNumber::new(1),
            SeatIndex::new(1),
            keypairs[1].public_bytes(),
            heartbeats,
            BTreeMap::new(),
            Timestamp::new(0),
        )
    };

    let without_local = block_of(vec![heartbeat_of(&keypairs[1])]);
    assert_eq!(Policy::informed().on_block_accepted(&ctx, without_local.clone()), None);
    assert_eq!(ledger.current_policy(), Policy::informed());

    let with_local = block_of(vec![heartbeat_of(&keypairs[0]), heartbeat_of(&keypairs[1])]);
    assert_eq!(Policy::informed().on_block_accepted(&ctx, with_local.clone()), Some(Policy::steady()));
    assert_eq!(ledger.current_policy(), Policy::steady());

    assert_eq!(Policy::steady().on_block_accepted(&ctx, with_local), None);
    assert_eq!(Policy::steady().on_block_accepted(&ctx, without_local), Some(Policy::informed()));
    assert_eq!(ledger.current_policy(), Policy::informed());
    assert_eq!(ledger.block_count(), 4);
}

#[test]
fn produced_heartbeat_takes_pending_records_test() {
    let (keypairs, registry) = seated_quorum(1);
    let ledger = Blockchain::new(SWARM_ID, DEFAULT_HISTORY_CAPACITY);
    let ctx = PolicyContext {
        swarm_id: SWARM_ID,
        keypair: &keypairs[0],
        membership: &registry,
        ledger: &ledger,
    };
    ledger.add_pending_record(PendingRecord::new(vec![42]));

    let heartbeat = Policy::steady().produce_heartbeat(&ctx, &mut EntropyChain::new());
    assert_eq!(heartbeat.pending_records.len(), 1);
    assert_eq!(heartbeat.host, keypairs[0].public_bytes());
    assert!(ledger.pending_records().is_empty());
}

#[test]
fn phases_admit_messages_in_their_window_test() {
    let table = [
        (Phase::Heartbeat, [true, false, false]),
        (Phase::HeartbeatSigning, [true, true, false]),
        (Phase::BlockGeneration, [false, true, true]),
        (Phase::BlockDecision, [false, false, true]),
        (Phase::Dead, [false, false, false]),
    ];
    for (phase, admitted) in table {
        assert_eq!(phase.admits(ConsensusMessageKind::Heartbeat), admitted[0], "{} admits Heartbeat", phase.name());
        assert_eq!(phase.admits(ConsensusMessageKind::HeartbeatList), admitted[1], "{} admits HeartbeatList", phase.name());
        assert_eq!(phase.admits(ConsensusMessageKind::Block), admitted[2], "{} admits Block", phase.name());
    }

    assert_eq!(Phase::BlockDecision.next(), Phase::Heartbeat);
    assert_eq!(Phase::Dead.next(), Phase::Dead);
}

#[test]
fn messages_are_tagged_on_the_wire_test() {
    let (keypairs, _) = seated_quorum(1);
    let heartbeat = heartbeat_of(&keypairs[0]);
    let message: Message = heartbeat.clone().into();

    let decoded = Message::decode(&message.encode()).unwrap();
    match decoded {
        Message::ConsensusMessage(consensus) => {
            assert_eq!(consensus.kind(), ConsensusMessageKind::Heartbeat);
            assert_eq!(consensus.swarm_id(), SWARM_ID);
            assert_eq!(consensus, ConsensusMessage::Heartbeat(heartbeat));
        }
        Message::BootstrapMessage(_) => panic!("decoded into the wrong variant"),
    }

    assert!(Message::decode(&[0xff, 0x00]).is_err());
}
