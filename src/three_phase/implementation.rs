/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The state machine thread.

use std::{
    collections::BTreeMap,
    sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError},
    thread::{self, JoinHandle},
    time::{Instant, SystemTime},
};

use crate::{
    events::*,
    ledger::Blockchain,
    membership::MembershipRegistry,
    networking::{
        network::Network,
        receiving::{ConsensusMessageReceiveError, ConsensusMessageStub},
        sending::SenderHandle,
    },
    policy::{EntropyChain, NetHandler, PolicyContext},
    types::{
        block::{Block, SignatureSet},
        crypto_primitives::Keypair,
        data_types::{Address, RoundNumber, SeatIndex, SwarmId, Timestamp},
        heartbeat::{Heartbeat, HeartbeatList},
    },
};

use super::{
    accumulator::RoundAccumulator,
    messages::ConsensusMessage,
    phase::Phase,
    schedule::RoundSchedule,
};

pub(crate) struct ThreePhaseConfiguration {
    pub(crate) swarm_id: SwarmId,
    pub(crate) keypair: Keypair,
    pub(crate) schedule: RoundSchedule,
}

/// Owner of all round-local state. Inbound consensus messages reach it only through its queue, and it
/// is the only thread that touches the [`RoundAccumulator`].
pub(crate) struct ThreePhase<N: Network> {
    config: ThreePhaseConfiguration,
    phase: Phase,
    round: RoundNumber,
    accumulator: RoundAccumulator,
    entropy: EntropyChain,
    membership: MembershipRegistry,
    ledger: Blockchain,
    receiver: ConsensusMessageStub,
    sender: SenderHandle<N>,
    activation: Receiver<SeatIndex>,
    shutdown_signal: Receiver<()>,
    event_publisher: Option<Sender<Event>>,
}

impl<N: Network + 'static> ThreePhase<N> {
    pub(crate) fn new(
        config: ThreePhaseConfiguration,
        membership: MembershipRegistry,
        ledger: Blockchain,
        receiver: ConsensusMessageStub,
        sender: SenderHandle<N>,
        activation: Receiver<SeatIndex>,
        shutdown_signal: Receiver<()>,
        event_publisher: Option<Sender<Event>>,
    ) -> Self {
        Self {
            config,
            phase: Phase::Heartbeat,
            round: RoundNumber::new(0),
            accumulator: RoundAccumulator::new(),
            entropy: EntropyChain::new(),
            membership,
            ledger,
            receiver,
            sender,
            activation,
            shutdown_signal,
            event_publisher,
        }
    }

    pub(crate) fn start(mut self) -> JoinHandle<()> {
        thread::spawn(move || {
            if self.wait_for_seat() {
                self.execute();
            }
        })
    }

    /// Block until the bootstrap server reports that the local host has a seat. Returns false if the
    /// node shut down first.
    fn wait_for_seat(&mut self) -> bool {
        let poll_interval = self.config.schedule.phase_interval();
        loop {
            match self.shutdown_signal.try_recv() {
                Ok(()) => return false,
                Err(TryRecvError::Empty) => (),
                Err(TryRecvError::Disconnected) => {
                    panic!("Three-phase thread disconnected from main thread")
                }
            }

            match self.activation.recv_timeout(poll_interval) {
                Ok(_) => return true,
                Err(RecvTimeoutError::Timeout) => {
                    self.receiver.discard_pending();
                }
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    fn execute(&mut self) {
        let schedule = self.config.schedule;
        self.round = schedule.next_round_after(Timestamp::now());
        self.phase = Phase::Heartbeat;
        let mut fire_at = schedule.instant_of(schedule.round_start(self.round));

        loop {
            self.process_messages_until(fire_at);

            // The phase timer fired.
            match self.shutdown_signal.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => self.phase = Phase::Dead,
                Err(TryRecvError::Empty) => (),
            }

            match self.phase {
                Phase::Heartbeat => self.on_heartbeat_timer(),
                Phase::HeartbeatSigning => self.on_signing_timer(),
                Phase::BlockGeneration => self.on_block_generation_timer(),
                Phase::BlockDecision => self.on_block_decision_timer(),
                Phase::Dead => {
                    Event::publish(
                        &self.event_publisher,
                        Event::Die(DieEvent {
                            timestamp: SystemTime::now(),
                            round: self.round,
                        }),
                    );
                    return;
                }
            }

            self.phase = self.phase.next();
            fire_at += schedule.phase_interval();
        }
    }

    fn process_messages_until(&mut self, deadline: Instant) {
        loop {
            match self.receiver.recv(self.config.swarm_id, deadline) {
                Ok((origin, msg)) => self.on_receive_msg(origin, msg),
                Err(ConsensusMessageReceiveError::Timeout) => return,
                Err(ConsensusMessageReceiveError::Disconnected) => {
                    thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    return;
                }
            }
        }
    }

    fn policy_context(&self) -> PolicyContext<'_> {
        PolicyContext {
            swarm_id: self.config.swarm_id,
            keypair: &self.config.keypair,
            membership: &self.membership,
            ledger: &self.ledger,
        }
    }

    fn on_receive_msg(&mut self, origin: Address, msg: ConsensusMessage) {
        if !self.phase.admits(msg.kind()) {
            self.drop_message(origin, &msg);
            return;
        }

        match msg {
            ConsensusMessage::Heartbeat(heartbeat) => self.on_receive_heartbeat(origin, heartbeat),
            ConsensusMessage::HeartbeatList(list) => self.on_receive_heartbeat_list(origin, list),
            ConsensusMessage::Block(block) => self.on_receive_block(origin, block),
        }
    }

    fn drop_message(&self, origin: Address, msg: &ConsensusMessage) {
        Event::publish(
            &self.event_publisher,
            Event::DropMessage(DropMessageEvent {
                timestamp: SystemTime::now(),
                origin,
                kind: msg.kind(),
                phase: self.phase,
            }),
        );
    }

    fn on_receive_heartbeat(&mut self, origin: Address, heartbeat: Heartbeat) {
        if !self.membership.is_seated(&heartbeat.host) || !heartbeat.is_authentic() {
            self.drop_message(origin, &ConsensusMessage::Heartbeat(heartbeat));
            return;
        }

        if self.accumulator.insert_heartbeat(heartbeat.clone()) {
            Event::publish(
                &self.event_publisher,
                Event::ReceiveHeartbeat(ReceiveHeartbeatEvent {
                    timestamp: SystemTime::now(),
                    origin,
                    heartbeat,
                }),
            );
        }
    }

    fn on_receive_heartbeat_list(&mut self, origin: Address, list: HeartbeatList) {
        let policy = self.ledger.current_policy();
        let ctx = PolicyContext {
            swarm_id: self.config.swarm_id,
            keypair: &self.config.keypair,
            membership: &self.membership,
            ledger: &self.ledger,
        };
        let swarm_id = self.config.swarm_id;
        let outcome = self.accumulator.merge_heartbeat_list(&list, |heartbeat, signer, signature| {
            heartbeat.swarm_id == swarm_id
                && ctx.membership.is_seated(&heartbeat.host)
                && heartbeat.is_authentic()
                && policy.validate_signature(&ctx, heartbeat, signer, signature)
        });

        Event::publish(
            &self.event_publisher,
            Event::ReceiveHeartbeatList(ReceiveHeartbeatListEvent {
                timestamp: SystemTime::now(),
                origin,
                host: list.host,
                accepted_signatures: outcome.accepted,
                rejected_signatures: outcome.rejected,
            }),
        );
    }

    fn on_receive_block(&mut self, origin: Address, block: Block) {
        let policy = self.ledger.current_policy();
        let ctx = PolicyContext {
            swarm_id: self.config.swarm_id,
            keypair: &self.config.keypair,
            membership: &self.membership,
            ledger: &self.ledger,
        };
        let swarm_id = self.config.swarm_id;
        let outcome = self.accumulator.merge_block(&block, |heartbeat, signer, signature| {
            heartbeat.swarm_id == swarm_id
                && ctx.membership.is_seated(&heartbeat.host)
                && heartbeat.is_authentic()
                && policy.validate_signature(&ctx, heartbeat, signer, signature)
        });

        Event::publish(
            &self.event_publisher,
            Event::ReceiveBlock(ReceiveBlockEvent {
                timestamp: SystemTime::now(),
                origin,
                producer: block.producer,
                accepted_signatures: outcome.accepted,
                rejected_signatures: outcome.rejected,
            }),
        );
    }

    /// Phase 1: produce, remember, and broadcast the local heartbeat.
    fn on_heartbeat_timer(&mut self) {
        let policy = self.ledger.current_policy();
        let heartbeat = {
            let ctx = PolicyContext {
                swarm_id: self.config.swarm_id,
                keypair: &self.config.keypair,
                membership: &self.membership,
                ledger: &self.ledger,
            };
            policy.produce_heartbeat(&ctx, &mut self.entropy)
        };

        self.accumulator.insert_heartbeat(heartbeat.clone());
        self.sender.broadcast(heartbeat.clone());

        Event::publish(
            &self.event_publisher,
            Event::ProduceHeartbeat(ProduceHeartbeatEvent {
                timestamp: SystemTime::now(),
                round: self.round,
                heartbeat,
            }),
        );
    }

    /// Phase 2: sign every heartbeat the policy accepts, then broadcast them with the signatures.
    fn on_signing_timer(&mut self) {
        let policy = self.ledger.current_policy();
        let local_host = self.config.keypair.public_bytes();

        let mut signatures = BTreeMap::new();
        for heartbeat in self.accumulator.heartbeats().values() {
            let ctx = self.policy_context();
            if policy.validate_heartbeat(&ctx, heartbeat) {
                signatures.insert(heartbeat.id, policy.sign_heartbeat(&ctx, heartbeat));
            } else {
                Event::publish(
                    &self.event_publisher,
                    Event::RejectHeartbeat(RejectHeartbeatEvent {
                        timestamp: SystemTime::now(),
                        heartbeat: heartbeat.id,
                        host: heartbeat.host,
                    }),
                );
            }
        }

        for (id, signature) in &signatures {
            self.accumulator.add_signature(*id, local_host, *signature);
        }

        let heartbeats = self
            .accumulator
            .heartbeats()
            .values()
            .filter(|heartbeat| signatures.contains_key(&heartbeat.id))
            .cloned()
            .collect();
        let heartbeat_list = HeartbeatList::new(self.config.swarm_id, local_host, heartbeats, signatures);
        self.sender.broadcast(heartbeat_list.clone());

        Event::publish(
            &self.event_publisher,
            Event::SignHeartbeats(SignHeartbeatsEvent {
                timestamp: SystemTime::now(),
                round: self.round,
                heartbeat_list,
            }),
        );
    }

    /// Phase 3: broadcast a best-effort candidate built from the heartbeats that are already
    /// well-signed.
    fn on_block_generation_timer(&mut self) {
        let (heartbeats, signatures) = self.accumulator.candidate(self.membership.seated_count());
        let candidate = self.block_from(heartbeats, signatures);
        self.sender.broadcast(candidate.clone());

        Event::publish(
            &self.event_publisher,
            Event::ProposeBlock(ProposeBlockEvent {
                timestamp: SystemTime::now(),
                block: candidate,
            }),
        );
    }

    /// Phase 4: decide the round, then reset for the next one.
    fn on_block_decision_timer(&mut self) {
        let known = self.membership.seated_count();
        match self.accumulator.decide(known) {
            Some((heartbeats, signatures)) => {
                let block = self.block_from(heartbeats, signatures);
                let policy = self.ledger.current_policy();
                self.entropy
                    .on_block_accepted(block.heartbeat_of(&self.config.keypair.public_bytes()));
                let switched_to = policy.on_block_accepted(&self.policy_context(), block.clone());

                Event::publish(
                    &self.event_publisher,
                    Event::AcceptBlock(AcceptBlockEvent {
                        timestamp: SystemTime::now(),
                        block,
                    }),
                );
                if let Some(to) = switched_to {
                    Event::publish(
                        &self.event_publisher,
                        Event::SwitchPolicy(SwitchPolicyEvent {
                            timestamp: SystemTime::now(),
                            from: policy,
                            to,
                        }),
                    );
                }
            }
            None => {
                // No commitment moves, here or at any peer, so the next reveal is still valid.
                let (surviving, _) = self.accumulator.candidate(known);
                Event::publish(
                    &self.event_publisher,
                    Event::DiscardRound(DiscardRoundEvent {
                        timestamp: SystemTime::now(),
                        round: self.round,
                        surviving_heartbeats: surviving.len(),
                        known_participants: known,
                    }),
                );
            }
        }

        self.accumulator.clear();
        self.round += 1;
    }

    fn block_from(&self, heartbeats: Vec<Heartbeat>, signatures: SignatureSet) -> Block {
        let schedule = self.config.schedule;
        let producer_seat = self.membership.local_seat().unwrap_or(SeatIndex::new(0));
        Block::new(
            self.config.swarm_id,
            self.round,
            producer_seat,
            self.config.keypair.public_bytes(),
            heartbeats,
            signatures,
            schedule.round_start(RoundNumber::new(self.round.int() + 1)),
        )
    }
}
