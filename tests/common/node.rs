use std::{
    sync::mpsc::{self, Receiver},
    thread,
    time::{Duration, Instant},
};

use ed25519_dalek::SigningKey;
use quorum_rs::{
    events::{AcceptBlockEvent, DieEvent, ProduceHeartbeatEvent, RejectAnnouncementEvent},
    ledger::Blockchain,
    membership::{MembershipError, MembershipRegistry},
    node::{Configuration, Node, NodeSpec},
    types::{
        block::Block,
        data_types::{Address, RoundNumber, SwarmId},
    },
};
use rand_core::OsRng;

use super::network::NetworkStub;

pub(crate) const SWARM_ID: SwarmId = SwarmId::new(7);

/// A node under test, together with the events it reported.
pub(crate) struct TestNode {
    pub(crate) verifying_key: [u8; 32],
    pub(crate) accepted_blocks: Receiver<Block>,
    pub(crate) produced_heartbeats: Receiver<RoundNumber>,
    pub(crate) rejected_announcements: Receiver<MembershipError>,
    pub(crate) died: Receiver<RoundNumber>,
    node: Node,
}

impl TestNode {
    pub(crate) fn new(
        signing_key: SigningKey,
        network: NetworkStub,
        address: Address,
        bootstrap_address: Address,
        quorum_size: u16,
        phase_interval: Duration,
    ) -> TestNode {
        let verifying_key = signing_key.verifying_key().to_bytes();
        let configuration = Configuration::builder()
            .me(signing_key)
            .address(address)
            .swarm_id(SWARM_ID)
            .bootstrap_address(bootstrap_address)
            .quorum_size(quorum_size)
            .phase_interval(phase_interval)
            .log_events(true)
            .build();

        let (accepted_sender, accepted_blocks) = mpsc::channel();
        let (produced_sender, produced_heartbeats) = mpsc::channel();
        let (rejected_sender, rejected_announcements) = mpsc::channel();
        let (died_sender, died) = mpsc::channel();
        let node = NodeSpec::builder()
            .network(network)
            .configuration(configuration)
            .on_accept_block(move |event: &AcceptBlockEvent| {
                let _ = accepted_sender.send(event.block.clone());
            })
            .on_produce_heartbeat(move |event: &ProduceHeartbeatEvent| {
                let _ = produced_sender.send(event.round);
            })
            .on_reject_announcement(move |event: &RejectAnnouncementEvent| {
                let _ = rejected_sender.send(event.reason.clone());
            })
            .on_die(move |event: &DieEvent| {
                let _ = died_sender.send(event.round);
            })
            .build()
            .start();

        TestNode {
            verifying_key,
            accepted_blocks,
            produced_heartbeats,
            rejected_announcements,
            died,
            node,
        }
    }

    pub(crate) fn die(&self) {
        self.node.die()
    }

    pub(crate) fn membership(&self) -> &MembershipRegistry {
        self.node.membership()
    }

    pub(crate) fn ledger(&self) -> &Blockchain {
        self.node.ledger()
    }
}

pub(crate) fn signing_keys(count: usize) -> Vec<SigningKey> {
    let mut csprg = OsRng {};
    (0..count).map(|_| SigningKey::generate(&mut csprg)).collect()
}

/// Poll `condition` every 10 milliseconds until it holds or `timeout` elapses. Returns whether it held.
pub(crate) fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}
