/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Methods to build and run a node.
//!
//! A node is one host's participation in one quorum. It owns the host's view of membership, its
//! ledger, and the threads that run the bootstrap protocol and the three-phase state machine.
//!
//! The key components of this module are:
//! - The builder-pattern interface to construct a [specification of the node](NodeSpec) with:
//!   1. `NodeSpec::builder` to construct a `NodeSpecBuilder`,
//!   2. The setters of the `NodeSpecBuilder`, and
//!   3. The `NodeSpecBuilder::build` method to construct a [NodeSpec],
//! - The function to [start](NodeSpec::start) a [Node] given its specification,
//! - [The type](Node) which keeps the node alive.
//!
//! ## Starting a node
//!
//! ```ignore
//! let node =
//!     NodeSpec::builder()
//!     .network(network)
//!     .configuration(configuration)
//!     .on_accept_block(accept_block_handler)
//!     .build()
//!     .start();
//! ```
//!
//! Starting a node sends a join request to the configured bootstrap address. The state machine
//! begins with the first round boundary after the node learns its seat.
//!
//! ### Required setters
//!
//! - `.network(...)`
//! - `.configuration(...)`
//!
//! ### Optional setters
//!
//! The optional setters are for registering user-defined event handlers for events from [crate::events]:
//! - `.on_send_join_request(...)`
//! - `.on_assign_seat(...)`
//! - `.on_reject_join(...)`
//! - `.on_record_participant(...)`
//! - `.on_reject_announcement(...)`
//! - `.on_start_ticking(...)`
//! - `.on_produce_heartbeat(...)`
//! - `.on_sign_heartbeats(...)`
//! - `.on_propose_block(...)`
//! - `.on_receive_heartbeat(...)`
//! - `.on_receive_heartbeat_list(...)`
//! - `.on_receive_block(...)`
//! - `.on_drop_message(...)`
//! - `.on_reject_heartbeat(...)`
//! - `.on_accept_block(...)`
//! - `.on_discard_round(...)`
//! - `.on_switch_policy(...)`
//! - `.on_die(...)`
//!
//! The node's [configuration](Configuration) can also be defined using the builder pattern, for example:
//!
//! ```ignore
//! let configuration =
//!     Configuration::builder()
//!     .me(signing_key)
//!     .address(Address::new("10.0.0.1:7000"))
//!     .swarm_id(SwarmId::new(0))
//!     .bootstrap_address(Address::new("10.0.0.1:7000"))
//!     .quorum_size(3)
//!     .phase_interval(Duration::from_millis(500))
//!     .log_events(true)
//!     .build()
//! ```

use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use ed25519_dalek::SigningKey;
use typed_builder::TypedBuilder;

use crate::bootstrap::server::{join, BootstrapServer, BootstrapServerConfiguration};
use crate::event_bus::*;
use crate::events::*;
use crate::ledger::{Blockchain, DEFAULT_HISTORY_CAPACITY};
use crate::membership::MembershipRegistry;
use crate::networking::{
    network::Network,
    receiving::{start_polling, BootstrapMessageStub, ConsensusMessageStub},
    sending::SenderHandle,
};
use crate::three_phase::{
    implementation::{ThreePhase, ThreePhaseConfiguration},
    schedule::RoundSchedule,
};
use crate::types::{
    crypto_primitives::Keypair,
    data_types::{Address, SeatIndex, SwarmId},
    participant::ParticipantDescriptor,
};

/// Stores the user-defined parameters required to start a node.
///
/// ## Log Events
///
/// quorum_rs logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
/// printed onto a terminal or to a file, set up a [logging
/// implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
#[derive(TypedBuilder)]
#[builder(builder_method(doc =
    "
    Create a builder for building a [Configuration]. On the builder call the following methods to construct a valid [Configuration].

    Required:
    - `.me(...)`
    - `.address(...)`
    - `.swarm_id(...)`
    - `.bootstrap_address(...)`
    - `.quorum_size(...)`
    - `.phase_interval(...)`
    - `.log_events(...)`

    Optional:
    - `.history_capacity(...)`
"
))]
pub struct Configuration {
    #[builder(setter(doc = "Set the node's keypair, used to sign heartbeats. Required."))]
    pub me: SigningKey,
    #[builder(setter(doc = "Set the address at which the network provider reaches this node. Required."))]
    pub address: Address,
    #[builder(setter(doc = "Set the ID of the swarm this node participates in. Required."))]
    pub swarm_id: SwarmId,
    #[builder(setter(doc = "Set the address of the node that assigns seats. May be this node's own address. Required."))]
    pub bootstrap_address: Address,
    #[builder(setter(doc = "Set the number of seats in the quorum. Required."))]
    pub quorum_size: u16,
    #[builder(setter(doc = "Set the time between two phase timer fires. A round lasts four of these. Required."))]
    pub phase_interval: Duration,
    #[builder(default = DEFAULT_HISTORY_CAPACITY, setter(doc = "Set the number of recent blocks the ledger keeps. Optional, defaults to 5."))]
    pub history_capacity: usize,
    #[builder(setter(doc = "Enable logging? Required."))]
    pub log_events: bool,
}

/// Stores all necessary parameters and trait implementations required to run the [Node].
#[derive(TypedBuilder)]
#[builder(builder_method(doc =
    "
    Create a builder for building a [NodeSpec]. On the builder call the following methods to construct a valid [NodeSpec].

    Required:
    - `.network(...)`
    - `.configuration(...)`

    Optional:
    - `.on_send_join_request(...)`
    - `.on_assign_seat(...)`
    - `.on_reject_join(...)`
    - `.on_record_participant(...)`
    - `.on_reject_announcement(...)`
    - `.on_start_ticking(...)`
    - `.on_produce_heartbeat(...)`
    - `.on_sign_heartbeats(...)`
    - `.on_propose_block(...)`
    - `.on_receive_heartbeat(...)`
    - `.on_receive_heartbeat_list(...)`
    - `.on_receive_block(...)`
    - `.on_drop_message(...)`
    - `.on_reject_heartbeat(...)`
    - `.on_accept_block(...)`
    - `.on_discard_round(...)`
    - `.on_switch_policy(...)`
    - `.on_die(...)`
"
))]
pub struct NodeSpec<N: Network + 'static> {
    // Required parameters
    #[builder(setter(doc = "Set the implementation of networking. The argument must implement the [Network](crate::networking::network::Network) trait. Required."))]
    network: N,
    #[builder(setter(doc = "Set the [configuration](Configuration), which contains the necessary parameters to run a node. Required."))]
    configuration: Configuration,
    // Optional parameters
    #[builder(default, setter(transform = |handler: impl Fn(&SendJoinRequestEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<SendJoinRequestEvent>),
    doc = "Register a handler closure to be invoked after the node sends its join request to the bootstrap address. Optional."))]
    on_send_join_request: Option<HandlerPtr<SendJoinRequestEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&AssignSeatEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<AssignSeatEvent>),
    doc = "Register a handler closure to be invoked after the node, acting as bootstrap, assigns a seat to a candidate. Optional."))]
    on_assign_seat: Option<HandlerPtr<AssignSeatEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&RejectJoinEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<RejectJoinEvent>),
    doc = "Register a handler closure to be invoked after the node, acting as bootstrap, rejects a join request. Optional."))]
    on_reject_join: Option<HandlerPtr<RejectJoinEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&RecordParticipantEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<RecordParticipantEvent>),
    doc = "Register a handler closure to be invoked after the node records a newly announced participant. Optional."))]
    on_record_participant: Option<HandlerPtr<RecordParticipantEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&RejectAnnouncementEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<RejectAnnouncementEvent>),
    doc = "Register a handler closure to be invoked after the node fails to record an announced participant. Optional."))]
    on_reject_announcement: Option<HandlerPtr<RejectAnnouncementEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&StartTickingEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<StartTickingEvent>),
    doc = "Register a handler closure to be invoked after the node learns its own seat and starts running rounds. Optional."))]
    on_start_ticking: Option<HandlerPtr<StartTickingEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ProduceHeartbeatEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<ProduceHeartbeatEvent>),
    doc = "Register a handler closure to be invoked after the node broadcasts its heartbeat for a round. Optional."))]
    on_produce_heartbeat: Option<HandlerPtr<ProduceHeartbeatEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&SignHeartbeatsEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<SignHeartbeatsEvent>),
    doc = "Register a handler closure to be invoked after the node broadcasts its signed heartbeat list. Optional."))]
    on_sign_heartbeats: Option<HandlerPtr<SignHeartbeatsEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ProposeBlockEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<ProposeBlockEvent>),
    doc = "Register a handler closure to be invoked after the node broadcasts a candidate block. Optional."))]
    on_propose_block: Option<HandlerPtr<ProposeBlockEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ReceiveHeartbeatEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<ReceiveHeartbeatEvent>),
    doc = "Register a handler closure to be invoked after the node takes in a peer's heartbeat. Optional."))]
    on_receive_heartbeat: Option<HandlerPtr<ReceiveHeartbeatEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ReceiveHeartbeatListEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<ReceiveHeartbeatListEvent>),
    doc = "Register a handler closure to be invoked after the node merges a peer's heartbeat list. Optional."))]
    on_receive_heartbeat_list: Option<HandlerPtr<ReceiveHeartbeatListEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&ReceiveBlockEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<ReceiveBlockEvent>),
    doc = "Register a handler closure to be invoked after the node merges a peer's candidate block. Optional."))]
    on_receive_block: Option<HandlerPtr<ReceiveBlockEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&DropMessageEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<DropMessageEvent>),
    doc = "Register a handler closure to be invoked after the node drops a consensus message outside its admission window. Optional."))]
    on_drop_message: Option<HandlerPtr<DropMessageEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&RejectHeartbeatEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<RejectHeartbeatEvent>),
    doc = "Register a handler closure to be invoked after the node's policy refuses to sign a heartbeat. Optional."))]
    on_reject_heartbeat: Option<HandlerPtr<RejectHeartbeatEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&AcceptBlockEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<AcceptBlockEvent>),
    doc = "Register a handler closure to be invoked after the node accepts a block and appends it to its ledger. Optional."))]
    on_accept_block: Option<HandlerPtr<AcceptBlockEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&DiscardRoundEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<DiscardRoundEvent>),
    doc = "Register a handler closure to be invoked after a round ends without a block. Optional."))]
    on_discard_round: Option<HandlerPtr<DiscardRoundEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&SwitchPolicyEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<SwitchPolicyEvent>),
    doc = "Register a handler closure to be invoked after the node switches policy. Optional."))]
    on_switch_policy: Option<HandlerPtr<SwitchPolicyEvent>>,
    #[builder(default, setter(transform = |handler: impl Fn(&DieEvent) + Send + 'static| Some(Box::new(handler) as HandlerPtr<DieEvent>),
    doc = "Register a handler closure to be invoked after the node's state machine stops. Optional."))]
    on_die: Option<HandlerPtr<DieEvent>>,
}

impl<N: Network + 'static> NodeSpec<N> {
    /// Starts all threads and channels associated with running a node, joins the quorum, and returns
    /// the handles to them in a [Node] struct.
    pub fn start(self) -> Node {
        let configuration = self.configuration;
        let keypair = Keypair::new(configuration.me);
        let local = ParticipantDescriptor::new(configuration.address.clone(), keypair.public_bytes());
        let membership = MembershipRegistry::new(configuration.quorum_size, local.clone());
        let ledger = Blockchain::new(configuration.swarm_id, configuration.history_capacity);

        let (poller_shutdown, poller_shutdown_receiver) = mpsc::channel();
        let (poller, bootstrap_msgs, consensus_msgs) =
            start_polling(self.network.clone(), poller_shutdown_receiver);

        let event_handlers = EventHandlers::new(
            configuration.log_events,
            self.on_send_join_request,
            self.on_assign_seat,
            self.on_reject_join,
            self.on_record_participant,
            self.on_reject_announcement,
            self.on_start_ticking,
            self.on_produce_heartbeat,
            self.on_sign_heartbeats,
            self.on_propose_block,
            self.on_receive_heartbeat,
            self.on_receive_heartbeat_list,
            self.on_receive_block,
            self.on_drop_message,
            self.on_reject_heartbeat,
            self.on_accept_block,
            self.on_discard_round,
            self.on_switch_policy,
            self.on_die,
        );

        let (event_publisher, event_subscriber) =
            if !event_handlers.is_empty() {
                Some(mpsc::channel()).unzip()
            } else { (None, None) };

        let (activation, activation_receiver) = mpsc::channel::<SeatIndex>();

        let (bootstrap_server_shutdown, bootstrap_server_shutdown_receiver) = mpsc::channel();
        let bootstrap_server = BootstrapServer::new(
            BootstrapServerConfiguration {
                swarm_id: configuration.swarm_id,
                poll_interval: configuration.phase_interval,
            },
            membership.clone(),
            BootstrapMessageStub::new(bootstrap_msgs),
            self.network.clone(),
            activation,
            bootstrap_server_shutdown_receiver,
            event_publisher.clone(),
        );
        let bootstrap_server = bootstrap_server.start();

        let (three_phase_shutdown, three_phase_shutdown_receiver) = mpsc::channel();
        let three_phase = ThreePhase::new(
            ThreePhaseConfiguration {
                swarm_id: configuration.swarm_id,
                keypair,
                schedule: RoundSchedule::new(configuration.phase_interval),
            },
            membership.clone(),
            ledger.clone(),
            ConsensusMessageStub::new(consensus_msgs),
            SenderHandle::new(self.network.clone()),
            activation_receiver,
            three_phase_shutdown_receiver,
            event_publisher.clone(),
        );
        let three_phase = three_phase.start();

        join(
            &mut SenderHandle::new(self.network),
            configuration.swarm_id,
            configuration.bootstrap_address,
            local,
            &event_publisher,
        );

        let (event_bus_shutdown, event_bus) = match event_subscriber {
            Some(event_subscriber) => {
                let (event_bus_shutdown, event_bus_shutdown_receiver) = mpsc::channel();
                let event_bus = start_event_bus(event_handlers, event_subscriber, event_bus_shutdown_receiver);
                (Some(event_bus_shutdown), Some(event_bus))
            }
            None => (None, None),
        };

        Node {
            membership,
            ledger,
            poller: Some(poller),
            poller_shutdown,
            bootstrap_server: Some(bootstrap_server),
            bootstrap_server_shutdown,
            three_phase: Some(three_phase),
            three_phase_shutdown,
            event_bus,
            event_bus_shutdown,
        }
    }
}

/// A handle to the background threads of a node. When this value is dropped, all background threads
/// are gracefully shut down.
pub struct Node {
    membership: MembershipRegistry,
    ledger: Blockchain,
    poller: Option<JoinHandle<()>>,
    poller_shutdown: Sender<()>,
    bootstrap_server: Option<JoinHandle<()>>,
    bootstrap_server_shutdown: Sender<()>,
    three_phase: Option<JoinHandle<()>>,
    three_phase_shutdown: Sender<()>,
    event_bus: Option<JoinHandle<()>>,
    event_bus_shutdown: Option<Sender<()>>,
}

impl Node {
    /// The node's view of quorum membership.
    pub fn membership(&self) -> &MembershipRegistry {
        &self.membership
    }

    /// The node's ledger, shared with its state machine.
    pub fn ledger(&self) -> &Blockchain {
        &self.ledger
    }

    /// Ask the state machine to stop. It enters `Dead` the next time its phase timer fires, so this
    /// takes effect within one phase interval. The other threads keep running until the node is
    /// dropped.
    pub fn die(&self) {
        let _ = self.three_phase_shutdown.send(());
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        // The state machine and the bootstrap server receive messages from the poller, and publish
        // events to the event bus, so the poller and the bus are stopped last.

        let _ = self.three_phase_shutdown.send(());
        if let Some(three_phase) = self.three_phase.take() {
            let _ = three_phase.join();
        }

        let _ = self.bootstrap_server_shutdown.send(());
        if let Some(bootstrap_server) = self.bootstrap_server.take() {
            let _ = bootstrap_server.join();
        }

        let _ = self.poller_shutdown.send(());
        if let Some(poller) = self.poller.take() {
            let _ = poller.join();
        }

        self.event_bus_shutdown.iter().for_each(|shutdown| {
            let _ = shutdown.send(());
        });
        if let Some(event_bus) = self.event_bus.take() {
            let _ = event_bus.join();
        }
    }
}
