/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A quorum consensus engine for a distributed storage network.
//!
//! A fixed number of untrusted hosts form a quorum. Every round, each host broadcasts a heartbeat
//! that proves it is alive and advances its share of a commit-reveal randomness chain. Hosts sign
//! each other's heartbeats, and a round whose majority of hosts gathered majority signatures yields
//! a block. The resulting [ledger](ledger) also carries wallet balances and the storage records
//! waiting to be included in the next heartbeat.
//!
//! ## Subprotocols
//!
//! - [`bootstrap`]: how a host obtains a seat in the quorum.
//! - [`three_phase`]: the per-round state machine (heartbeat, sign, block).
//! - [`policy`]: the behavioral variants that parameterize the state machine.
//!
//! ## Running a node
//!
//! Users provide a [`Network`](networking::network::Network) implementation and a
//! [`Configuration`](node::Configuration), then build and start a [`NodeSpec`](node::NodeSpec).

pub mod bootstrap;

pub(crate) mod event_bus;

pub mod events;

pub mod ledger;

pub mod logging;

pub mod membership;

pub mod networking;

pub mod node;

pub mod policy;

pub mod three_phase;

pub mod types;
