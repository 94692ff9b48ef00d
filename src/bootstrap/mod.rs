/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Admission of hosts into a quorum.
//!
//! ## Protocol
//!
//! A starting node sends a [`JoinRequest`](messages::JoinRequest) describing itself to a well-known
//! bootstrap address. The bootstrap node can be one of the quorum's own nodes, and it joins itself
//! the same way.
//!
//! On receiving a join request, the bootstrap node seats the candidate in the first free seat and
//! broadcasts a [`SeatAnnouncement`](messages::SeatAnnouncement) to every participant it knows. If
//! every seat is taken it rejects the request with
//! [`QuorumFull`](crate::membership::MembershipError::QuorumFull).
//!
//! On receiving a seat announcement, a node records the participant. Announcements for seats that
//! are already filled are ignored. Then:
//! - If the announced participant is the node itself, the node has learnt its seat and starts running
//!   rounds.
//! - Otherwise, if the node is seated, it sends its own announcement straight back to the new peer
//!   as a courtesy, so that peers seated earlier become visible to peers seated later.
//!
//! Because only newly filled seats trigger a reply, every exchange terminates.

pub mod messages;

pub(crate) mod server;
