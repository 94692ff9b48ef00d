/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Quorum membership: which host holds which seat.
//!
//! A quorum has a fixed number of seats. A seat, once filled, is stable: the participant in it is
//! never replaced or removed, and a seat whose host has gone silent stays filled (a "hole" in every
//! block from then on) rather than becoming free.
//!
//! Besides identities, the [`MembershipRegistry`] tracks one piece of per-seat protocol state: the
//! entropy commitment that the seat's next heartbeat must reveal. See
//! [`Heartbeat`](crate::types::heartbeat::Heartbeat) for the commit-reveal chain.

pub mod registry;

pub use registry::{MembershipError, MembershipRegistry, Recorded};
