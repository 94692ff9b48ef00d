/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The heartbeat-sign-block protocol that produces one block per round.
//!
//! ## Rounds
//!
//! A round is four phase intervals long. The state machine stores the phase it will run when its
//! timer next fires, runs it, and advances along the [transition table](phase::Phase::next):
//!
//! 1. **Heartbeat**: produce the local heartbeat (reveal the previous secret, commit to a new one)
//!    and broadcast it.
//! 2. **HeartbeatSigning**: sign every heartbeat received so far that the current
//!    [policy](crate::policy) accepts, and broadcast the heartbeats with these signatures as a
//!    [`HeartbeatList`](crate::types::heartbeat::HeartbeatList).
//! 3. **BlockGeneration**: broadcast a candidate [`Block`](crate::types::block::Block) made of the
//!    heartbeats that already have signatures from more than half of the known participants.
//! 4. **BlockDecision**: keep the heartbeats that ended up with signatures from more than half of the
//!    known participants. If more than half of the known participants survive, the block is accepted
//!    and handed to the policy. Either way, round state is cleared and the next round begins.
//!
//! A quiet round produces no block and is not an error. No phase waits for the network: the timer
//! always fires.
//!
//! ## Admission
//!
//! Each consensus message kind is only processed while the pending phase is one of two (see
//! [`Phase::admits`](phase::Phase::admits)). Everything else is dropped as stale or early. Signatures
//! embedded in lists and candidate blocks are re-validated one by one before they are merged.

pub mod accumulator;

pub(crate) mod implementation;

pub mod messages;

pub mod phase;

pub mod schedule;
