/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The seat table of one quorum, as seen by the local node.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::types::{
    block::Block,
    crypto_primitives::sentinel_commitment,
    data_types::{CryptoHash, SeatIndex, VerifyingKeyBytes},
    participant::{Participant, ParticipantDescriptor},
};

/// Shared handle to the local node's view of quorum membership.
///
/// Clones of a `MembershipRegistry` refer to the same seat table. Every accessor takes the table's
/// lock for the duration of the call only.
#[derive(Clone)]
pub struct MembershipRegistry {
    local: ParticipantDescriptor,
    seats: Arc<Mutex<SeatTable>>,
}

struct SeatTable {
    seats: Vec<Option<Seat>>,
    local_seat: Option<SeatIndex>,
}

struct Seat {
    participant: Participant,
    // The commitment this seat's next heartbeat must reveal.
    predecessor: CryptoHash,
}

impl Seat {
    fn new(participant: Participant) -> Self {
        Self {
            participant,
            predecessor: sentinel_commitment(),
        }
    }
}

/// How a [`record`](MembershipRegistry::record) call changed the seat table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recorded {
    /// The seat was empty and now holds the participant.
    New,
    /// The seat was already filled. The table is unchanged.
    AlreadyFilled,
}

impl MembershipRegistry {
    /// Create an empty seat table of `quorum_size` seats. `local` describes the node that owns this
    /// registry, and is what [`is_self`](Self::is_self) compares against.
    pub fn new(quorum_size: u16, local: ParticipantDescriptor) -> Self {
        let seats = (0..quorum_size).map(|_| None).collect();
        Self {
            local,
            seats: Arc::new(Mutex::new(SeatTable {
                seats,
                local_seat: None,
            })),
        }
    }

    pub fn quorum_size(&self) -> usize {
        self.lock().seats.len()
    }

    pub fn local_descriptor(&self) -> &ParticipantDescriptor {
        &self.local
    }

    /// Seat `candidate` in the first empty slot.
    ///
    /// # Errors
    /// - [`MembershipError::DuplicateJoin`] if `candidate` already holds a seat.
    /// - [`MembershipError::QuorumFull`] if every seat is occupied.
    pub fn assign_seat(&self, candidate: ParticipantDescriptor) -> Result<Participant, MembershipError> {
        let mut table = self.lock();
        if let Some(existing) = table.find(&candidate.public_key) {
            return Err(MembershipError::DuplicateJoin { seat: existing.participant.seat });
        }

        let index = table
            .seats
            .iter()
            .position(Option::is_none)
            .ok_or(MembershipError::QuorumFull)?;
        let participant = Participant::new(SeatIndex::new(index as u16), candidate);
        table.fill(Seat::new(participant.clone()), &self.local);
        Ok(participant)
    }

    /// Record a participant whose seat was assigned elsewhere. Idempotent: recording into a filled
    /// seat leaves the table unchanged.
    ///
    /// # Errors
    /// - [`MembershipError::UnrecognizedSeat`] if the seat index lies outside the quorum.
    /// - [`MembershipError::DuplicateJoin`] if the same host already holds a different seat.
    pub fn record(&self, participant: Participant) -> Result<Recorded, MembershipError> {
        let mut table = self.lock();
        let index = participant.seat.as_usize();
        if index >= table.seats.len() {
            return Err(MembershipError::UnrecognizedSeat { seat: participant.seat });
        }
        if table.seats[index].is_some() {
            return Ok(Recorded::AlreadyFilled);
        }
        if let Some(existing) = table.find(&participant.public_key) {
            return Err(MembershipError::DuplicateJoin { seat: existing.participant.seat });
        }

        table.fill(Seat::new(participant), &self.local);
        Ok(Recorded::New)
    }

    pub fn lookup(&self, seat: SeatIndex) -> Option<Participant> {
        self.lock()
            .seats
            .get(seat.as_usize())
            .and_then(|slot| slot.as_ref())
            .map(|seat| seat.participant.clone())
    }

    /// Whether `participant` is the node that owns this registry.
    pub fn is_self(&self, participant: &Participant) -> bool {
        participant.is(&self.local)
    }

    pub fn local_seat(&self) -> Option<SeatIndex> {
        self.lock().local_seat
    }

    pub fn local_participant(&self) -> Option<Participant> {
        self.local_seat().and_then(|seat| self.lookup(seat))
    }

    pub fn seat_of(&self, host: &VerifyingKeyBytes) -> Option<SeatIndex> {
        self.lock().find(host).map(|seat| seat.participant.seat)
    }

    pub fn is_seated(&self, host: &VerifyingKeyBytes) -> bool {
        self.seat_of(host).is_some()
    }

    /// Number of occupied seats. This is the "known membership size" that round thresholds are
    /// computed against.
    pub fn seated_count(&self) -> usize {
        self.lock().seats.iter().filter(|slot| slot.is_some()).count()
    }

    /// All seated participants, in seat order.
    pub fn participants(&self) -> Vec<Participant> {
        self.lock()
            .seats
            .iter()
            .flatten()
            .map(|seat| seat.participant.clone())
            .collect()
    }

    /// The commitment that `host`'s next heartbeat must reveal, if `host` is seated.
    pub fn predecessor_commitment(&self, host: &VerifyingKeyBytes) -> Option<CryptoHash> {
        self.lock().find(host).map(|seat| seat.predecessor)
    }

    /// Move every seat's chain forward past an accepted `block`. Seats that appear in the block now
    /// expect a reveal of their heartbeat's commitment. Seats that do not restart from the sentinel.
    pub fn advance_commitments(&self, block: &Block) {
        let mut table = self.lock();
        for seat in table.seats.iter_mut().flatten() {
            seat.predecessor = match block.heartbeat_of(&seat.participant.public_key) {
                Some(heartbeat) => heartbeat.entropy_stage1,
                None => sentinel_commitment(),
            };
        }
    }

    fn lock(&self) -> MutexGuard<'_, SeatTable> {
        match self.seats.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SeatTable {
    fn find(&self, host: &VerifyingKeyBytes) -> Option<&Seat> {
        self.seats
            .iter()
            .flatten()
            .find(|seat| seat.participant.public_key == *host)
    }

    fn fill(&mut self, seat: Seat, local: &ParticipantDescriptor) {
        let index = seat.participant.seat;
        if seat.participant.is(local) {
            self.local_seat = Some(index);
        }
        self.seats[index.as_usize()] = Some(seat);
    }
}

/// Failures of membership operations. Reported to the caller, never fatal to the node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MembershipError {
    QuorumFull,
    DuplicateJoin { seat: SeatIndex },
    UnrecognizedSeat { seat: SeatIndex },
}
