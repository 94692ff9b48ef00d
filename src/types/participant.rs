/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Descriptions of the hosts that occupy quorum seats.

use borsh::{BorshDeserialize, BorshSerialize};

use super::data_types::{Address, SeatIndex, VerifyingKeyBytes};

/// What a host says about itself when it asks to join a quorum: where it can be reached and which
/// key it signs with.
#[derive(Clone, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct ParticipantDescriptor {
    pub address: Address,
    pub public_key: VerifyingKeyBytes,
}

impl ParticipantDescriptor {
    pub fn new(address: Address, public_key: VerifyingKeyBytes) -> Self {
        Self { address, public_key }
    }
}

/// A host that has been assigned a seat. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct Participant {
    pub seat: SeatIndex,
    pub address: Address,
    pub public_key: VerifyingKeyBytes,
}

impl Participant {
    pub fn new(seat: SeatIndex, descriptor: ParticipantDescriptor) -> Self {
        Self {
            seat,
            address: descriptor.address,
            public_key: descriptor.public_key,
        }
    }

    pub fn descriptor(&self) -> ParticipantDescriptor {
        ParticipantDescriptor::new(self.address.clone(), self.public_key)
    }

    /// Whether this participant is the host described by `descriptor`. Both the address and the
    /// key must match.
    pub fn is(&self, descriptor: &ParticipantDescriptor) -> bool {
        self.address == descriptor.address && self.public_key == descriptor.public_key
    }
}
