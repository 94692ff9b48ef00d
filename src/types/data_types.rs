/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that exist only to store bytes, and do not have any major "active" behavior.

use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::AddAssign,
    time::{Duration, SystemTime},
};

use borsh::{BorshDeserialize, BorshSerialize};
use rand_core::{OsRng, RngCore};

/// Number that uniquely identifies a swarm (one instance of the quorum protocol).
///
/// Every node of the same quorum must be configured with the same `SwarmId`. Messages carrying a
/// different `SwarmId` are dropped on receipt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct SwarmId(u64);

impl SwarmId {
    /// Create a new `SwarmId` with an `int` value.
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    /// Get the `u64` value of this `SwarmId`.
    pub const fn int(&self) -> u64 {
        self.0
    }
}

/// Index of a participant's stable slot in the quorum, in `0..quorum_size`.
///
/// An unassigned seat is represented as `Option::<SeatIndex>::None`, never as a reserved value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize)]
pub struct SeatIndex(u16);

impl SeatIndex {
    pub const fn new(int: u16) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u16 {
        self.0
    }

    pub(crate) const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl Display for SeatIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Sequence number of a round of the three-phase protocol.
///
/// Round numbers are derived from wall-clock time (see
/// [`RoundSchedule`](crate::three_phase::schedule::RoundSchedule)), so every node agrees on the
/// number of the round it is currently running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize)]
pub struct RoundNumber(u64);

impl RoundNumber {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl Display for RoundNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl AddAssign<u64> for RoundNumber {
    fn add_assign(&mut self, rhs: u64) {
        self.0.add_assign(rhs)
    }
}

/// Random identifier of a [`Heartbeat`](crate::types::heartbeat::Heartbeat).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize)]
pub struct HeartbeatId(u64);

impl HeartbeatId {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    /// Draw a fresh identifier. Collisions within one round are negligible at quorum sizes.
    pub fn random() -> Self {
        Self(rand::random())
    }

    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl Display for HeartbeatId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Random identifier of a [`HeartbeatList`](crate::types::heartbeat::HeartbeatList).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct HeartbeatListId(u64);

impl HeartbeatListId {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    pub fn random() -> Self {
        Self(rand::random())
    }

    pub const fn int(&self) -> u64 {
        self.0
    }
}

/// 32-byte cryptographic hash, computed using [`CryptoHasher`](crate::types::crypto_primitives::CryptoHasher).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize)]
pub struct CryptoHash([u8; 32]);

impl CryptoHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl Debug for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "CryptoHash(")?;
        for byte in &self.0[..4] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "..)")
    }
}

/// Length in bytes of a secret revealed through the commit-reveal chain.
pub const ENTROPY_VOLUME: usize = 32;

/// A secret contributed by one host to one round's randomness.
#[derive(Clone, Copy, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct Entropy([u8; ENTROPY_VOLUME]);

impl Entropy {
    pub const fn new(bytes: [u8; ENTROPY_VOLUME]) -> Self {
        Self(bytes)
    }

    /// The all-zero secret. Revealed by hosts that are (re)starting their chain.
    pub const fn zero() -> Self {
        Self([0u8; ENTROPY_VOLUME])
    }

    /// Draw a fresh secret from the operating system's RNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; ENTROPY_VOLUME];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; ENTROPY_VOLUME] {
        self.0
    }
}

impl Debug for Entropy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Entropy(..)")
    }
}

/// Bytes of an Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct SignatureBytes([u8; 64]);

impl SignatureBytes {
    pub const fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 64] {
        self.0
    }
}

impl Debug for SignatureBytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureBytes(..)")
    }
}

/// Bytes of an Ed25519 verifying key. Hosts are identified by these on the wire.
pub type VerifyingKeyBytes = [u8; 32];

/// Milliseconds since the Unix Epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, BorshDeserialize, BorshSerialize)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn new(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn millis(&self) -> u64 {
        self.0
    }

    /// The current wall-clock time. Clocks set before the Unix Epoch read as the Epoch itself.
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(since_epoch.as_millis() as u64)
    }

    pub fn to_system_time(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_millis(self.0)
    }
}

/// Network address of a participant, as understood by the [`Network`](crate::networking::network::Network)
/// provider.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}
