use crate::types::{data_types::Address, participant::Participant};

use super::messages::Message;

/// The transport boundary. Implementations deliver messages on a best-effort basis: no delivery
/// guarantee and no acknowledgement is expected by the consensus engine.
pub trait Network: Clone + Send {
    /// Inform the network provider of a newly recorded participant, so that later broadcasts reach it.
    fn add_participant(&mut self, participant: Participant);

    /// Send a message to every known participant without blocking.
    fn broadcast(&mut self, message: Message);

    /// Send a message to the specified address without blocking.
    fn send(&mut self, destination: Address, message: Message);

    /// Receive a message from any peer. Returns immediately with a None if no message is available now.
    fn recv(&mut self) -> Option<(Address, Message)>;
}

/// Handle for informing the Network Provider about membership changes.
///
/// The network provider must learn about new participants because, for example, it may want to
/// establish a connection to them before the next broadcast.
#[derive(Clone)]
pub(crate) struct MembershipUpdateHandle<N: Network> {
    network: N,
}

impl<N: Network> MembershipUpdateHandle<N> {
    pub(crate) fn new(network: N) -> Self {
        Self { network }
    }

    pub(crate) fn add_participant(&mut self, participant: Participant) {
        self.network.add_participant(participant)
    }
}
