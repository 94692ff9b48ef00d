//! Functions and types for receiving messages from the network.

use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError},
    thread::{self, JoinHandle},
    time::Instant,
};

use crate::{
    bootstrap::messages::BootstrapMessage,
    three_phase::messages::ConsensusMessage,
    types::data_types::{Address, SwarmId},
};

use super::{messages::Message, network::Network};

/// Spawn the poller thread, which polls the [`Network`] for messages and distributes them into receiver
/// handles.
///
/// The kinds of messages that the poller polls are:
/// 1. Bootstrap messages (processed by the [`BootstrapServer`](crate::bootstrap::server::BootstrapServer)), and
/// 2. Consensus messages (queued for the [`ThreePhase`](crate::three_phase::implementation::ThreePhase)
///    actor, which is the only owner of round state).
pub(crate) fn start_polling<N: Network + 'static>(
    mut network: N,
    shutdown_signal: Receiver<()>,
) -> (
    JoinHandle<()>,
    Receiver<(Address, BootstrapMessage)>,
    Receiver<(Address, ConsensusMessage)>,
) {
    let (to_bootstrap_msg_receiver, bootstrap_msg_receiver) = mpsc::channel();
    let (to_consensus_msg_receiver, consensus_msg_receiver) = mpsc::channel();

    let poller_thread = thread::spawn(move || loop {
        match shutdown_signal.try_recv() {
            Ok(()) => return,
            Err(TryRecvError::Empty) => (),
            Err(TryRecvError::Disconnected) => {
                panic!("Poller thread disconnected from main thread")
            }
        }

        if let Some((origin, msg)) = network.recv() {
            match msg {
                Message::BootstrapMessage(b_msg) => {
                    let _ = to_bootstrap_msg_receiver.send((origin, b_msg));
                }
                Message::ConsensusMessage(c_msg) => {
                    let _ = to_consensus_msg_receiver.send((origin, c_msg));
                }
            }
        } else {
            thread::yield_now()
        }
    });
    (poller_thread, bootstrap_msg_receiver, consensus_msg_receiver)
}

/// A receiving end for [`ConsensusMessage`]s. Messages for other swarms are discarded.
pub(crate) struct ConsensusMessageStub {
    receiver: Receiver<(Address, ConsensusMessage)>,
}

impl ConsensusMessageStub {
    pub(crate) fn new(receiver: Receiver<(Address, ConsensusMessage)>) -> Self {
        Self { receiver }
    }

    /// Receive a message for `swarm_id`, waiting at most until `deadline`.
    pub(crate) fn recv(
        &self,
        swarm_id: SwarmId,
        deadline: Instant,
    ) -> Result<(Address, ConsensusMessage), ConsensusMessageReceiveError> {
        recv_for_swarm(&self.receiver, swarm_id, deadline, ConsensusMessage::swarm_id)
            .map_err(ConsensusMessageReceiveError::from)
    }

    /// Throw away every message queued so far. Used while the node is not yet seated, when there is
    /// no round state to apply them to.
    pub(crate) fn discard_pending(&self) -> usize {
        self.receiver.try_iter().count()
    }
}

#[derive(Debug)]
pub(crate) enum ConsensusMessageReceiveError {
    Timeout,
    Disconnected,
}

impl From<RecvTimeoutError> for ConsensusMessageReceiveError {
    fn from(value: RecvTimeoutError) -> Self {
        match value {
            RecvTimeoutError::Timeout => ConsensusMessageReceiveError::Timeout,
            RecvTimeoutError::Disconnected => ConsensusMessageReceiveError::Disconnected,
        }
    }
}

/// A receiving end for [`BootstrapMessage`]s. Messages for other swarms are discarded.
pub(crate) struct BootstrapMessageStub {
    receiver: Receiver<(Address, BootstrapMessage)>,
}

impl BootstrapMessageStub {
    pub(crate) fn new(receiver: Receiver<(Address, BootstrapMessage)>) -> Self {
        Self { receiver }
    }

    /// Receive a message for `swarm_id`, waiting at most until `deadline`.
    pub(crate) fn recv(
        &self,
        swarm_id: SwarmId,
        deadline: Instant,
    ) -> Result<(Address, BootstrapMessage), BootstrapMessageReceiveError> {
        recv_for_swarm(&self.receiver, swarm_id, deadline, BootstrapMessage::swarm_id)
            .map_err(BootstrapMessageReceiveError::from)
    }
}

#[derive(Debug)]
pub(crate) enum BootstrapMessageReceiveError {
    Timeout,
    Disconnected,
}

impl From<RecvTimeoutError> for BootstrapMessageReceiveError {
    fn from(value: RecvTimeoutError) -> Self {
        match value {
            RecvTimeoutError::Timeout => BootstrapMessageReceiveError::Timeout,
            RecvTimeoutError::Disconnected => BootstrapMessageReceiveError::Disconnected,
        }
    }
}

fn recv_for_swarm<M>(
    receiver: &Receiver<(Address, M)>,
    swarm_id: SwarmId,
    deadline: Instant,
    swarm_of: fn(&M) -> SwarmId,
) -> Result<(Address, M), RecvTimeoutError> {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return Err(RecvTimeoutError::Timeout);
        }
        let (origin, msg) = receiver.recv_timeout(deadline - now)?;
        if swarm_of(&msg) == swarm_id {
            return Ok((origin, msg));
        }
    }
}
