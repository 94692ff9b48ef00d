use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender, TryRecvError},
        Arc, Mutex,
    },
};

use quorum_rs::{
    networking::{messages::Message, network::Network},
    types::{data_types::Address, participant::Participant},
};

/// A mock network stub which passes messages from and to threads using channels.
///
/// Every message goes through [`Message::encode`] and [`Message::decode`] on the way, like it would
/// over a real transport. Broadcasts only reach the participants this node was told about, plus
/// the node itself.
///
/// All stubs created by one [`mock_network`] call share a silence switch. While it is on, consensus
/// messages are dropped on send, as if the whole network went quiet. Bootstrap messages still pass.
#[derive(Clone)]
pub(crate) struct NetworkStub {
    my_address: Address,
    all_peers: HashMap<Address, Sender<(Address, Vec<u8>)>>,
    known_peers: Arc<Mutex<BTreeSet<Address>>>,
    inbox: Arc<Mutex<Receiver<(Address, Vec<u8>)>>>,
    silenced: Arc<AtomicBool>,
}

impl NetworkStub {
    pub(crate) fn silence(&self, silenced: bool) {
        self.silenced.store(silenced, Ordering::SeqCst)
    }

    fn drops(&self, message: &Message) -> bool {
        matches!(message, Message::ConsensusMessage(_)) && self.silenced.load(Ordering::SeqCst)
    }
}

impl Network for NetworkStub {
    fn add_participant(&mut self, participant: Participant) {
        self.known_peers.lock().unwrap().insert(participant.address);
    }

    fn send(&mut self, destination: Address, message: Message) {
        if self.drops(&message) {
            return;
        }
        if let Some(peer) = self.all_peers.get(&destination) {
            let _ = peer.send((self.my_address.clone(), message.encode()));
        }
    }

    fn broadcast(&mut self, message: Message) {
        if self.drops(&message) {
            return;
        }
        let mut destinations = self.known_peers.lock().unwrap().clone();
        destinations.insert(self.my_address.clone());
        let bytes = message.encode();
        for destination in destinations {
            if let Some(peer) = self.all_peers.get(&destination) {
                let _ = peer.send((self.my_address.clone(), bytes.clone()));
            }
        }
    }

    fn recv(&mut self) -> Option<(Address, Message)> {
        match self.inbox.lock().unwrap().try_recv() {
            Ok((origin, bytes)) => Some((origin, Message::decode(&bytes).unwrap())),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => panic!(),
        }
    }
}

pub(crate) fn mock_network(addresses: impl Iterator<Item = Address>) -> Vec<NetworkStub> {
    let mut all_peers = HashMap::new();
    let silenced = Arc::new(AtomicBool::new(false));
    let address_and_inboxes: Vec<(Address, Receiver<(Address, Vec<u8>)>)> = addresses
        .map(|address| {
            let (sender, receiver) = mpsc::channel();
            all_peers.insert(address.clone(), sender);

            (address, receiver)
        })
        .collect();

    address_and_inboxes
        .into_iter()
        .map(|(my_address, inbox)| NetworkStub {
            my_address,
            all_peers: all_peers.clone(),
            known_peers: Arc::new(Mutex::new(BTreeSet::new())),
            inbox: Arc::new(Mutex::new(inbox)),
            silenced: silenced.clone(),
        })
        .collect()
}
