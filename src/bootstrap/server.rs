/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The thread that answers join requests and records seat announcements.

use std::{
    sync::mpsc::{Receiver, Sender, TryRecvError},
    thread::{self, JoinHandle},
    time::{Duration, Instant, SystemTime},
};

use crate::{
    events::*,
    membership::{MembershipError, MembershipRegistry, Recorded},
    networking::{
        network::{MembershipUpdateHandle, Network},
        receiving::{BootstrapMessageReceiveError, BootstrapMessageStub},
        sending::SenderHandle,
    },
    types::{
        data_types::{Address, SeatIndex, SwarmId},
        participant::{Participant, ParticipantDescriptor},
    },
};

use super::messages::{BootstrapMessage, JoinRequest, SeatAnnouncement};

pub(crate) struct BootstrapServerConfiguration {
    pub(crate) swarm_id: SwarmId,
    pub(crate) poll_interval: Duration,
}

pub(crate) struct BootstrapServer<N: Network + 'static> {
    config: BootstrapServerConfiguration,
    membership: MembershipRegistry,
    receiver: BootstrapMessageStub,
    sender: SenderHandle<N>,
    membership_update_handle: MembershipUpdateHandle<N>,
    activation: Option<Sender<SeatIndex>>,
    shutdown_signal: Receiver<()>,
    event_publisher: Option<Sender<Event>>,
}

impl<N: Network + 'static> BootstrapServer<N> {
    pub(crate) fn new(
        config: BootstrapServerConfiguration,
        membership: MembershipRegistry,
        receiver: BootstrapMessageStub,
        network: N,
        activation: Sender<SeatIndex>,
        shutdown_signal: Receiver<()>,
        event_publisher: Option<Sender<Event>>,
    ) -> Self {
        Self {
            config,
            membership,
            receiver,
            sender: SenderHandle::new(network.clone()),
            membership_update_handle: MembershipUpdateHandle::new(network),
            activation: Some(activation),
            shutdown_signal,
            event_publisher,
        }
    }

    pub(crate) fn start(mut self) -> JoinHandle<()> {
        thread::spawn(move || loop {
            match self.shutdown_signal.try_recv() {
                Ok(()) => return,
                Err(TryRecvError::Empty) => (),
                Err(TryRecvError::Disconnected) => {
                    panic!("Bootstrap server thread disconnected from main thread")
                }
            }

            let deadline = Instant::now() + self.config.poll_interval;
            match self.receiver.recv(self.config.swarm_id, deadline) {
                Ok((_, BootstrapMessage::JoinRequest(request))) => {
                    let _ = self.on_receive_join_request(request);
                }
                Ok((origin, BootstrapMessage::SeatAnnouncement(announcement))) => {
                    let _ = self.on_receive_seat_announcement(origin, announcement);
                }
                Err(BootstrapMessageReceiveError::Timeout) => (),
                Err(BootstrapMessageReceiveError::Disconnected) => thread::sleep(self.config.poll_interval),
            }
        })
    }

    /// Seat the candidate and tell every known participant, the candidate included, about it.
    pub(crate) fn on_receive_join_request(&mut self, request: JoinRequest) -> Result<Participant, MembershipError> {
        let participant = match self.membership.assign_seat(request.candidate.clone()) {
            Ok(participant) => participant,
            Err(reason) => {
                Event::publish(
                    &self.event_publisher,
                    Event::RejectJoin(RejectJoinEvent {
                        timestamp: SystemTime::now(),
                        candidate: request.candidate,
                        reason: reason.clone(),
                    }),
                );
                return Err(reason);
            }
        };

        Event::publish(
            &self.event_publisher,
            Event::AssignSeat(AssignSeatEvent {
                timestamp: SystemTime::now(),
                participant: participant.clone(),
            }),
        );
        self.on_participant_recorded(participant.clone());
        self.sender.broadcast(SeatAnnouncement {
            swarm_id: self.config.swarm_id,
            participant: participant.clone(),
        });
        Ok(participant)
    }

    /// Record the announced participant. Announcements for filled seats change nothing.
    pub(crate) fn on_receive_seat_announcement(
        &mut self,
        origin: Address,
        announcement: SeatAnnouncement,
    ) -> Result<Recorded, MembershipError> {
        let recorded = match self.membership.record(announcement.participant.clone()) {
            Ok(recorded) => recorded,
            Err(reason) => {
                Event::publish(
                    &self.event_publisher,
                    Event::RejectAnnouncement(RejectAnnouncementEvent {
                        timestamp: SystemTime::now(),
                        origin,
                        participant: announcement.participant,
                        reason: reason.clone(),
                    }),
                );
                return Err(reason);
            }
        };
        if recorded == Recorded::New {
            Event::publish(
                &self.event_publisher,
                Event::RecordParticipant(RecordParticipantEvent {
                    timestamp: SystemTime::now(),
                    origin,
                    participant: announcement.participant.clone(),
                }),
            );
            self.on_participant_recorded(announcement.participant);
        }
        Ok(recorded)
    }

    /// React to a seat that was just filled in the local registry. If it is the local host's seat,
    /// start ticking. Otherwise introduce ourselves to the new peer, so that it learns about us even
    /// if it joined after our own announcement went out.
    fn on_participant_recorded(&mut self, participant: Participant) {
        self.membership_update_handle.add_participant(participant.clone());

        if self.membership.is_self(&participant) {
            if let Some(activation) = self.activation.take() {
                let _ = activation.send(participant.seat);
                Event::publish(
                    &self.event_publisher,
                    Event::StartTicking(StartTickingEvent {
                        timestamp: SystemTime::now(),
                        seat: participant.seat,
                    }),
                );
            }
        } else if let Some(local) = self.membership.local_participant() {
            self.sender.send(
                participant.address,
                SeatAnnouncement {
                    swarm_id: self.config.swarm_id,
                    participant: local,
                },
            );
        }
    }
}

/// Ask the host at `bootstrap` for a seat.
pub(crate) fn join<N: Network>(
    sender: &mut SenderHandle<N>,
    swarm_id: SwarmId,
    bootstrap: Address,
    candidate: ParticipantDescriptor,
    event_publisher: &Option<Sender<Event>>,
) {
    sender.send(
        bootstrap.clone(),
        JoinRequest {
            swarm_id,
            candidate: candidate.clone(),
        },
    );
    Event::publish(
        event_publisher,
        Event::SendJoinRequest(SendJoinRequestEvent {
            timestamp: SystemTime::now(),
            bootstrap,
            candidate,
        }),
    );
}
