//! The per-room event loop.
//!
//! `RoomLoop` is the only writer of a room's membership. Joins, leaves,
//! broadcasts and snapshots arrive on one queue and are handled in order, so
//! the membership map needs no lock. Delivery into member mailboxes never
//! waits: a member that cannot take a payload right now is removed.

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use bytes::Bytes;
use tokio::{
    sync::{Mutex, mpsc},
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use roomcast_shared::time::Clock;

use crate::{
    domain::{MailboxError, Participant, ParticipantId, RoomId, RoomView, UserView},
    registry::RoomMap,
};

use super::{
    RoomHandle, RoomShared,
    command::RoomCommand,
    presence::{LeaveReason, PresenceEvent, PresenceNotifier},
};

/// Idle reclamation settings for rooms created by a registry.
pub(crate) struct Reclaim {
    pub(crate) table: Weak<Mutex<RoomMap>>,
    pub(crate) ttl: Duration,
}

struct Member {
    participant: Participant,
    joined_at: i64,
}

pub(crate) struct RoomLoop {
    id: RoomId,
    instance: Uuid,
    receiver: mpsc::Receiver<RoomCommand>,
    cancel_token: CancellationToken,
    /// Weak so the loop alone never keeps its queue open
    handle: Weak<RoomShared>,
    /// Feeds the room's presence worker; events are dropped when it is full
    presence: mpsc::Sender<(ParticipantId, PresenceEvent)>,
    clock: Arc<dyn Clock>,
    reclaim: Option<Reclaim>,
    members: HashMap<ParticipantId, Member>,
    /// When the room last became empty; `None` while it has members
    empty_since: Option<Instant>,
}

impl RoomLoop {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: RoomId,
        instance: Uuid,
        receiver: mpsc::Receiver<RoomCommand>,
        cancel_token: CancellationToken,
        handle: Weak<RoomShared>,
        notifier: Arc<dyn PresenceNotifier>,
        presence_capacity: usize,
        clock: Arc<dyn Clock>,
        reclaim: Option<Reclaim>,
    ) -> Self {
        let (presence, presence_rx) = mpsc::channel(presence_capacity.max(1));
        tokio::spawn(run_presence_worker(
            id.clone(),
            presence_rx,
            handle.clone(),
            notifier,
        ));

        Self {
            id,
            instance,
            receiver,
            cancel_token,
            handle,
            presence,
            clock,
            reclaim,
            members: HashMap::new(),
            empty_since: Some(Instant::now()),
        }
    }

    pub(crate) async fn run(mut self) {
        tracing::info!("Room '{}' started", self.id);

        loop {
            let idle_deadline = self.idle_deadline();

            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    tracing::info!("Room '{}' received shutdown signal", self.id);
                    break;
                }

                command = self.receiver.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        tracing::info!("Every handle to room '{}' was dropped", self.id);
                        break;
                    }
                },

                () = sleep_until(idle_deadline) => {
                    if self.try_reclaim().await {
                        tracing::info!("Room '{}' reclaimed after idling", self.id);
                        break;
                    }
                    // still referenced elsewhere; check again after another TTL
                    self.empty_since = Some(Instant::now());
                }
            }
        }

        self.close_all();
        tracing::info!("Room '{}' stopped", self.id);
    }

    fn handle_command(&mut self, command: RoomCommand) {
        tracing::debug!("Room '{}' handling {} request", self.id, command.kind());

        match command {
            RoomCommand::Join(participant) => self.join(participant),
            RoomCommand::Leave(participant_id) => self.leave(&participant_id),
            RoomCommand::Broadcast { sender, payload } => self.broadcast(sender.as_ref(), payload),
            RoomCommand::Snapshot { viewer, respond_to } => {
                let view = self.project(viewer.as_ref());
                if respond_to.send(view).is_err() {
                    tracing::debug!("Snapshot requester for room '{}' went away", self.id);
                }
            }
        }
    }

    fn join(&mut self, participant: Participant) {
        let participant_id = participant.id().clone();
        let joined_at = self.clock.now_millis();
        let member = Member {
            participant,
            joined_at,
        };

        // last writer wins; the replaced entry's mailbox closes when it drops
        if let Some(previous) = self.members.insert(participant_id.clone(), member) {
            tracing::info!(
                "Participant '{}' re-joined room '{}'; closing previous mailbox",
                participant_id,
                self.id
            );
            drop(previous);
        } else {
            tracing::info!("Participant '{}' joined room '{}'", participant_id, self.id);
        }
        self.empty_since = None;

        let user = UserView::new(&participant_id, joined_at);
        self.notify(
            participant_id,
            PresenceEvent::ParticipantJoined {
                room: self.id.to_string(),
                user,
            },
        );
    }

    fn leave(&mut self, participant_id: &ParticipantId) {
        match self.members.remove(participant_id) {
            Some(member) => {
                tracing::info!("Participant '{}' left room '{}'", participant_id, self.id);
                self.depart(participant_id.clone(), member, LeaveReason::Left);
            }
            None => {
                tracing::debug!(
                    "Participant '{}' is not in room '{}'; ignoring leave",
                    participant_id,
                    self.id
                );
            }
        }
    }

    fn broadcast(&mut self, sender: Option<&ParticipantId>, payload: Bytes) {
        let mut undeliverable = Vec::new();

        for (participant_id, member) in &self.members {
            if sender == Some(participant_id) {
                continue;
            }
            if let Err(e) = member.participant.try_deliver(payload.clone()) {
                undeliverable.push((participant_id.clone(), e));
            }
        }

        for (participant_id, error) in undeliverable {
            let Some(member) = self.members.remove(&participant_id) else {
                continue;
            };
            let reason = match error {
                MailboxError::Full => {
                    tracing::warn!(
                        "Mailbox of '{}' is full; evicting from room '{}'",
                        participant_id,
                        self.id
                    );
                    LeaveReason::Evicted
                }
                MailboxError::Closed => {
                    tracing::info!(
                        "Mailbox of '{}' was closed by its reader; removing from room '{}'",
                        participant_id,
                        self.id
                    );
                    LeaveReason::Disconnected
                }
            };
            self.depart(participant_id, member, reason);
        }
    }

    /// Finish removing a member that is already out of the map.
    fn depart(&mut self, participant_id: ParticipantId, member: Member, reason: LeaveReason) {
        let user = UserView::new(&participant_id, member.joined_at);
        // closes the mailbox
        drop(member);

        if self.members.is_empty() {
            self.empty_since = Some(Instant::now());
        }

        self.notify(
            participant_id,
            PresenceEvent::ParticipantLeft {
                room: self.id.to_string(),
                user,
                reason,
            },
        );
    }

    fn project(&self, viewer: Option<&ParticipantId>) -> RoomView {
        let users: Vec<UserView> = self
            .members
            .iter()
            .filter(|(participant_id, _)| viewer != Some(*participant_id))
            .map(|(participant_id, member)| UserView::new(participant_id, member.joined_at))
            .collect();

        RoomView::new(self.id.to_string(), users.len(), users)
    }

    /// Queue `event` for the presence worker without waiting.
    fn notify(&self, subject: ParticipantId, event: PresenceEvent) {
        match self.presence.try_send((subject, event)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full((subject, _))) => {
                tracing::warn!(
                    "Presence queue of room '{}' is full; dropping event for '{}'",
                    self.id,
                    subject
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Presence worker of room '{}' has stopped", self.id);
            }
        }
    }

    /// `None` while the room has members, or when the TTL reaches past what `Instant` can hold.
    fn idle_deadline(&self) -> Option<Instant> {
        let reclaim = self.reclaim.as_ref()?;
        self.empty_since.and_then(|since| since.checked_add(reclaim.ttl))
    }

    /// Remove this room from its registry if nobody else can reach it.
    ///
    /// Runs under the registry lock: the entry must still be this instance,
    /// the registry's handle must be the only one, and no request may be queued.
    async fn try_reclaim(&self) -> bool {
        let Some(table) = self.reclaim.as_ref().and_then(|r| r.table.upgrade()) else {
            return false;
        };

        let mut rooms = table.lock().await;
        let unreferenced = rooms
            .get(&self.id)
            .is_some_and(|room| room.instance() == self.instance && room.handle_count() == 1);

        if !unreferenced || !self.members.is_empty() || !self.receiver.is_empty() {
            return false;
        }

        rooms.remove(&self.id);
        true
    }

    fn close_all(&mut self) {
        self.receiver.close();
        if !self.members.is_empty() {
            tracing::info!(
                "Closing {} remaining mailbox(es) in room '{}'",
                self.members.len(),
                self.id
            );
        }
        self.members.clear();
    }
}

/// Deliver presence events to the notifier one at a time, in the order the room produced them.
///
/// Runs until the room loop drops its end of the queue. A notifier that
/// broadcasts back into the room only waits on the room's request queue here,
/// never inside the room loop.
async fn run_presence_worker(
    room_id: RoomId,
    mut events: mpsc::Receiver<(ParticipantId, PresenceEvent)>,
    handle: Weak<RoomShared>,
    notifier: Arc<dyn PresenceNotifier>,
) {
    while let Some((subject, event)) = events.recv().await {
        let Some(shared) = handle.upgrade() else {
            tracing::debug!(
                "No handles left for room '{}'; skipping presence notification",
                room_id
            );
            continue;
        };

        notifier.notify(RoomHandle { shared }, subject, event).await;
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
