//! Rooms.
//!
//! A room is a tokio task that exclusively owns its membership map and
//! processes join, leave, broadcast and snapshot requests one at a time.
//! Callers talk to it through a cloneable [`RoomHandle`]; every request goes
//! through the room's bounded queue, so a stalled room pushes back on callers
//! instead of growing without limit.

mod command;
mod event_loop;
pub mod presence;

pub use presence::{
    BroadcastPresence, LeaveReason, PresenceEvent, PresenceNotifier, SilentPresence,
};

use std::{
    fmt,
    sync::{Arc, Weak},
};

use bytes::Bytes;
use tokio::{
    sync::{Mutex, mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use roomcast_shared::time::Clock;

use crate::{
    config::HubConfig,
    domain::{Participant, ParticipantId, RoomId, RoomView},
    registry::RoomMap,
};

use command::RoomCommand;
use event_loop::{Reclaim, RoomLoop};

pub(crate) struct RoomShared {
    id: RoomId,
    /// Distinguishes this room from a later room registered under the same id
    instance: Uuid,
    sender: mpsc::Sender<RoomCommand>,
    cancel_token: CancellationToken,
}

/// Handle to a running room.
///
/// Clones refer to the same room. Once every handle is dropped the room's
/// queue closes and its loop stops, closing the remaining members' mailboxes.
#[derive(Clone)]
pub struct RoomHandle {
    shared: Arc<RoomShared>,
}

impl fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomHandle")
            .field("id", &self.shared.id)
            .field("instance", &self.shared.instance)
            .finish()
    }
}

impl RoomHandle {
    /// Spawn a standalone room.
    ///
    /// Returns the handle and the task join handle. A standalone room is never
    /// reclaimed for idleness; it runs until [`RoomHandle::shutdown`] or until
    /// every handle is dropped.
    pub fn spawn(
        id: RoomId,
        config: &HubConfig,
        notifier: Arc<dyn PresenceNotifier>,
        clock: Arc<dyn Clock>,
    ) -> (Self, JoinHandle<()>) {
        Self::spawn_inner(id, config, notifier, clock, None)
    }

    /// Spawn a room owned by a registry table; it removes itself from `table`
    /// after staying idle for `config.idle_room_ttl`.
    pub(crate) fn spawn_in_table(
        id: RoomId,
        config: &HubConfig,
        notifier: Arc<dyn PresenceNotifier>,
        clock: Arc<dyn Clock>,
        table: Weak<Mutex<RoomMap>>,
    ) -> (Self, JoinHandle<()>) {
        let reclaim = config.idle_room_ttl.map(|ttl| Reclaim { table, ttl });
        Self::spawn_inner(id, config, notifier, clock, reclaim)
    }

    fn spawn_inner(
        id: RoomId,
        config: &HubConfig,
        notifier: Arc<dyn PresenceNotifier>,
        clock: Arc<dyn Clock>,
        reclaim: Option<Reclaim>,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.request_queue_capacity.max(1));
        let cancel_token = CancellationToken::new();
        let instance = Uuid::new_v4();

        let shared = Arc::new(RoomShared {
            id: id.clone(),
            instance,
            sender,
            cancel_token: cancel_token.clone(),
        });

        let room_loop = RoomLoop::new(
            id,
            instance,
            receiver,
            cancel_token,
            Arc::downgrade(&shared),
            notifier,
            config.request_queue_capacity,
            clock,
            reclaim,
        );
        let task = tokio::spawn(room_loop.run());

        (Self { shared }, task)
    }

    pub fn id(&self) -> &RoomId {
        &self.shared.id
    }

    /// Whether `other` refers to the same room instance.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Whether the room's loop has stopped accepting requests.
    pub fn is_closed(&self) -> bool {
        self.shared.sender.is_closed()
    }

    /// Stop the room's loop. Remaining members' mailboxes are closed.
    pub fn shutdown(&self) {
        self.shared.cancel_token.cancel();
    }

    pub(crate) fn instance(&self) -> Uuid {
        self.shared.instance
    }

    /// Number of live handles to this room (including this one).
    pub(crate) fn handle_count(&self) -> usize {
        Arc::strong_count(&self.shared)
    }

    /// Add `participant` to the room, replacing any member with the same id.
    ///
    /// Waits until the room's queue accepts the request. If the room has
    /// stopped, the participant is dropped and its mailbox closes.
    pub async fn join(&self, participant: Participant) {
        let participant_id = participant.id().clone();
        self.submit(RoomCommand::Join(participant), &participant_id).await;
    }

    /// Remove the participant with `participant_id`; a no-op for non-members.
    pub async fn leave(&self, participant_id: ParticipantId) {
        let subject = participant_id.clone();
        self.submit(RoomCommand::Leave(participant_id), &subject).await;
    }

    /// Deliver `payload` to every member except `sender`.
    ///
    /// A `None` sender delivers to everyone. Members whose mailbox is full are
    /// evicted instead of receiving the payload.
    pub async fn broadcast(&self, sender: Option<ParticipantId>, payload: Bytes) {
        if let Err(e) = self
            .shared
            .sender
            .send(RoomCommand::Broadcast { sender, payload })
            .await
        {
            tracing::warn!(
                "Room '{}' has stopped; dropping {} request",
                self.shared.id,
                e.0.kind()
            );
        }
    }

    /// Project the room, leaving `viewer` out of the user listing and the count.
    ///
    /// Returns `None` if the room has stopped.
    pub async fn wrap(&self, viewer: Option<ParticipantId>) -> Option<RoomView> {
        let (tx, rx) = oneshot::channel();
        self.shared
            .sender
            .send(RoomCommand::Snapshot {
                viewer,
                respond_to: tx,
            })
            .await
            .ok()?;

        rx.await.ok()
    }

    async fn submit(&self, command: RoomCommand, subject: &ParticipantId) {
        if let Err(e) = self.shared.sender.send(command).await {
            tracing::warn!(
                "Room '{}' has stopped; dropping {} request for '{}'",
                self.shared.id,
                e.0.kind(),
                subject
            );
        }
    }
}
