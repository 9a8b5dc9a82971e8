//! Room registry.
//!
//! The registry maps room IDs to running rooms. It is the one piece of state
//! touched by many connection handlers at once, so every read-modify-write
//! of the map happens inside a single critical section under its mutex.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use roomcast_shared::time::{Clock, SystemClock};

use crate::{
    config::{ConfigError, HubConfig},
    domain::{HubError, Mailbox, Participant, ParticipantId, RegistryView, RoomId},
    room::{BroadcastPresence, PresenceNotifier, RoomHandle},
};

pub(crate) type RoomMap = HashMap<RoomId, RoomHandle>;

/// Registry of live rooms
///
/// Cloning is cheap; clones share the same rooms.
#[derive(Clone)]
pub struct Registry {
    rooms: Arc<Mutex<RoomMap>>,
    config: HubConfig,
    notifier: Arc<dyn PresenceNotifier>,
    clock: Arc<dyn Clock>,
}

impl Registry {
    /// Create an empty registry.
    ///
    /// Rooms created by this registry announce joins and departures with
    /// [`BroadcastPresence`] and stamp joins with the system clock.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `config` fails validation.
    pub fn new(config: HubConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            config,
            notifier: Arc::new(BroadcastPresence),
            clock: Arc::new(SystemClock),
        })
    }

    /// Use `notifier` for rooms created from now on.
    pub fn with_notifier(mut self, notifier: Arc<dyn PresenceNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Use `clock` for rooms created from now on.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Build a participant whose mailbox has the configured capacity.
    pub fn new_participant(&self, id: ParticipantId) -> (Participant, Mailbox) {
        Participant::new(id, self.config.mailbox_capacity)
    }

    /// Look up a room.
    ///
    /// # Errors
    ///
    /// * `HubError::NotFound` - no room is registered under `room_id`
    pub async fn get(&self, room_id: &RoomId) -> Result<RoomHandle, HubError> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| HubError::NotFound(room_id.to_string()))
    }

    /// Return the room registered under `room_id`, creating and starting it if absent.
    ///
    /// Concurrent callers racing on an unseen ID all receive the same room.
    pub async fn get_or_create(&self, room_id: &RoomId) -> RoomHandle {
        let mut rooms = self.rooms.lock().await;
        if let Some(room) = rooms.get(room_id) {
            return room.clone();
        }

        let (room, _task) = RoomHandle::spawn_in_table(
            room_id.clone(),
            &self.config,
            Arc::clone(&self.notifier),
            Arc::clone(&self.clock),
            Arc::downgrade(&self.rooms),
        );
        rooms.insert(room_id.clone(), room.clone());
        tracing::info!("Room '{}' created ({} room(s) live)", room_id, rooms.len());

        room
    }

    /// Register an already running room under `room_id`.
    ///
    /// Rooms registered this way are never reclaimed for idleness.
    ///
    /// # Errors
    ///
    /// * `HubError::AlreadyExists` - `room_id` is taken
    pub async fn add_room(&self, room_id: RoomId, room: RoomHandle) -> Result<(), HubError> {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(&room_id) {
            return Err(HubError::AlreadyExists(room_id.into_string()));
        }
        tracing::info!("Room '{}' registered", room_id);
        rooms.insert(room_id, room);
        Ok(())
    }

    /// Deregister a room. Removing an absent room is not an error.
    ///
    /// The room keeps running until every remaining handle to it is dropped.
    pub async fn remove_room(&self, room_id: &RoomId) -> Result<(), HubError> {
        let mut rooms = self.rooms.lock().await;
        if rooms.remove(room_id).is_some() {
            tracing::info!("Room '{}' removed", room_id);
        } else {
            tracing::debug!("Room '{}' not registered; nothing to remove", room_id);
        }
        Ok(())
    }

    /// Number of registered rooms.
    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.lock().await.is_empty()
    }

    /// Project every registered room.
    ///
    /// The lock is held only while copying the room list; each room is then
    /// asked for its own projection, so the result may be momentarily stale.
    /// Rooms that stop in the meantime are left out.
    pub async fn stats(&self) -> RegistryView {
        let rooms: Vec<RoomHandle> = {
            let rooms = self.rooms.lock().await;
            rooms.values().cloned().collect()
        };

        let mut views = Vec::with_capacity(rooms.len());
        for room in rooms {
            match room.wrap(None).await {
                Some(view) => views.push(view),
                None => tracing::debug!("Room '{}' stopped during stats", room.id()),
            }
        }

        RegistryView::from_rooms(views)
    }

    /// Stop every registered room and empty the registry.
    pub async fn shutdown(&self) {
        let rooms: Vec<(RoomId, RoomHandle)> = {
            let mut rooms = self.rooms.lock().await;
            rooms.drain().collect()
        };

        for (room_id, room) in &rooms {
            tracing::debug!("Shutting down room '{}'", room_id);
            room.shutdown();
        }
        tracing::info!("Registry shut down ({} room(s) stopped)", rooms.len());
    }
}
