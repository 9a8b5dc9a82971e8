//! Read-only projections of live room state.
//!
//! These are point-in-time copies; nothing here refers back to a room's
//! membership. Field names are the JSON contract consumed by reporting layers.

use serde::{Deserialize, Serialize};

use roomcast_shared::time::timestamp_to_rfc3339;

use super::ParticipantId;

/// Summary of one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    /// RFC 3339 (UTC) time the room processed the join
    pub joined_at: String,
}

impl UserView {
    pub fn new(id: &ParticipantId, joined_at_millis: i64) -> Self {
        Self {
            id: id.as_str().to_string(),
            joined_at: timestamp_to_rfc3339(joined_at_millis),
        }
    }
}

/// Projection of one room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomView {
    pub name: String,
    /// Number of users listed when the projection was taken
    pub online: usize,
    pub users: Vec<UserView>,
}

impl RoomView {
    /// Build a room view. Users are sorted by id for stable output.
    pub fn new(name: String, online: usize, mut users: Vec<UserView>) -> Self {
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            name,
            online,
            users,
        }
    }
}

/// Projection of every registered room
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryView {
    pub online: usize,
    pub rooms: Vec<RoomView>,
}

impl RegistryView {
    /// Aggregate room views. Rooms are sorted by name.
    pub fn from_rooms(mut rooms: Vec<RoomView>) -> Self {
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        let online = rooms.iter().map(|room| room.online).sum();
        Self { online, rooms }
    }
}
