//! Concurrent room membership and broadcast hub.
//!
//! Connection handlers get a room from the [`Registry`], move a
//! [`Participant`] into it, and keep the matching [`Mailbox`] to drain
//! outbound payloads. Each room runs its own event loop that serializes
//! joins, leaves and broadcasts and evicts members that cannot keep up.
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use bytes::Bytes;
//! use roomcast_hub::{HubConfig, ParticipantId, Registry, RoomId};
//!
//! let registry = Registry::new(HubConfig::default())?;
//! let room = registry.get_or_create(&RoomId::new("lobby".to_string())?).await;
//!
//! let alice_id = ParticipantId::generate();
//! let (alice, mut mailbox) = registry.new_participant(alice_id.clone());
//! room.join(alice).await;
//! room.broadcast(Some(alice_id), Bytes::from_static(b"offer")).await;
//!
//! while let Some(payload) = mailbox.recv().await {
//!     println!("{} bytes for alice", payload.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod registry;
pub mod room;

pub use config::{ConfigError, HubConfig};
pub use domain::{
    HubError, Mailbox, MailboxError, Participant, ParticipantId, RegistryView, RoomId, RoomView,
    UserView, ValueObjectError,
};
pub use registry::Registry;
pub use room::{
    BroadcastPresence, LeaveReason, PresenceEvent, PresenceNotifier, RoomHandle, SilentPresence,
};
