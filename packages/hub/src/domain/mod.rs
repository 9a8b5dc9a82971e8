//! Domain layer: value objects, participants and read-only projections.

pub mod error;
pub mod participant;
pub mod value_object;
pub mod view;

pub use error::{HubError, MailboxError, ValueObjectError};
pub use participant::{Mailbox, Participant};
pub use value_object::{ParticipantId, RoomId};
pub use view::{RegistryView, RoomView, UserView};
