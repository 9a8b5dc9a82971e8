//! Requests accepted by a room's event loop.

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::domain::{Participant, ParticipantId, RoomView};

/// One request in a room's queue. Requests are processed strictly in arrival order.
pub(crate) enum RoomCommand {
    Join(Participant),
    Leave(ParticipantId),
    Broadcast {
        /// `None` for a system message delivered to every member
        sender: Option<ParticipantId>,
        payload: Bytes,
    },
    Snapshot {
        /// Member left out of both the listing and `online`
        viewer: Option<ParticipantId>,
        respond_to: oneshot::Sender<RoomView>,
    },
}

impl RoomCommand {
    /// Short name for log lines.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Leave(_) => "leave",
            Self::Broadcast { .. } => "broadcast",
            Self::Snapshot { .. } => "snapshot",
        }
    }
}
