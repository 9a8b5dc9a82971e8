//! ルームへの broadcast による PresenceNotifier 実装

use async_trait::async_trait;
use bytes::Bytes;

use crate::{domain::ParticipantId, room::RoomHandle};

use super::{PresenceEvent, PresenceNotifier};

/// イベントを JSON にしてルームへ broadcast する
///
/// 対象の参加者自身は送信者として扱われるため、本人には届かない。
#[derive(Debug, Clone, Copy, Default)]
pub struct BroadcastPresence;

#[async_trait]
impl PresenceNotifier for BroadcastPresence {
    async fn notify(&self, room: RoomHandle, subject: ParticipantId, event: PresenceEvent) {
        let payload = match serde_json::to_vec(&event) {
            Ok(json) => Bytes::from(json),
            Err(e) => {
                tracing::warn!("Failed to serialize presence event: {}", e);
                return;
            }
        };

        room.broadcast(Some(subject), payload).await;
    }
}

/// 何も通知しない
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPresence;

#[async_trait]
impl PresenceNotifier for SilentPresence {
    async fn notify(&self, _room: RoomHandle, _subject: ParticipantId, _event: PresenceEvent) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::HubConfig,
        domain::{Participant, RoomId, UserView},
        room::presence::LeaveReason,
    };
    use roomcast_shared::time::FixedClock;

    fn id(value: &str) -> ParticipantId {
        ParticipantId::new(value.to_string()).unwrap()
    }

    fn spawn_silent_room() -> RoomHandle {
        let (room, _task) = RoomHandle::spawn(
            RoomId::new("r1".to_string()).unwrap(),
            &HubConfig::default(),
            Arc::new(SilentPresence),
            Arc::new(FixedClock::new(0)),
        );
        room
    }

    #[tokio::test]
    async fn test_broadcast_presence_reaches_others_but_not_subject() {
        // テスト項目: Presence イベントが対象者以外に JSON で届く
        // given (前提条件):
        let room = spawn_silent_room();
        let (alice, mut alice_mailbox) = Participant::new(id("alice"), 8);
        let (bob, mut bob_mailbox) = Participant::new(id("bob"), 8);
        room.join(alice).await;
        room.join(bob).await;

        let event = PresenceEvent::ParticipantLeft {
            room: "r1".to_string(),
            user: UserView::new(&id("alice"), 0),
            reason: LeaveReason::Left,
        };

        // when (操作):
        BroadcastPresence.notify(room.clone(), id("alice"), event.clone()).await;
        room.wrap(None).await;

        // then (期待する結果):
        let received = bob_mailbox.try_recv().unwrap();
        let decoded: PresenceEvent = serde_json::from_slice(&received).unwrap();
        assert_eq!(decoded, event);
        assert!(alice_mailbox.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_silent_presence_sends_nothing() {
        // テスト項目: SilentPresence は何も配送しない
        // given (前提条件):
        let room = spawn_silent_room();
        let (bob, mut bob_mailbox) = Participant::new(id("bob"), 8);
        room.join(bob).await;

        let event = PresenceEvent::ParticipantJoined {
            room: "r1".to_string(),
            user: UserView::new(&id("alice"), 0),
        };

        // when (操作):
        SilentPresence.notify(room.clone(), id("alice"), event).await;
        room.wrap(None).await;

        // then (期待する結果):
        assert!(bob_mailbox.try_recv().is_none());
    }
}
