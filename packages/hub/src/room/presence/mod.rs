//! Presence 通知
//!
//! ルームのイベントループは参加・退出・強制退出（eviction）が起きるたびに
//! `PresenceNotifier` を呼び出します。通知は spawn されたタスク上で実行されるため、
//! 実装が同じルームへ broadcast してもループがデッドロックすることはありません。
//!
//! ## 実装
//!
//! - `BroadcastPresence`: JSON のイベントをルームへ broadcast する（デフォルト）
//! - `SilentPresence`: 何もしない

pub mod broadcast;

pub use broadcast::{BroadcastPresence, SilentPresence};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ParticipantId, UserView};

use super::RoomHandle;

/// 参加者がルームから外れた理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeaveReason {
    /// 明示的な leave リクエスト
    Left,
    /// mailbox が満杯で配送できなかった（slow consumer）
    Evicted,
    /// 受信側が mailbox を閉じていた（接続終了）
    Disconnected,
}

/// ルームの他の参加者に伝えるイベント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PresenceEvent {
    ParticipantJoined {
        room: String,
        user: UserView,
    },
    ParticipantLeft {
        room: String,
        user: UserView,
        reason: LeaveReason,
    },
}

/// Presence 通知の抽象化
///
/// `subject` はイベントの対象となった参加者。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceNotifier: Send + Sync {
    async fn notify(&self, room: RoomHandle, subject: ParticipantId, event: PresenceEvent);
}
