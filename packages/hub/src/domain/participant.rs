//! Participant and its outbound mailbox.
//!
//! A participant is created as a pair: the [`Participant`] half is handed to a
//! room on join and owned by that room from then on, and the [`Mailbox`] half
//! stays with the connection that drains it. Dropping the participant (which
//! only the owning room does) closes the mailbox.

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::{MailboxError, ParticipantId};

/// Room-side half of a participant: identity plus the write end of its mailbox.
#[derive(Debug)]
pub struct Participant {
    id: ParticipantId,
    sender: mpsc::Sender<Bytes>,
    capacity: usize,
}

impl Participant {
    /// Create a participant and its mailbox.
    ///
    /// A `capacity` of 0 is raised to 1.
    pub fn new(id: ParticipantId, capacity: usize) -> (Self, Mailbox) {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let participant = Self {
            id: id.clone(),
            sender,
            capacity,
        };
        (participant, Mailbox { id, receiver })
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Push a payload without waiting.
    ///
    /// # Errors
    ///
    /// * `MailboxError::Full` - the reader has fallen `capacity` messages behind
    /// * `MailboxError::Closed` - the reader dropped or closed its mailbox
    pub fn try_deliver(&self, payload: Bytes) -> Result<(), MailboxError> {
        self.sender.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => MailboxError::Full,
            TrySendError::Closed(_) => MailboxError::Closed,
        })
    }
}

/// Connection-side half of a participant: the read end of its mailbox.
#[derive(Debug)]
pub struct Mailbox {
    id: ParticipantId,
    receiver: mpsc::Receiver<Bytes>,
}

impl Mailbox {
    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    /// Wait for the next payload.
    ///
    /// Returns `None` once the room has closed the mailbox and every queued
    /// payload has been read.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.receiver.recv().await
    }

    /// Take the next queued payload, if any, without waiting.
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.receiver.try_recv().ok()
    }

    /// Take every payload queued right now.
    pub fn drain(&mut self) -> Vec<Bytes> {
        let mut payloads = Vec::new();
        while let Ok(payload) = self.receiver.try_recv() {
            payloads.push(payload);
        }
        payloads
    }

    /// Number of payloads waiting to be read.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Whether the room side has closed this mailbox (or [`Mailbox::close`] was called).
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }

    /// Stop accepting payloads, e.g. when the connection terminates.
    ///
    /// The room notices on its next delivery attempt and removes the participant.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_participant(capacity: usize) -> (Participant, Mailbox) {
        Participant::new(ParticipantId::new("alice".to_string()).unwrap(), capacity)
    }

    #[test]
    fn test_try_deliver_until_full() {
        // テスト項目: 容量いっぱいまで配送でき、それ以上は Full になる
        // given (前提条件):
        let (participant, mut mailbox) = create_participant(2);

        // when (操作):
        let first = participant.try_deliver(Bytes::from_static(b"m1"));
        let second = participant.try_deliver(Bytes::from_static(b"m2"));
        let third = participant.try_deliver(Bytes::from_static(b"m3"));

        // then (期待する結果):
        assert_eq!(first, Ok(()));
        assert_eq!(second, Ok(()));
        assert_eq!(third, Err(MailboxError::Full));
        assert_eq!(mailbox.len(), 2);
        assert_eq!(
            mailbox.drain(),
            vec![Bytes::from_static(b"m1"), Bytes::from_static(b"m2")]
        );
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        // テスト項目: 容量 0 を指定しても 1 件は受け取れる
        // given (前提条件):
        let (participant, _mailbox) = create_participant(0);

        // when (操作):
        let result = participant.try_deliver(Bytes::from_static(b"m1"));

        // then (期待する結果):
        assert_eq!(participant.capacity(), 1);
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_try_deliver_after_reader_closed() {
        // テスト項目: 受信側が閉じた後の配送は Closed になる
        // given (前提条件):
        let (participant, mut mailbox) = create_participant(4);
        mailbox.close();

        // when (操作):
        let result = participant.try_deliver(Bytes::from_static(b"m1"));

        // then (期待する結果):
        assert_eq!(result, Err(MailboxError::Closed));
    }

    #[tokio::test]
    async fn test_dropping_participant_closes_mailbox_after_drain() {
        // テスト項目: Participant を破棄すると、残りを読み切った後に None が返る
        // given (前提条件):
        let (participant, mut mailbox) = create_participant(4);
        participant.try_deliver(Bytes::from_static(b"last")).unwrap();

        // when (操作):
        drop(participant);

        // then (期待する結果):
        assert!(mailbox.is_closed());
        assert_eq!(mailbox.recv().await, Some(Bytes::from_static(b"last")));
        assert_eq!(mailbox.recv().await, None);
    }
}
