//! Error types for the room hub.

use thiserror::Error;

/// Registry errors returned to the connection-handling caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// No room is registered under the given ID
    #[error("Room '{0}' not found")]
    NotFound(String),

    /// A room is already registered under the given ID
    #[error("Room with id '{0}' already exists")]
    AlreadyExists(String),
}

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("ID must not be empty")]
    Empty,

    #[error("ID is too long (max {max} bytes, got {actual})")]
    TooLong { max: usize, actual: usize },
}

/// Outcome of a failed non-blocking mailbox delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// The mailbox is at capacity (slow consumer)
    #[error("Mailbox is full")]
    Full,

    /// The reading side of the mailbox has gone away
    #[error("Mailbox is closed")]
    Closed,
}
