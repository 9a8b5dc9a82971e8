//! Hub configuration.

use std::time::Duration;

use thiserror::Error;

/// Default capacity of a participant's outbound mailbox
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Default capacity of a room's request queue
pub const DEFAULT_REQUEST_QUEUE_CAPACITY: usize = 64;

/// Default time a registry-created room may stay empty before it is reclaimed
pub const DEFAULT_IDLE_ROOM_TTL: Duration = Duration::from_secs(300);

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroCapacity(&'static str),

    #[error("idle_room_ttl must be greater than zero (use None to disable reclamation)")]
    ZeroTtl,
}

/// Tunables shared by a registry and the rooms it creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Mailbox capacity for participants built with `Registry::new_participant`
    pub mailbox_capacity: usize,
    /// How many requests a room buffers before callers wait
    pub request_queue_capacity: usize,
    /// `None` keeps empty rooms for the life of the process
    pub idle_room_ttl: Option<Duration>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            request_queue_capacity: DEFAULT_REQUEST_QUEUE_CAPACITY,
            idle_room_ttl: Some(DEFAULT_IDLE_ROOM_TTL),
        }
    }
}

impl HubConfig {
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    pub fn with_request_queue_capacity(mut self, capacity: usize) -> Self {
        self.request_queue_capacity = capacity;
        self
    }

    pub fn with_idle_room_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.idle_room_ttl = ttl;
        self
    }

    /// Check every value is usable.
    ///
    /// # Errors
    ///
    /// * `ConfigError::ZeroCapacity` - a capacity is zero
    /// * `ConfigError::ZeroTtl` - `idle_room_ttl` is `Some(Duration::ZERO)`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("mailbox_capacity"));
        }
        if self.request_queue_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("request_queue_capacity"));
        }
        if self.idle_room_ttl == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroTtl);
        }
        Ok(())
    }
}
