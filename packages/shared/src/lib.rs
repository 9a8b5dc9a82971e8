//! Utilities shared by the roomcast packages.

pub mod logger;
pub mod signal;
pub mod time;
