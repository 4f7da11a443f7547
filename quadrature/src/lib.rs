#![cfg_attr(not(test), no_std)]

/// Edge/level decode policy of a counting channel
pub mod decode;

/// Configuration errors
pub mod error;
pub use error::Error;

/// Logging utilities
pub mod log;

/// Watchpoint events: producer, consumer and what they share
pub mod pipeline;

/// Bounded queue from interrupt context to a task
pub mod queue;

/// Installation of a counting unit
pub mod setup;

/// Pulse counting unit
pub mod unit;

/// Counter values that trigger an event
pub mod watchpoints;
