//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements        | Connects to          |
//! |--------------|-------------------|----------------------|
//! | `log_sink`   | EventSink         | `log` facade         |
//!
//! Simulated temperature sources live in [`crate::sensors::sim`].

pub mod log_sink;
