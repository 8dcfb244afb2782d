//! thermctl library.
//!
//! A simulated thermal control loop: a bank of temperature sensors feeds
//! a piecewise-linear fan curve, a thermal supervisor watches for
//! critical and emergency temperatures, and a [`controller::ThermalController`]
//! runs the whole thing on a cancellable background thread.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod controller;
pub mod drivers;
pub mod error;
pub mod safety;
pub mod sensors;

pub use error::{Error, Result};

// Links the std critical-section implementation behind embassy-sync's
// `CriticalSectionRawMutex`.
use critical_section as _;

/// Longest sensor/fan id or location label, in bytes.
pub const LABEL_LEN: usize = 24;

/// Fixed-capacity id/location string.
pub type Label = heapless::String<LABEL_LEN>;

/// Build a [`Label`], rejecting strings that do not fit.
pub fn label(s: &str) -> Result<Label> {
    Label::try_from(s).map_err(|()| Error::Config("label longer than 24 bytes"))
}
