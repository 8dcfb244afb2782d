//! Application core: pure control logic, zero threads.
//!
//! [`service::ThermalService`] runs one control tick at a time.  All
//! interaction with the outside world happens through the **port traits**
//! in [`ports`], so every tick is testable with scripted sources and a
//! recording event sink.

pub mod events;
pub mod ports;
pub mod service;
