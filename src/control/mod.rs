//! Control laws: temperature → fan duty.

pub mod curve;
