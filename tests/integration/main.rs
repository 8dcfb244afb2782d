//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with simulated or
//! scripted temperature sources only.

mod mock_sources;
mod service_tests;
