//! Logging setup shared by everything that drives simulations: binaries,
//! integration tests and ad-hoc tools.
pub mod tracing;
