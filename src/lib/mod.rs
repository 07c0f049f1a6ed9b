//! Shared library modules providing error types and logging initialization.

pub mod errors;
pub mod telemetry;
