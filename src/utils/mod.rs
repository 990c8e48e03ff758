//! Utils Module - Helper Functions & Shared Utilities

pub mod clock;
pub mod constants;
pub mod password;
pub mod telemetry;

pub use constants::*;
pub use telemetry::*;
