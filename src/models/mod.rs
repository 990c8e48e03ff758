//! Models Module - Data Structures & Configuration
//!
//! Wire and storage types, validation, errors and configuration.

pub mod config;
pub mod errors;
pub mod types;
pub mod validation;

pub use config::*;
pub use errors::*;
pub use types::*;
pub use validation::*;
