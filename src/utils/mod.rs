//! Utilities Module
//!
//! Hashing helpers, logging and signer configuration.

pub mod config;
pub mod hashing;
pub mod logging;

pub use config::*;
pub use hashing::*;
