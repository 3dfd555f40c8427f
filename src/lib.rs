//! ctorize library crate
//!
//! Exposes the conversion engine and the file-level driver so benchmarks and
//! tests can exercise them without going through CLI startup.

pub mod config;
pub mod discover;
pub mod engine;
pub mod error;
pub mod repair;
pub mod runner;
pub mod util;
