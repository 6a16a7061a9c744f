//! Shared error helpers and small utilities used across switchyard crates.

pub mod error;
pub mod time;

pub use {error::FromMessage, time::now_ms};
