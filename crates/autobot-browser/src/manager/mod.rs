//! Browser instance manager.
//!
//! Launches Chrome against a persistent profile directory and hands out the
//! single page the bot drives.

mod manager_core;
mod manager_types;

pub use manager_core::BrowserManager;
pub use manager_types::{BrowserError, BrowserManagerConfig};

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
