//! Chromium control for the WATI AutoBot.
//!
//! A pure Rust Chrome DevTools Protocol client, plus the pieces around it
//! that the bot needs: provisioning the Chromium build, launching it against
//! a persistent profile directory, and moving authentication state in and out
//! of the browser context.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    WebSocket     ┌──────────────────┐
//! │  BrowserManager │ ◄──────────────► │     Chromium     │
//! │  + PageSession  │       CDP        │ (--user-data-dir)│
//! └─────────────────┘                  └──────────────────┘
//! ```
//!
//! The manager owns the Chromium child process. A single [`PageSession`] is
//! handed to the caller, which drives it for the lifetime of the process.

pub mod cdp;
pub mod installer;
pub mod manager;
pub mod storage;

pub use cdp::{CdpClient, CdpError, Cookie, PageSession};
pub use installer::BrowserInstaller;
pub use manager::{BrowserError, BrowserManager, BrowserManagerConfig};
pub use storage::{LocalStorageEntry, OriginStorage, StorageState};
