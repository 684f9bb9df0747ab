//! # AutoBot Flow
//!
//! The WATI team-inbox automation: restoring the saved login profile,
//! logging in, and tagging unread conversations with the routing flow.
//!
//! Components, leaf first:
//!
//! - [`session`]: the on-disk session artifact and the bundled profile archive
//! - [`page`]: the page adapter, the only code that knows WATI's markup
//! - [`login`]: the login state machine
//! - [`poller`]: the unread-conversation loop
//! - [`bot`]: wires the above to a real Chromium

pub mod bot;
pub mod error;
pub mod login;
pub mod page;
pub mod poller;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use bot::BotFlow;
pub use error::{FlowError, PageError};
pub use login::{LoginController, LoginOutcome, LoginState, OperatorPrompt, StdinPrompt};
pub use page::{CdpInboxPage, InboxPage, UnreadConversation};
pub use poller::{CycleReport, InboxPoller};
pub use session::{ProfileStore, RestoreOutcome, SessionStore};
