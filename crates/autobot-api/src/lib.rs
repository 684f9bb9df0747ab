//! Health check endpoint for the WATI AutoBot.
//!
//! Lets the hosting platform see that the process is alive. It never looks
//! at the browser, so it reports healthy whatever the bot is doing.

mod error;
mod health;
mod server;

pub use error::ApiError;
pub use health::{create_router, HEALTH_BODY};
pub use server::{HealthConfig, HealthServer};
