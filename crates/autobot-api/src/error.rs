//! Health server error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Host and port do not form a socket address.
    #[error("Invalid listen address {addr}: {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}
