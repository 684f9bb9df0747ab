//! Operator interaction for the supervised login.

use async_trait::async_trait;
use tracing::info;

use crate::error::FlowError;

/// Blocks until a human operator confirms they finished logging in.
#[async_trait]
pub trait OperatorPrompt: Send + Sync {
    async fn wait_for_operator(&self, message: &str) -> Result<(), FlowError>;
}

/// Reads one line from the process's standard input.
///
/// The read runs on the blocking thread pool so the health endpoint keeps
/// serving while the operator works.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

#[async_trait]
impl OperatorPrompt for StdinPrompt {
    async fn wait_for_operator(&self, message: &str) -> Result<(), FlowError> {
        info!("Waiting for operator confirmation");

        let message = message.to_string();
        let read = tokio::task::spawn_blocking(move || {
            println!();
            println!("============================");
            println!("MANUAL LOGIN REQUIRED");
            println!("============================");
            println!("{}", message);
            println!("Press ENTER after login is complete...");

            let mut line = String::new();
            std::io::stdin().read_line(&mut line)
        })
        .await
        .map_err(|e| FlowError::Prompt(e.to_string()))?;

        match read {
            Ok(0) => Err(FlowError::Prompt("stdin closed".to_string())),
            Ok(_) => Ok(()),
            Err(e) => Err(FlowError::Prompt(e.to_string())),
        }
    }
}
