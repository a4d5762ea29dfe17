//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for Ctrl+C
//! - Translate it into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Wait until the process receives Ctrl+C.
pub async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received");
    Ok(())
}

/// Trigger `shutdown` when Ctrl+C arrives.
pub fn shutdown_on_signal(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(()) => shutdown.trigger(),
            Err(e) => tracing::error!(error = %e, "Failed to install Ctrl+C handler"),
        }
    })
}
