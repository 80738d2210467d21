//! Waiting for the database to accept queries.
//!
//! Containers usually start the service and its database together; the
//! server must not run migrations or bind its listener before the database
//! answers. [`WaitForDatabase`] polls a [`ConnectionProbe`] until it succeeds.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{AccountError, Result};

/// Something that can cheaply check whether the database is reachable.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    async fn probe(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct WaitForDatabase {
    /// Pause after each failed probe
    pub interval: Duration,
    /// `None` waits forever
    pub max_attempts: Option<u32>,
}

impl Default for WaitForDatabase {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

impl WaitForDatabase {
    pub fn new(interval: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Probe until the database answers. Returns the number of probes made.
    pub async fn run<P>(&self, probe: &P) -> Result<u32>
    where
        P: ConnectionProbe + ?Sized,
    {
        info!("Waiting for database...");
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match probe.probe().await {
                Ok(()) => {
                    info!(attempts, "Database available!");
                    return Ok(attempts);
                }
                Err(err) => {
                    if self.max_attempts.is_some_and(|max| attempts >= max) {
                        return Err(AccountError::Unavailable(format!(
                            "database not reachable after {attempts} attempts: {err}"
                        )));
                    }
                    warn!(
                        attempts,
                        error = %err,
                        "Database unavailable, waiting {:?}...",
                        self.interval
                    );
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
    }
}
