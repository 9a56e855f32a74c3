//! Update polling loop and cursor management.
//!
//! The cursor is the single piece of process-lifetime state: the next
//! unseen `update_id`. It advances past every dequeued update whether or
//! not handling succeeds, and stays frozen when the fetch itself fails so
//! the same window is retried.

use crate::bot::Router;
use crate::telegram::{ChatApi, TelegramError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Backoff after a failed update fetch
const ERROR_BACKOFF: Duration = Duration::from_secs(10);

/// Fetch failures tolerated in a row before the loop gives up; there is no
/// fallback cursor source, so persistent transport failure is fatal.
const MAX_CONSECUTIVE_FETCH_FAILURES: u32 = 10;

/// Long-polling loop owning the update cursor
pub struct Poller {
    api: Arc<dyn ChatApi>,
    router: Router,
    offset: i64,
    long_poll_timeout_secs: u64,
    idle_delay: Duration,
}

impl Poller {
    /// Create a poller starting from the beginning of the update queue.
    pub fn new(
        api: Arc<dyn ChatApi>,
        router: Router,
        long_poll_timeout_secs: u64,
        idle_delay: Duration,
    ) -> Self {
        Self {
            api,
            router,
            offset: 0,
            long_poll_timeout_secs,
            idle_delay,
        }
    }

    /// Next unseen update id
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    /// Fetch one batch and dispatch every contained message.
    ///
    /// The cursor is advanced past each update before its message is
    /// handled, so a handler failure never causes a redelivery. A fetch
    /// error leaves the cursor untouched.
    ///
    /// Returns the number of updates in the batch.
    pub async fn poll_once(&mut self) -> Result<usize, TelegramError> {
        let updates = self
            .api
            .get_updates(self.offset, self.long_poll_timeout_secs)
            .await?;

        let count = updates.len();
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);
            if let Some(message) = update.message {
                self.router.handle_message(&message).await;
            }
        }
        Ok(count)
    }

    /// Run the polling loop until persistent transport failure.
    pub async fn run(mut self) -> Result<(), TelegramError> {
        info!("polling for updates");
        let mut consecutive_failures = 0_u32;

        loop {
            match self.poll_once().await {
                Ok(count) => {
                    consecutive_failures = 0;
                    if count > 0 {
                        debug!(count, offset = self.offset, "processed update batch");
                    }
                    sleep(self.idle_delay).await;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    if consecutive_failures >= MAX_CONSECUTIVE_FETCH_FAILURES {
                        error!(error = %e, "update fetch failing persistently, giving up");
                        return Err(e);
                    }
                    warn!(
                        error = %e,
                        attempt = consecutive_failures,
                        "update fetch failed, retrying same window"
                    );
                    sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }
}
