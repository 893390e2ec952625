// Resilient reservation loading with bounded retries and exponential backoff.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::{
    ChatBackend, ConversationView, ExhaustedRetries, Identity, Message, Reservation,
    ReservationList, Sleeper,
};
use crate::use_cases::messenger::MessengerEvent;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);
// Each wait is this many times longer than the previous one.
pub const BACKOFF_MULTIPLIER: u32 = 2;

pub const RESERVATIONS_FAILED_NOTICE: &str = "Failed to load reservations. Please try again later.";

/// Attempt budget and first wait for one `fetch` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubled before every further attempt.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

/// Loads the visitor's reservations and owns the cached list.
pub struct ReservationFetcher {
    backend: Arc<dyn ChatBackend>,
    view: Arc<dyn ConversationView>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    current: Mutex<Vec<Reservation>>,
}

impl ReservationFetcher {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        view: Arc<dyn ConversationView>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            view,
            sleeper,
            policy,
            current: Mutex::new(Vec::new()),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Last successfully fetched list. Empty until the first success.
    pub fn current(&self) -> Vec<Reservation> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Fetches with the configured policy, replacing the list on success and
    /// rendering the terminal error state once the budget is spent.
    pub async fn fetch(&self, identity: &Identity) -> Result<Vec<Reservation>, ExhaustedRetries> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts_remaining = max_attempts;
        let mut delay = self.policy.initial_delay;

        let last_error = loop {
            let attempt = max_attempts - attempts_remaining + 1;
            match self.backend.fetch_reservations(identity).await {
                Ok(reservations) => {
                    info!(attempt, count = reservations.len(), "reservations loaded.");
                    self.replace(reservations.clone());
                    return Ok(reservations);
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "failed to load reservations.");
                    attempts_remaining -= 1;
                    if attempts_remaining == 0 {
                        break e.to_string();
                    }
                    self.sleeper.sleep(delay).await;
                    delay = delay.saturating_mul(BACKOFF_MULTIPLIER);
                }
            }
        };

        self.view.set_reservations(&ReservationList::Unavailable);
        self.view
            .append_message(&Message::received(RESERVATIONS_FAILED_NOTICE));
        Err(ExhaustedRetries {
            attempts: max_attempts,
            last_error,
        })
    }

    /// Consumes messenger events until the sender side is gone. Refreshes run
    /// one at a time, so fetches triggered by sends never overlap.
    pub async fn run_refresh_worker(
        self: Arc<Self>,
        identity: Identity,
        mut events: mpsc::Receiver<MessengerEvent>,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                MessengerEvent::ExchangeCompleted => {
                    debug!("refreshing reservations after exchange.");
                    if let Err(e) = self.fetch(&identity).await {
                        warn!(error = %e, "reservation refresh gave up.");
                    }
                }
            }
        }
        debug!("refresh worker stopped.");
    }

    fn replace(&self, reservations: Vec<Reservation>) {
        let list = ReservationList::from_entries(reservations.clone());
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = reservations;
        self.view.set_reservations(&list);
    }
}
