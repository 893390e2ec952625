// Composition of the orchestration core: wires the messenger, fetcher, router and
// bootstrapper around shared ports and starts the refresh worker.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::domain::{ChatBackend, ConversationView, InitError, SessionContext, Sleeper};
use crate::use_cases::bootstrap::SessionBootstrapper;
use crate::use_cases::messenger::{ChatMessenger, MessengerEvent};
use crate::use_cases::reservations::{ReservationFetcher, RetryPolicy};
use crate::use_cases::router::UiEventRouter;

// One queued refresh is enough: it reads the latest backend state when it runs.
pub const REFRESH_CHANNEL_CAPACITY: usize = 1;

pub struct ChatController {
    pub messenger: Arc<ChatMessenger>,
    pub fetcher: Arc<ReservationFetcher>,
    pub router: Arc<UiEventRouter>,
    bootstrapper: SessionBootstrapper,
    refresh_rx: Mutex<Option<mpsc::Receiver<MessengerEvent>>>,
}

impl ChatController {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        view: Arc<dyn ConversationView>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        let (refresh_tx, refresh_rx) = mpsc::channel(REFRESH_CHANNEL_CAPACITY);
        let messenger = Arc::new(ChatMessenger::new(
            backend.clone(),
            view.clone(),
            refresh_tx,
        ));
        let fetcher = Arc::new(ReservationFetcher::new(
            backend.clone(),
            view.clone(),
            sleeper,
            policy,
        ));
        let router = Arc::new(UiEventRouter::new(messenger.clone(), view.clone()));
        let bootstrapper = SessionBootstrapper::new(
            backend,
            view,
            messenger.clone(),
            fetcher.clone(),
            router.clone(),
        );

        Self {
            messenger,
            fetcher,
            router,
            bootstrapper,
            refresh_rx: Mutex::new(Some(refresh_rx)),
        }
    }

    /// Runs the bootstrap and, on success, spawns the reservation refresh worker.
    ///
    /// The returned handle ends once the messenger (the only event sender) is dropped.
    pub async fn start(&self) -> Result<(SessionContext, JoinHandle<()>), InitError> {
        let context = self.bootstrapper.run().await?;
        let refresh_rx = self
            .refresh_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(refresh_rx) = refresh_rx else {
            warn!("refresh worker already started.");
            return Err(InitError::AlreadyBootstrapped);
        };
        let worker = tokio::spawn(
            self.fetcher
                .clone()
                .run_refresh_worker(context.identity.clone(), refresh_rx),
        );
        Ok((context, worker))
    }
}
