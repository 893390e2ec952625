// One-time, strictly ordered session startup.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};

use crate::domain::{
    ChatBackend, ConversationView, HistoryLoadFailed, InitError, Message, SessionContext,
};
use crate::use_cases::messenger::ChatMessenger;
use crate::use_cases::reservations::ReservationFetcher;
use crate::use_cases::router::UiEventRouter;

pub const GREETING: &str = "Hello! How can I help you today?";
pub const INIT_FAILED_NOTICE: &str = "Error initializing the app. Please refresh the page.";

// Bootstrap use case with injected collaborators.
pub struct SessionBootstrapper {
    pub backend: Arc<dyn ChatBackend>,
    pub view: Arc<dyn ConversationView>,
    pub messenger: Arc<ChatMessenger>,
    pub fetcher: Arc<ReservationFetcher>,
    pub router: Arc<UiEventRouter>,
    started: AtomicBool,
}

impl SessionBootstrapper {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        view: Arc<dyn ConversationView>,
        messenger: Arc<ChatMessenger>,
        fetcher: Arc<ReservationFetcher>,
        router: Arc<UiEventRouter>,
    ) -> Self {
        Self {
            backend,
            view,
            messenger,
            fetcher,
            router,
            started: AtomicBool::new(false),
        }
    }

    #[tracing::instrument(name = "bootstrap", skip_all)]
    pub async fn run(&self) -> Result<SessionContext, InitError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(InitError::AlreadyBootstrapped);
        }

        let context = match self.open_session().await {
            Ok(context) => context,
            Err(e) => {
                error!(error = %e, "initialization failed.");
                self.view.append_message(&Message::received(INIT_FAILED_NOTICE));
                return Err(e);
            }
        };

        // History failures are rendered inline and never abort startup.
        let history = match self.backend.load_history(&context.session).await {
            Ok(history) => {
                if history.is_empty() {
                    self.view.append_message(&Message::received(GREETING));
                }
                history
            }
            // The error line is the only entry rendered; no greeting follows it.
            Err(e) => {
                let failure = HistoryLoadFailed(e.to_string());
                warn!(error = %failure, "continuing without history.");
                self.view
                    .append_message(&Message::received(format!("Error loading messages: {e}")));
                Vec::new()
            }
        };
        if self.messenger.attach(context.clone(), history).is_err() {
            return Err(InitError::AlreadyBootstrapped);
        }

        if let Err(e) = self.fetcher.fetch(&context.identity).await {
            warn!(error = %e, "starting without reservations.");
        }

        self.router.arm();
        info!(user_id = %context.identity, chat_id = %context.session, "session ready.");
        Ok(context)
    }

    async fn open_session(&self) -> Result<SessionContext, InitError> {
        let identity = self
            .backend
            .fetch_identity()
            .await
            .map_err(|e| InitError::IdentityUnavailable(e.to_string()))?;
        info!(user_id = %identity, "identity acquired.");

        let session = self
            .backend
            .create_session(&identity)
            .await
            .map_err(|e| InitError::SessionCreationFailed(e.to_string()))?;
        info!(chat_id = %session, "chat session created.");

        Ok(SessionContext { identity, session })
    }
}
