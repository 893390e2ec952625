// Send/receive state machine for the single active chat session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::{ChatBackend, ConversationView, Message, SendFailed, SessionContext};

pub const NO_REPLY_FALLBACK: &str = "Sorry, I couldn't process your request.";

/// Messenger state. There is no terminal state; it cycles for the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    Sending,
}

/// Events the messenger emits for other components to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessengerEvent {
    /// A send completed with a usable reply; reservation data may have changed.
    ExchangeCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Blank,
    NoSession,
    Busy,
}

/// Result of one `submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored(IgnoreReason),
    Replied,
    NoReply,
    Failed(SendFailed),
}

pub struct ChatMessenger {
    backend: Arc<dyn ChatBackend>,
    view: Arc<dyn ConversationView>,
    // Set once by the bootstrapper.
    session: OnceLock<SessionContext>,
    conversation: Mutex<Vec<Message>>,
    // PendingSendFlag: true exactly while one send awaits its response.
    pending: AtomicBool,
    events: mpsc::Sender<MessengerEvent>,
}

impl ChatMessenger {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        view: Arc<dyn ConversationView>,
        events: mpsc::Sender<MessengerEvent>,
    ) -> Self {
        Self {
            backend,
            view,
            session: OnceLock::new(),
            conversation: Mutex::new(Vec::new()),
            pending: AtomicBool::new(false),
            events,
        }
    }

    /// Binds the session and rehydrates the conversation from backend history.
    ///
    /// Returns the rejected context if a session was already attached.
    pub fn attach(
        &self,
        context: SessionContext,
        history: Vec<Message>,
    ) -> Result<(), SessionContext> {
        self.session.set(context)?;
        for message in history {
            self.record(message);
        }
        Ok(())
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.get()
    }

    pub fn state(&self) -> SendState {
        if self.pending.load(Ordering::Acquire) {
            SendState::Sending
        } else {
            SendState::Idle
        }
    }

    pub fn conversation(&self) -> Vec<Message> {
        self.lock_conversation().clone()
    }

    #[tracing::instrument(name = "submit", skip_all, fields(chars = text.chars().count()))]
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let question = text.trim();
        if question.is_empty() {
            return SubmitOutcome::Ignored(IgnoreReason::Blank);
        }
        let Some(context) = self.session.get() else {
            debug!("submit before session is attached.");
            return SubmitOutcome::Ignored(IgnoreReason::NoSession);
        };
        // Check-and-set in one step so two submits can never both pass.
        let Some(mut pending) = PendingSend::acquire(&self.pending, self.view.as_ref()) else {
            debug!("send already in flight.");
            return SubmitOutcome::Ignored(IgnoreReason::Busy);
        };

        self.record(Message::sent(question));
        self.view.clear_input();
        pending.show_indicator();

        let result = self
            .backend
            .send_question(&context.identity, &context.session, question)
            .await;
        pending.dismiss_indicator();

        match result {
            Ok(Some(reply)) if !reply.trim().is_empty() => {
                self.record(Message::received(reply));
                self.emit(MessengerEvent::ExchangeCompleted);
                info!("reply received.");
                SubmitOutcome::Replied
            }
            Ok(_) => {
                warn!("backend answered without a reply.");
                self.record(Message::received(NO_REPLY_FALLBACK));
                SubmitOutcome::NoReply
            }
            Err(e) => {
                warn!(error = %e, "failed to send message.");
                self.record(Message::received(format!("Error: {e}")));
                SubmitOutcome::Failed(SendFailed(e.to_string()))
            }
        }
        // `pending` drops here and returns the messenger to Idle.
    }

    fn record(&self, message: Message) {
        self.view.append_message(&message);
        self.lock_conversation().push(message);
    }

    fn emit(&self, event: MessengerEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            // A refresh is already queued; it will observe this exchange too.
            Err(mpsc::error::TrySendError::Full(_)) => debug!(?event, "event coalesced."),
            Err(mpsc::error::TrySendError::Closed(_)) => warn!(?event, "no event subscriber."),
        }
    }

    fn lock_conversation(&self) -> MutexGuard<'_, Vec<Message>> {
        // A poisoned lock still holds a valid append-only log.
        self.conversation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// Holds the pending flag for the lifetime of one send. Dropping it resets the
// messenger to Idle on every exit path, including a dropped submit future.
struct PendingSend<'a> {
    flag: &'a AtomicBool,
    view: &'a dyn ConversationView,
    indicator_visible: bool,
}

impl<'a> PendingSend<'a> {
    fn acquire(flag: &'a AtomicBool, view: &'a dyn ConversationView) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            flag,
            view,
            indicator_visible: false,
        })
    }

    fn show_indicator(&mut self) {
        self.view.set_pending(true);
        self.indicator_visible = true;
    }

    fn dismiss_indicator(&mut self) {
        if self.indicator_visible {
            self.view.set_pending(false);
            self.indicator_visible = false;
        }
    }
}

impl Drop for PendingSend<'_> {
    fn drop(&mut self) {
        self.dismiss_indicator();
        self.flag.store(false, Ordering::Release);
    }
}
