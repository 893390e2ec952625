use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::entities::{
    Direction, Identity, Message, Reservation, ReservationList, SessionId,
};
use crate::domain::ports::{BackendError, ChatBackend, ConversationView, Sleeper};

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub identity: bool,
    pub session: bool,
    pub history: bool,
    pub send: bool,
}

// Scriptable backend that records which calls were made, in order.
pub(crate) struct FakeBackend {
    failures: FailureFlags,
    user_id: String,
    chat_id: String,
    history: Vec<Message>,
    reply: Option<String>,
    // Popped per reservation call; an empty script answers with no reservations.
    reservations: Mutex<VecDeque<Result<Vec<Reservation>, String>>>,
    // When set, sends park until the test releases them.
    send_gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            failures: FailureFlags::default(),
            user_id: "u1".to_string(),
            chat_id: "c1".to_string(),
            history: Vec::new(),
            reply: Some("hi".to_string()),
            reservations: Mutex::new(VecDeque::new()),
            send_gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn with_ids(mut self, user_id: &str, chat_id: &str) -> Self {
        self.user_id = user_id.to_string();
        self.chat_id = chat_id.to_string();
        self
    }

    pub(crate) fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub(crate) fn with_reply(mut self, reply: Option<&str>) -> Self {
        self.reply = reply.map(str::to_string);
        self
    }

    pub(crate) fn with_reservation_script(
        self,
        script: Vec<Result<Vec<Reservation>, String>>,
    ) -> Self {
        *self.reservations.lock().expect("script mutex poisoned") = script.into();
        self
    }

    pub(crate) fn with_send_gate(mut self, gate: Arc<Notify>) -> Self {
        self.send_gate = Some(gate);
        self
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|name| **name == call).count()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().expect("calls mutex poisoned").push(call);
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn fetch_identity(&self) -> Result<Identity, BackendError> {
        self.record("identity");
        if self.failures.identity {
            return Err("identity failed".into());
        }
        Identity::parse(self.user_id.clone()).ok_or_else(|| "blank user id".into())
    }

    async fn create_session(&self, _identity: &Identity) -> Result<SessionId, BackendError> {
        self.record("session");
        if self.failures.session {
            return Err("session failed".into());
        }
        SessionId::parse(self.chat_id.clone()).ok_or_else(|| "blank chat id".into())
    }

    async fn load_history(&self, _session: &SessionId) -> Result<Vec<Message>, BackendError> {
        self.record("history");
        if self.failures.history {
            return Err("history failed".into());
        }
        Ok(self.history.clone())
    }

    async fn send_question(
        &self,
        _identity: &Identity,
        _session: &SessionId,
        _question: &str,
    ) -> Result<Option<String>, BackendError> {
        self.record("send");
        if let Some(gate) = &self.send_gate {
            gate.notified().await;
        }
        if self.failures.send {
            return Err("connection refused".into());
        }
        Ok(self.reply.clone())
    }

    async fn fetch_reservations(
        &self,
        _identity: &Identity,
    ) -> Result<Vec<Reservation>, BackendError> {
        self.record("reservations");
        let next = self
            .reservations
            .lock()
            .expect("script mutex poisoned")
            .pop_front();
        match next {
            Some(Ok(list)) => Ok(list),
            Some(Err(message)) => Err(message.into()),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ViewEvent {
    Message(Direction, String),
    Pending(bool),
    InputCleared,
    Reservations(ReservationList),
    Panel(bool),
}

// View that keeps every call so tests can assert on rendering order.
#[derive(Default)]
pub(crate) struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub(crate) fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().expect("events mutex poisoned").clone()
    }

    pub(crate) fn messages(&self) -> Vec<(Direction, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ViewEvent::Message(direction, text) => Some((direction, text)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_reservations(&self) -> Option<ReservationList> {
        self.events().into_iter().rev().find_map(|event| match event {
            ViewEvent::Reservations(list) => Some(list),
            _ => None,
        })
    }

    fn push(&self, event: ViewEvent) {
        self.events.lock().expect("events mutex poisoned").push(event);
    }
}

impl ConversationView for RecordingView {
    fn append_message(&self, message: &Message) {
        self.push(ViewEvent::Message(message.direction, message.text.clone()));
    }

    fn set_pending(&self, visible: bool) {
        self.push(ViewEvent::Pending(visible));
    }

    fn clear_input(&self) {
        self.push(ViewEvent::InputCleared);
    }

    fn set_reservations(&self, list: &ReservationList) {
        self.push(ViewEvent::Reservations(list.clone()));
    }

    fn set_panel_open(&self, open: bool) {
        self.push(ViewEvent::Panel(open));
    }
}

// Sleeper that returns immediately and remembers each requested wait.
#[derive(Default)]
pub(crate) struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub(crate) fn waits(&self) -> Vec<Duration> {
        self.waits.lock().expect("waits mutex poisoned").clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().expect("waits mutex poisoned").push(duration);
    }
}

pub(crate) fn reservation(day: &str, time: &str) -> Reservation {
    Reservation {
        day: day.parse().expect("test dates are ISO formatted"),
        time: time.to_string(),
    }
}
