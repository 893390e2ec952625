// Fake chat backend served over real HTTP, plus a view that records what was rendered.
#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chat_client::domain::{ConversationView, Direction, Message, ReservationList};
use serde_json::{Value, json};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU32, Ordering},
};
use std::time::Duration;
use tokio::sync::Notify;

// Behaviour of the fake backend for one test.
#[derive(Clone)]
pub struct BackendScript {
    pub user_id: String,
    pub chat_id: String,
    // (text, type) pairs returned from the history endpoint.
    pub history: Vec<(String, String)>,
    pub reply: Option<String>,
    // (day, time) pairs returned from the reservations endpoint.
    pub reservations: Vec<(String, String)>,
    pub identity_status: Option<StatusCode>,
    pub history_status: Option<StatusCode>,
    pub send_status: Option<StatusCode>,
    // Number of reservation calls answered with 500 before succeeding.
    pub reservation_failures: u32,
    // Park every send until `release_send` is called.
    pub hold_sends: bool,
}

impl Default for BackendScript {
    fn default() -> Self {
        Self {
            user_id: "u1".to_string(),
            chat_id: "c1".to_string(),
            history: Vec::new(),
            reply: Some("hi".to_string()),
            reservations: Vec::new(),
            identity_status: None,
            history_status: None,
            send_status: None,
            reservation_failures: 0,
            hold_sends: false,
        }
    }
}

struct BackendState {
    script: BackendScript,
    calls: Mutex<Vec<String>>,
    cookies: Mutex<Vec<Option<String>>>,
    reservation_failures_left: AtomicU32,
    send_gate: Notify,
}

impl BackendState {
    fn record(&self, call: impl Into<String>, headers: &HeaderMap) {
        self.calls.lock().expect("calls mutex poisoned").push(call.into());
        let cookie = headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.cookies.lock().expect("cookies mutex poisoned").push(cookie);
    }
}

pub struct FakeBackend {
    pub base_url: String,
    state: Arc<BackendState>,
}

impl FakeBackend {
    // Bind an ephemeral port and serve the fake routes on the current runtime.
    pub async fn spawn(script: BackendScript) -> Self {
        let state = Arc::new(BackendState {
            reservation_failures_left: AtomicU32::new(script.reservation_failures),
            script,
            calls: Mutex::new(Vec::new()),
            cookies: Mutex::new(Vec::new()),
            send_gate: Notify::new(),
        });

        let app = Router::new()
            .route("/get_user_id", get(get_user_id))
            .route("/create_chat/{user_id}", get(create_chat))
            .route("/chat/{id}/messages", get(history))
            .route("/chat/{id}/{chat_id}", post(send))
            .route("/reservations/{user_id}", get(reservations))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral test port");
        let addr = listener.local_addr().expect("get local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn cookies(&self) -> Vec<Option<String>> {
        self.state
            .cookies
            .lock()
            .expect("cookies mutex poisoned")
            .clone()
    }

    pub fn release_send(&self) {
        self.state.send_gate.notify_one();
    }

    // Poll until `prefix` calls reach `expected`, failing after a short deadline.
    pub async fn wait_for(&self, prefix: &str, expected: usize) {
        for _ in 0..200 {
            if self.count(prefix) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {expected} `{prefix}` calls, saw {:?}",
            self.calls()
        );
    }
}

async fn get_user_id(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.record("identity", &headers);
    if let Some(status) = state.script.identity_status {
        return (status, Json(json!({ "detail": "Failed to process user_id" }))).into_response();
    }
    (
        [(
            header::SET_COOKIE,
            format!("user_id={}; HttpOnly; Path=/", state.script.user_id),
        )],
        Json(json!({ "user_id": state.script.user_id })),
    )
        .into_response()
}

async fn create_chat(
    State(state): State<Arc<BackendState>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    state.record(format!("create_chat:{user_id}"), &headers);
    Json(json!({ "chat_id": state.script.chat_id }))
}

async fn history(
    State(state): State<Arc<BackendState>>,
    Path(chat_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.record(format!("history:{chat_id}"), &headers);
    if let Some(status) = state.script.history_status {
        return (status, Json(json!({ "detail": "Failed to fetch messages" }))).into_response();
    }
    let messages: Vec<Value> = state
        .script
        .history
        .iter()
        .map(|(text, kind)| json!({ "text": text, "type": kind }))
        .collect();
    Json(json!({ "messages": messages })).into_response()
}

async fn send(
    State(state): State<Arc<BackendState>>,
    Path((user_id, chat_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let question = body["question"].as_str().unwrap_or_default().to_string();
    state.record(format!("send:{user_id}/{chat_id}:{question}"), &headers);
    if state.script.hold_sends {
        state.send_gate.notified().await;
    }
    if let Some(status) = state.script.send_status {
        return (status, "model overloaded").into_response();
    }
    Json(json!({ "response": state.script.reply })).into_response()
}

async fn reservations(
    State(state): State<Arc<BackendState>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.record(format!("reservations:{user_id}"), &headers);
    let failing = state
        .reservation_failures_left
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(1))
        .is_ok();
    if failing {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "Failed to fetch reservations" })),
        )
            .into_response();
    }
    let reservations: Vec<Value> = state
        .script
        .reservations
        .iter()
        .map(|(day, time)| json!({ "day": day, "time": time }))
        .collect();
    Json(json!({ "reservations": reservations })).into_response()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Message(Direction, String),
    Pending(bool),
    InputCleared,
    Reservations(ReservationList),
    Panel(bool),
}

#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<Rendered>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<Rendered> {
        self.events.lock().expect("events mutex poisoned").clone()
    }

    pub fn messages(&self) -> Vec<(Direction, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Rendered::Message(direction, text) => Some((direction, text)),
                _ => None,
            })
            .collect()
    }

    pub fn last_reservations(&self) -> Option<ReservationList> {
        self.events().into_iter().rev().find_map(|event| match event {
            Rendered::Reservations(list) => Some(list),
            _ => None,
        })
    }

    fn push(&self, event: Rendered) {
        self.events.lock().expect("events mutex poisoned").push(event);
    }
}

impl ConversationView for RecordingView {
    fn append_message(&self, message: &Message) {
        self.push(Rendered::Message(message.direction, message.text.clone()));
    }

    fn set_pending(&self, visible: bool) {
        self.push(Rendered::Pending(visible));
    }

    fn clear_input(&self) {
        self.push(Rendered::InputCleared);
    }

    fn set_reservations(&self, list: &ReservationList) {
        self.push(Rendered::Reservations(list.clone()));
    }

    fn set_panel_open(&self, open: bool) {
        self.push(Rendered::Panel(open));
    }
}
