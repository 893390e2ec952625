use crate::domain::{BackendError, ChatBackend, Identity, Message, Reservation, SessionId};
use crate::interface_adapters::protocol::{
    CreateChatResponse, ErrorResponse, HistoryResponse, ReservationsResponse, SendRequest,
    SendResponse, UserIdResponse,
};
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

// Thin wrapper around reqwest for the chat backend. Cookies set by the backend
// (and an optional pre-seeded credential) ride along on every call.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base: Url,
    pub base_url: String,
}

#[derive(Debug)]
pub enum BackendClientError {
    InvalidBaseUrl(url::ParseError),
    Transport(reqwest::Error),
    Upstream {
        status: StatusCode,
        message: Option<String>,
    },
    Decode(reqwest::Error),
    MissingField(&'static str),
}

impl fmt::Display for BackendClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendClientError::InvalidBaseUrl(err) => write!(f, "invalid backend url: {err}"),
            BackendClientError::Transport(err) => write!(f, "backend transport error: {err}"),
            BackendClientError::Upstream { status, message } => {
                if let Some(message) = message {
                    write!(f, "server error {status}: {message}")
                } else {
                    write!(f, "server error {status}")
                }
            }
            BackendClientError::Decode(err) => write!(f, "backend response decode error: {err}"),
            BackendClientError::MissingField(field) => {
                write!(f, "backend response is missing {field}")
            }
        }
    }
}

impl std::error::Error for BackendClientError {}

impl BackendClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credential: Option<&str>,
    ) -> Result<Self, BackendClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let origin = Url::parse(&base_url).map_err(BackendClientError::InvalidBaseUrl)?;
        if origin.cannot_be_a_base() {
            return Err(BackendClientError::InvalidBaseUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        let jar = Arc::new(Jar::default());
        if let Some(cookie) = credential {
            jar.add_cookie_str(cookie, &origin);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(timeout)
            .cookie_provider(jar)
            .default_headers(headers)
            .build()
            .map_err(BackendClientError::Transport)?;

        Ok(Self {
            http,
            base: origin,
            base_url,
        })
    }

    // Ids are appended as percent-encoded segments, so `/`, `?` or `#` inside an
    // id can never change the route.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, BackendClientError> {
        let url = self.endpoint(segments);
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(BackendClientError::Transport)?;
        decode(res).await
    }
}

// Any non-success status is a failure regardless of body; keep the backend's
// message so it can be shown to the visitor.
async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, BackendClientError> {
    let status = res.status();
    if !status.is_success() {
        let message = res
            .text()
            .await
            .ok()
            .filter(|body| !body.trim().is_empty())
            .map(|body| match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(payload) => payload.detail,
                Err(_) => body,
            });
        return Err(BackendClientError::Upstream { status, message });
    }

    res.json::<T>().await.map_err(BackendClientError::Decode)
}

#[async_trait]
impl ChatBackend for BackendClient {
    async fn fetch_identity(&self) -> Result<Identity, BackendError> {
        let payload: UserIdResponse = self.get(&["get_user_id"]).await?;
        Identity::parse(payload.user_id)
            .ok_or_else(|| BackendClientError::MissingField("user_id").into())
    }

    async fn create_session(&self, identity: &Identity) -> Result<SessionId, BackendError> {
        let payload: CreateChatResponse =
            self.get(&["create_chat", identity.as_str()]).await?;
        SessionId::parse(payload.chat_id)
            .ok_or_else(|| BackendClientError::MissingField("chat_id").into())
    }

    async fn load_history(&self, session: &SessionId) -> Result<Vec<Message>, BackendError> {
        let payload: HistoryResponse = self.get(&["chat", session.as_str(), "messages"]).await?;
        Ok(payload.messages.into_iter().map(Message::from).collect())
    }

    async fn send_question(
        &self,
        identity: &Identity,
        session: &SessionId,
        question: &str,
    ) -> Result<Option<String>, BackendError> {
        let url = self.endpoint(&["chat", identity.as_str(), session.as_str()]);
        let res = self
            .http
            .post(url)
            .json(&SendRequest { question })
            .send()
            .await
            .map_err(BackendClientError::Transport)?;

        let payload: SendResponse = decode(res).await?;
        Ok(payload.response)
    }

    async fn fetch_reservations(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Reservation>, BackendError> {
        let payload: ReservationsResponse =
            self.get(&["reservations", identity.as_str()]).await?;
        Ok(payload.reservations)
    }
}
