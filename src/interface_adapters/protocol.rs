use serde::{Deserialize, Serialize};

use crate::domain::{Direction, Message, Reservation};

// Wire shapes of the chat backend. Conversions into domain types live here so
// the use cases never see JSON.

#[derive(Debug, Deserialize)]
pub struct UserIdResponse {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateChatResponse {
    pub chat_id: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<HistoryMessageDto>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryMessageDto {
    pub text: String,
    // `sent` or `received`, mapped straight onto the direction.
    #[serde(rename = "type")]
    pub direction: Direction,
}

impl From<HistoryMessageDto> for Message {
    fn from(dto: HistoryMessageDto) -> Self {
        Message::new(dto.text, dto.direction)
    }
}

#[derive(Debug, Serialize)]
pub struct SendRequest<'a> {
    pub question: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReservationsResponse {
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

// FastAPI error envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
