use async_trait::async_trait;
use std::time::Duration;

use crate::domain::entities::{Identity, Message, Reservation, ReservationList, SessionId};

// Errors crossing the backend port keep their concrete type behind the box.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

// Port for the remote chat/reservation service. Use cases depend on this trait,
// never on the HTTP client.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn fetch_identity(&self) -> Result<Identity, BackendError>;
    async fn create_session(&self, identity: &Identity) -> Result<SessionId, BackendError>;
    async fn load_history(&self, session: &SessionId) -> Result<Vec<Message>, BackendError>;
    // `None` means the backend answered but carried no reply.
    async fn send_question(
        &self,
        identity: &Identity,
        session: &SessionId,
        question: &str,
    ) -> Result<Option<String>, BackendError>;
    async fn fetch_reservations(&self, identity: &Identity)
    -> Result<Vec<Reservation>, BackendError>;
}

// Port for the presentation layer. Implementations own markup; the core only
// describes what should be visible.
pub trait ConversationView: Send + Sync {
    fn append_message(&self, message: &Message);
    fn set_pending(&self, visible: bool);
    fn clear_input(&self);
    fn set_reservations(&self, list: &ReservationList);
    fn set_panel_open(&self, open: bool);
}

// Port for timed suspension between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}
