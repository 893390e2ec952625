// Domain layer: session, conversation and reservation types plus the ports the
// use cases depend on.

pub mod entities;
pub mod errors;
pub mod ports;

pub use entities::{
    Direction, Identity, Message, Reservation, ReservationList, SessionContext, SessionId,
};
pub use errors::{ExhaustedRetries, HistoryLoadFailed, InitError, SendFailed};
pub use ports::{BackendError, ChatBackend, ConversationView, Sleeper};
