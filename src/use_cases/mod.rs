// Use cases layer: bootstrap, messaging, reservation loading and event routing.

pub mod bootstrap;
pub mod controller;
pub mod messenger;
pub mod reservations;
pub mod router;

#[cfg(test)]
pub(crate) mod test_support;

pub use bootstrap::SessionBootstrapper;
pub use controller::ChatController;
pub use messenger::{ChatMessenger, IgnoreReason, MessengerEvent, SendState, SubmitOutcome};
pub use reservations::{ReservationFetcher, RetryPolicy};
pub use router::{ClickTarget, RouteOutcome, UiEvent, UiEventRouter};
