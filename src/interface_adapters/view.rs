// Line-oriented rendering of the conversation and the reservation panel.

use std::io::{self, Stdout, Write};
use std::sync::Mutex;

use chrono::Local;

use crate::domain::{ConversationView, Direction, Message, Reservation, ReservationList};

pub const NO_RESERVATIONS: &str = "No reservations found.";
pub const RESERVATIONS_UNAVAILABLE: &str = "Error loading reservations. Please try again.";
const RESERVATIONS_LOADING: &str = "Loading reservations...";
const PENDING_INDICATOR: &str = "...";

struct Screen<W> {
    out: W,
    panel_open: bool,
    // None until the first fetch settles.
    reservations: Option<ReservationList>,
}

/// Renders to any writer; the binary uses stdout.
pub struct TerminalView<W = Stdout> {
    screen: Mutex<Screen<W>>,
}

impl TerminalView<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            screen: Mutex::new(Screen {
                out,
                panel_open: false,
                reservations: None,
            }),
        }
    }

    pub fn into_inner(self) -> W {
        self.screen
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .out
    }

    fn with_screen(&self, render: impl FnOnce(&mut Screen<W>) -> io::Result<()>) {
        let mut screen = self
            .screen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = render(&mut *screen).and_then(|_| screen.out.flush()) {
            tracing::warn!(error = %e, "failed to render.");
        }
    }
}

impl<W: Write> Screen<W> {
    fn draw_panel(&mut self) -> io::Result<()> {
        writeln!(self.out, "== Reservations ==")?;
        match &self.reservations {
            None => writeln!(self.out, "{RESERVATIONS_LOADING}")?,
            Some(ReservationList::Empty) => writeln!(self.out, "{NO_RESERVATIONS}")?,
            Some(ReservationList::Unavailable) => writeln!(self.out, "{RESERVATIONS_UNAVAILABLE}")?,
            Some(ReservationList::Entries(entries)) => {
                for reservation in entries {
                    writeln!(self.out, "  {}", format_reservation(reservation))?;
                }
            }
        }
        writeln!(self.out, "==================")
    }
}

impl<W: Write + Send> ConversationView for TerminalView<W> {
    fn append_message(&self, message: &Message) {
        self.with_screen(|screen| writeln!(screen.out, "{}", format_message(message)));
    }

    fn set_pending(&self, visible: bool) {
        // A terminal line cannot be retracted; only the appearance is drawn.
        if visible {
            self.with_screen(|screen| writeln!(screen.out, "bot: {PENDING_INDICATOR}"));
        }
    }

    fn clear_input(&self) {
        // The input line was consumed by the reader already.
    }

    fn set_reservations(&self, list: &ReservationList) {
        self.with_screen(|screen| {
            screen.reservations = Some(list.clone());
            if screen.panel_open {
                screen.draw_panel()?;
            }
            Ok(())
        });
    }

    fn set_panel_open(&self, open: bool) {
        self.with_screen(|screen| {
            screen.panel_open = open;
            if open {
                screen.draw_panel()
            } else {
                writeln!(screen.out, "(reservations hidden)")
            }
        });
    }
}

pub fn format_message(message: &Message) -> String {
    let speaker = match message.direction {
        Direction::Sent => "you",
        Direction::Received => "bot",
    };
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    format!("[{time}] {speaker}: {}", message.text)
}

pub fn format_reservation(reservation: &Reservation) -> String {
    format!(
        "{} at {} (Confirmed)",
        reservation.day.format("%a, %b %-d, %Y"),
        reservation.time
    )
}
