// Maps user gestures onto controller actions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::domain::ConversationView;
use crate::use_cases::messenger::{ChatMessenger, SubmitOutcome};

// Outside clicks only close the panel on narrow viewports (inclusive).
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Panel,
    MenuToggle,
    Outside,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Submit(String),
    MenuToggle,
    DocumentClick {
        target: ClickTarget,
        viewport_width: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    // Bindings are not armed yet (or bootstrap failed).
    Unarmed,
    Submitted(SubmitOutcome),
    PanelToggled { open: bool },
    PanelClosed,
    Unhandled,
}

pub struct UiEventRouter {
    messenger: Arc<ChatMessenger>,
    view: Arc<dyn ConversationView>,
    armed: AtomicBool,
    panel_open: AtomicBool,
}

impl UiEventRouter {
    pub fn new(messenger: Arc<ChatMessenger>, view: Arc<dyn ConversationView>) -> Self {
        Self {
            messenger,
            view,
            armed: AtomicBool::new(false),
            panel_open: AtomicBool::new(false),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::Release);
        debug!("ui bindings armed.");
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open.load(Ordering::Acquire)
    }

    pub async fn dispatch(&self, event: UiEvent) -> RouteOutcome {
        if !self.is_armed() {
            return RouteOutcome::Unarmed;
        }

        match event {
            UiEvent::Submit(text) => RouteOutcome::Submitted(self.messenger.submit(&text).await),
            UiEvent::MenuToggle => {
                let open = !self.panel_open.fetch_xor(true, Ordering::AcqRel);
                self.view.set_panel_open(open);
                RouteOutcome::PanelToggled { open }
            }
            UiEvent::DocumentClick {
                target: ClickTarget::Outside,
                viewport_width,
            } if viewport_width <= MOBILE_BREAKPOINT_PX => {
                if self
                    .panel_open
                    .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    self.view.set_panel_open(false);
                    RouteOutcome::PanelClosed
                } else {
                    RouteOutcome::Unhandled
                }
            }
            UiEvent::DocumentClick { .. } => RouteOutcome::Unhandled,
        }
    }
}
