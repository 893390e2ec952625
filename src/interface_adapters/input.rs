use crate::use_cases::{ClickTarget, UiEvent};

// Commands read from one line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Event(UiEvent),
    Quit,
}

// Maps a raw input line onto a UI gesture. Anything that is not a known
// slash command is treated as a form submission.
pub fn parse_line(line: &str, viewport_width: u32) -> InputCommand {
    match line.trim() {
        "/quit" | "/exit" => InputCommand::Quit,
        "/menu" => InputCommand::Event(UiEvent::MenuToggle),
        "/close" => InputCommand::Event(UiEvent::DocumentClick {
            target: ClickTarget::Outside,
            viewport_width,
        }),
        _ => InputCommand::Event(UiEvent::Submit(line.to_string())),
    }
}
