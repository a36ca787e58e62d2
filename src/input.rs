use crossterm::event::KeyCode;

use crate::engine::EngineCommand;
use crate::model::order::TradeSide;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    Pause,
    Resume,
    TogglePause,
    Buy,
    Sell,
    Reset,
    Quit,
}

impl UiCommand {
    /// Engine command for this key, `None` for commands handled by the UI itself.
    pub fn engine_command(&self) -> Option<EngineCommand> {
        match self {
            UiCommand::Pause => Some(EngineCommand::Pause),
            UiCommand::Resume => Some(EngineCommand::Resume),
            UiCommand::TogglePause => Some(EngineCommand::TogglePause),
            UiCommand::Buy => Some(EngineCommand::Trade(TradeSide::Buy)),
            UiCommand::Sell => Some(EngineCommand::Trade(TradeSide::Sell)),
            UiCommand::Reset => Some(EngineCommand::Reset),
            UiCommand::Quit => None,
        }
    }
}

pub fn parse_main_command(key_code: &KeyCode) -> Option<UiCommand> {
    match key_code {
        KeyCode::Esc => Some(UiCommand::Quit),
        KeyCode::Char(' ') => Some(UiCommand::TogglePause),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'p' => Some(UiCommand::Pause),
            'r' => Some(UiCommand::Resume),
            'b' => Some(UiCommand::Buy),
            's' => Some(UiCommand::Sell),
            'x' => Some(UiCommand::Reset),
            'q' => Some(UiCommand::Quit),
            _ => None,
        },
        _ => None,
    }
}
