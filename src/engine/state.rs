use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Running,
    Paused,
    Resetting,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Idle => "idle",
            EngineState::Running => "running",
            EngineState::Paused => "paused",
            EngineState::Resetting => "resetting",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, EngineState::Running)
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What triggered a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishReason {
    Start,
    Tick,
    Reset,
}
