//! Finite State Machine for one command invocation

use serde::{Deserialize, Serialize};

/// Command state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandState {
    /// Constructed, not yet executing
    Created,

    /// Deciding between the UI and direct paths
    Branching,

    /// Handed off to the editor
    UiRunning,

    /// Running the command's own workflow
    DirectRunning,

    /// Settled with a success value
    Resolved,

    /// Settled with an error
    Rejected,
}

impl CommandState {
    /// Resolved or Rejected
    pub fn is_settled(&self) -> bool {
        matches!(self, CommandState::Resolved | CommandState::Rejected)
    }
}

/// Command event
#[derive(Debug, Clone)]
pub enum CommandEvent {
    /// `execute` was called
    Branch,

    /// Payload is UI-flagged
    LaunchUi,

    /// Payload is not UI-flagged
    RunDirect,

    /// Workflow produced its value
    Resolve,

    /// Workflow failed
    Reject(String),
}

/// Command FSM
#[derive(Debug, Clone)]
pub struct CommandFsm {
    state: CommandState,
    error: Option<String>,
}

impl CommandFsm {
    /// Create a new FSM in the created state
    pub fn new() -> Self {
        Self {
            state: CommandState::Created,
            error: None,
        }
    }

    pub fn state(&self) -> &CommandState {
        &self.state
    }

    /// Error message if rejected
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: CommandEvent) -> Result<(), String> {
        let new_state = match (&self.state, &event) {
            (CommandState::Created, CommandEvent::Branch) => CommandState::Branching,

            (CommandState::Branching, CommandEvent::LaunchUi) => CommandState::UiRunning,
            (CommandState::Branching, CommandEvent::RunDirect) => CommandState::DirectRunning,

            (CommandState::UiRunning | CommandState::DirectRunning, CommandEvent::Resolve) => {
                CommandState::Resolved
            }
            (CommandState::UiRunning | CommandState::DirectRunning, CommandEvent::Reject(err)) => {
                self.error = Some(err.clone());
                CommandState::Rejected
            }

            // Settled states are terminal
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for CommandFsm {
    fn default() -> Self {
        Self::new()
    }
}
