//! Commands
//!
//! Every user-facing operation is a [`Command`]. Execution always branches
//! once on the payload's UI flag, then settles exactly once; the
//! [`CommandFsm`] enforces that ordering.

pub mod deploy;
pub mod edit_project;
pub mod fsm;
pub mod new_project;
pub mod update_creds;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::{Client, Services};
use crate::commands::fsm::{CommandEvent, CommandFsm};
use crate::editor::{EditorKind, EditorService, UiContext};
use crate::errors::CommandError;
use crate::payload::CommandPayload;
use crate::project::Project;
use crate::storage::settings::Settings;

/// Resolution value of every UI launch
pub const UI_SUCCESS: &str = "Success";

/// The closed set of commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Deploy,
    NewProjectFromExistingDirectory,
    EditProject,
    UpdateCreds,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Deploy => "deploy",
            CommandName::NewProjectFromExistingDirectory => "new-project-from-existing-directory",
            CommandName::EditProject => "edit-project",
            CommandName::UpdateCreds => "update-creds",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deploy" => Ok(CommandName::Deploy),
            "new-project-from-existing-directory" => Ok(CommandName::NewProjectFromExistingDirectory),
            "edit-project" => Ok(CommandName::EditProject),
            "update-creds" => Ok(CommandName::UpdateCreds),
            _ => Err(CommandError::Validation(format!("Unknown command: {}", s))),
        }
    }
}

/// Success value of a command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    Message(String),
    Data(Value),
}

impl CommandOutput {
    pub fn message(message: impl Into<String>) -> Self {
        CommandOutput::Message(message.into())
    }

    /// The message, if this is a message
    pub fn as_message(&self) -> Option<&str> {
        match self {
            CommandOutput::Message(message) => Some(message),
            CommandOutput::Data(_) => None,
        }
    }

    /// JSON written to stdout: messages become `{"message": ...}`
    pub fn to_json(&self) -> Value {
        match self {
            CommandOutput::Message(message) => serde_json::json!({ "message": message }),
            CommandOutput::Data(value) => value.clone(),
        }
    }
}

/// Everything a command may touch besides its payload
#[derive(Clone)]
pub struct ExecutionContext {
    client: Arc<Client>,
    editor: Option<EditorKind>,
}

impl ExecutionContext {
    pub fn new(client: Arc<Client>, editor: Option<EditorKind>) -> Self {
        Self { client, editor }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn settings(&self) -> &Settings {
        self.client.settings()
    }

    pub fn services(&self) -> &Services {
        self.client.services()
    }

    /// The caller's editor; absent for headless invocations
    pub fn editor(&self) -> Option<EditorKind> {
        self.editor
    }

    pub fn editor_service(&self) -> Arc<dyn EditorService> {
        self.services().editors.create(self.editor)
    }

    /// The client's active project, or a validation error
    pub async fn require_project(&self) -> Result<Project, CommandError> {
        self.client.get_project().await.ok_or_else(|| {
            CommandError::Validation(
                "No active project; run from inside a project or pass --project".to_string(),
            )
        })
    }
}

/// One user-invoked operation
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> CommandName;

    fn payload(&self) -> &CommandPayload;

    /// True iff the payload's `args.ui` is set
    fn is_ui_command(&self) -> bool {
        self.payload().is_ui()
    }

    /// UI path: hand off to the editor
    async fn launch_ui(&self) -> Result<CommandOutput, CommandError>;

    /// Direct path: run the workflow
    async fn run(&self) -> Result<CommandOutput, CommandError>;

    /// Branch, run, and settle exactly once
    async fn execute(&self) -> Result<CommandOutput, CommandError> {
        drive(self).await
    }
}

async fn drive<C: Command + ?Sized>(command: &C) -> Result<CommandOutput, CommandError> {
    let name = command.name();
    let mut fsm = CommandFsm::new();
    transition(&mut fsm, CommandEvent::Branch)?;

    let outcome = if command.is_ui_command() {
        transition(&mut fsm, CommandEvent::LaunchUi)?;
        debug!("{}: delegating to editor UI", name);
        command.launch_ui().await
    } else {
        transition(&mut fsm, CommandEvent::RunDirect)?;
        debug!("{}: running", name);
        command.run().await
    };

    match outcome {
        Ok(output) => {
            transition(&mut fsm, CommandEvent::Resolve)?;
            info!("{}: resolved", name);
            Ok(output)
        }
        Err(err) => {
            transition(&mut fsm, CommandEvent::Reject(err.to_string()))?;
            warn!("{}: rejected ({}): {}", name, err.kind(), err);
            Err(err)
        }
    }
}

fn transition(fsm: &mut CommandFsm, event: CommandEvent) -> Result<(), CommandError> {
    fsm.process(event).map_err(CommandError::Internal)
}

/// Launch `name`'s UI with `context` and resolve with [`UI_SUCCESS`]
pub(crate) async fn launch_ui(
    ctx: &ExecutionContext,
    name: CommandName,
    context: UiContext,
) -> Result<CommandOutput, CommandError> {
    ctx.editor_service().launch_ui(name.as_str(), &context).await?;
    Ok(CommandOutput::message(UI_SUCCESS))
}

/// `{"pid": <project id>}` for UIs that operate on the active project
pub(crate) async fn project_ui_context(ctx: &ExecutionContext) -> Result<UiContext, CommandError> {
    let project = ctx.require_project().await?;
    let mut context = UiContext::new();
    context.insert("pid".to_string(), project.settings().id.clone());
    Ok(context)
}

/// Factory for creating commands
pub struct CommandFactory;

impl CommandFactory {
    pub fn create(name: CommandName, payload: CommandPayload, ctx: ExecutionContext) -> Box<dyn Command> {
        match name {
            CommandName::Deploy => Box::new(deploy::DeployCommand::new(payload, ctx)),
            CommandName::NewProjectFromExistingDirectory => {
                Box::new(new_project::NewProjectCommand::new(payload, ctx))
            }
            CommandName::EditProject => Box::new(edit_project::EditProjectCommand::new(payload, ctx)),
            CommandName::UpdateCreds => Box::new(update_creds::UpdateCredsCommand::new(payload, ctx)),
        }
    }
}
