//! Create a new local project from an existing directory, or open its UI

use async_trait::async_trait;
use tracing::debug;

use crate::commands::{launch_ui, Command, CommandName, CommandOutput, ExecutionContext};
use crate::editor::UiContext;
use crate::errors::CommandError;
use crate::payload::CommandPayload;
use crate::project::Project;
use crate::sfdc::Credentials;

pub const PROJECT_CREATED: &str = "MavensMate project created successfully";

pub struct NewProjectCommand {
    payload: CommandPayload,
    ctx: ExecutionContext,
}

impl NewProjectCommand {
    pub fn new(payload: CommandPayload, ctx: ExecutionContext) -> Self {
        Self { payload, ctx }
    }

    /// Credentials and the not-yet-written project, both checked up front
    fn validate(&self) -> Result<(Credentials, Project), CommandError> {
        let missing = || {
            CommandError::Validation("Please specify username, password, and project name".to_string())
        };

        self.payload.get_str("name").ok_or_else(missing)?;
        let credentials = Credentials::from_payload(&self.payload).ok_or_else(missing)?;
        let project = Project::from_payload(&self.payload, &self.ctx.settings().workspace)?;
        Ok((credentials, project))
    }
}

#[async_trait]
impl Command for NewProjectCommand {
    fn name(&self) -> CommandName {
        CommandName::NewProjectFromExistingDirectory
    }

    fn payload(&self) -> &CommandPayload {
        &self.payload
    }

    async fn launch_ui(&self) -> Result<CommandOutput, CommandError> {
        let mut context = UiContext::new();
        if let Some(directory) = self.payload.arg_str("directory") {
            context.insert("directory".to_string(), directory.to_string());
        }
        launch_ui(&self.ctx, self.name(), context).await
    }

    /// validate → authenticate → write to disk → open in editor (if any) → resolve
    async fn run(&self) -> Result<CommandOutput, CommandError> {
        let (credentials, mut project) = self.validate()?;

        let session = self
            .ctx
            .services()
            .authenticator
            .authenticate(&credentials)
            .await?;

        project.bind_session(session);
        project.initialize(true, true).await?;
        debug!("New project written to disk at {}", project.path().display());

        if self.ctx.editor().is_some() {
            debug!("Opening new project in editor");
            self.ctx.editor_service().open(project.path()).await?;
        }

        self.ctx.client().set_project(project).await;
        Ok(CommandOutput::message(PROJECT_CREATED))
    }
}
