//! Change the active project's metadata subscription

use async_trait::async_trait;
use tracing::debug;

use crate::commands::{launch_ui, project_ui_context, Command, CommandName, CommandOutput, ExecutionContext};
use crate::deploy::{require_package, RetrieveRequest};
use crate::errors::CommandError;
use crate::payload::CommandPayload;

pub struct EditProjectCommand {
    payload: CommandPayload,
    ctx: ExecutionContext,
}

impl EditProjectCommand {
    pub fn new(payload: CommandPayload, ctx: ExecutionContext) -> Self {
        Self { payload, ctx }
    }
}

#[async_trait]
impl Command for EditProjectCommand {
    fn name(&self) -> CommandName {
        CommandName::EditProject
    }

    fn payload(&self) -> &CommandPayload {
        &self.payload
    }

    async fn launch_ui(&self) -> Result<CommandOutput, CommandError> {
        let context = project_ui_context(&self.ctx).await?;
        launch_ui(&self.ctx, self.name(), context).await
    }

    async fn run(&self) -> Result<CommandOutput, CommandError> {
        let mut project = self.ctx.require_project().await?;
        let package = require_package(&self.payload)?;

        let request = RetrieveRequest {
            package: package.clone(),
            project: project.clone(),
        };
        let result = self.ctx.services().metadata.retrieve(&request).await?;

        // Only a completed retrieve changes the subscription on disk.
        project
            .set_subscription(package, &self.ctx.settings().api_version)
            .await?;
        debug!("Subscription updated: {:?}", project.settings().package);

        self.ctx.client().set_project(project).await;
        Ok(CommandOutput::Data(result))
    }
}
