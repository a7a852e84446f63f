//! Deploy metadata to the project's org, or open the deploy UI

use async_trait::async_trait;
use tracing::debug;

use crate::commands::{launch_ui, project_ui_context, Command, CommandName, CommandOutput, ExecutionContext};
use crate::deploy::DeployRequest;
use crate::errors::CommandError;
use crate::payload::CommandPayload;

pub struct DeployCommand {
    payload: CommandPayload,
    ctx: ExecutionContext,
}

impl DeployCommand {
    pub fn new(payload: CommandPayload, ctx: ExecutionContext) -> Self {
        Self { payload, ctx }
    }
}

#[async_trait]
impl Command for DeployCommand {
    fn name(&self) -> CommandName {
        CommandName::Deploy
    }

    fn payload(&self) -> &CommandPayload {
        &self.payload
    }

    async fn launch_ui(&self) -> Result<CommandOutput, CommandError> {
        let context = project_ui_context(&self.ctx).await?;
        launch_ui(&self.ctx, self.name(), context).await
    }

    async fn run(&self) -> Result<CommandOutput, CommandError> {
        let project = self.ctx.require_project().await?;
        let request = DeployRequest::from_payload(&self.payload, project)?;
        debug!("Initiating deploy: {:?}", request.package);
        debug!("Deploy options: {:?}", request.deploy_options);

        // One remote call per invocation; retries are the caller's decision.
        let result = self
            .ctx
            .services()
            .metadata
            .execute_remote(&request, request.deploy_options.as_ref())
            .await?;

        Ok(CommandOutput::Data(result))
    }
}
