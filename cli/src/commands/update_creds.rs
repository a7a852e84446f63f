//! Re-authenticate the active project with new credentials

use async_trait::async_trait;
use tracing::info;

use crate::commands::{launch_ui, project_ui_context, Command, CommandName, CommandOutput, ExecutionContext};
use crate::errors::CommandError;
use crate::payload::CommandPayload;
use crate::sfdc::Credentials;

pub const CREDENTIALS_UPDATED: &str = "Credentials updated successfully!";

pub struct UpdateCredsCommand {
    payload: CommandPayload,
    ctx: ExecutionContext,
}

impl UpdateCredsCommand {
    pub fn new(payload: CommandPayload, ctx: ExecutionContext) -> Self {
        Self { payload, ctx }
    }
}

#[async_trait]
impl Command for UpdateCredsCommand {
    fn name(&self) -> CommandName {
        CommandName::UpdateCreds
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
        let credentials = Credentials::from_payload(&self.payload).ok_or_else(|| {
            CommandError::Validation("Please specify username and password".to_string())
        })?;

        // Fall back to the login URL the project was created with.
        let login_url = credentials
            .login_url
            .clone()
            .or_else(|| project.settings().login_url.clone());
        let credentials = credentials.with_login_url(login_url.clone());

        let session = self
            .ctx
            .services()
            .authenticator
            .authenticate(&credentials)
            .await?;

        project
            .update_credentials(&credentials.username, login_url, session)
            .await?;
        info!("Updated credentials for {}", project.settings().project_name);

        self.ctx.client().set_project(project).await;
        Ok(CommandOutput::message(CREDENTIALS_UPDATED))
    }
}
