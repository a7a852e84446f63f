//! Client session
//!
//! The [`Client`] is what the binary (or a test) drives: it owns settings,
//! the collaborator services and the active project, and turns each
//! [`CommandRequest`] into one command execution.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::commands::{CommandFactory, CommandName, CommandOutput, ExecutionContext};
use crate::deploy::remote::SoapMetadataEngine;
use crate::deploy::MetadataEngine;
use crate::editor::launcher::ProcessEditorFactory;
use crate::editor::{EditorFactory, EditorKind};
use crate::errors::CommandError;
use crate::payload::CommandPayload;
use crate::project::Project;
use crate::sfdc::client::SoapClient;
use crate::sfdc::login::SalesforceAuthenticator;
use crate::sfdc::Authenticator;
use crate::storage::settings::Settings;

/// Collaborators commands call out to
#[derive(Clone)]
pub struct Services {
    pub authenticator: Arc<dyn Authenticator>,
    pub metadata: Arc<dyn MetadataEngine>,
    pub editors: Arc<dyn EditorFactory>,
}

impl Services {
    /// The real remote platform and local editors
    pub fn remote(settings: &Settings) -> Result<Self, CommandError> {
        let soap = Arc::new(SoapClient::new(settings.request_timeout())?);

        Ok(Self {
            authenticator: Arc::new(SalesforceAuthenticator::new(
                soap.clone(),
                &settings.login_url,
                &settings.api_version,
            )),
            metadata: Arc::new(
                SoapMetadataEngine::new(soap, &settings.api_version)
                    .with_polling(settings.poll_interval(), settings.operation_timeout()),
            ),
            editors: Arc::new(ProcessEditorFactory::new(
                &settings.ui_base_url,
                settings.editors.clone(),
            )),
        })
    }
}

/// One command invocation
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: CommandName,
    pub body: CommandPayload,
    pub editor: Option<EditorKind>,
}

/// Invoking session
pub struct Client {
    settings: Arc<Settings>,
    services: Services,
    project: RwLock<Option<Project>>,
}

impl Client {
    pub fn new(settings: Arc<Settings>, services: Services) -> Self {
        Self {
            settings,
            services,
            project: RwLock::new(None),
        }
    }

    /// Start with `project` active
    pub fn with_project(self, project: Option<Project>) -> Self {
        Self {
            project: RwLock::new(project),
            ..self
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Snapshot of the active project
    pub async fn get_project(&self) -> Option<Project> {
        self.project.read().await.clone()
    }

    /// Point the session at `project`
    pub async fn set_project(&self, project: Project) {
        let mut active = self.project.write().await;
        *active = Some(project);
    }

    /// Build the named command and execute it to a single result
    pub async fn execute_command(self: &Arc<Self>, request: CommandRequest) -> Result<CommandOutput, CommandError> {
        info!("Executing command: {}", request.name);

        let ctx = ExecutionContext::new(self.clone(), request.editor);
        let command = CommandFactory::create(request.name, request.body, ctx);
        command.execute().await
    }
}
