//! Metadata deploy and retrieve

pub mod remote;

use async_trait::async_trait;
use mm_api::{DeployOptions, PackageDescriptor};
use serde_json::Value;

use crate::errors::CommandError;
use crate::payload::CommandPayload;
use crate::project::Project;

/// One deploy: package, target project and optional behavior flags
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub package: PackageDescriptor,
    pub project: Project,
    pub deploy_options: Option<DeployOptions>,
}

impl DeployRequest {
    /// Build a request from a deploy payload and the project it targets
    pub fn from_payload(payload: &CommandPayload, project: Project) -> Result<Self, CommandError> {
        let package = require_package(payload)?;
        let deploy_options = payload.get_as::<DeployOptions>("deployOptions")?;

        Ok(Self {
            package,
            project,
            deploy_options,
        })
    }
}

/// One retrieve of a package into a project
#[derive(Debug, Clone)]
pub struct RetrieveRequest {
    pub package: PackageDescriptor,
    pub project: Project,
}

/// The `package` field of a payload, which must be a non-empty descriptor
pub fn require_package(payload: &CommandPayload) -> Result<PackageDescriptor, CommandError> {
    match payload.get_as::<PackageDescriptor>("package")? {
        Some(package) if !package.is_empty() => Ok(package),
        _ => Err(CommandError::Validation(
            "Please specify a package to deploy or retrieve".to_string(),
        )),
    }
}

/// Remote metadata engine
///
/// Both calls are long-running remote operations; the command layer only
/// observes the terminal value or error.
#[async_trait]
pub trait MetadataEngine: Send + Sync {
    async fn execute_remote(
        &self,
        request: &DeployRequest,
        deploy_options: Option<&DeployOptions>,
    ) -> Result<Value, CommandError>;

    async fn retrieve(&self, request: &RetrieveRequest) -> Result<Value, CommandError>;
}
