//! Local metadata projects
//!
//! A project is a directory bound to one org:
//!
//! ```text
//! <path>/config/.settings   project settings (JSON)
//! <path>/config/.session    authenticated session, owner-only
//! <path>/src/               metadata source
//! ```

pub mod package;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mm_api::PackageDescriptor;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::CommandError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;
use crate::payload::CommandPayload;
use crate::sfdc::{Session, StoredSession};

const CONFIG_DIR: &str = "config";
const SETTINGS_FILE: &str = ".settings";
const SESSION_FILE: &str = ".session";
const SRC_DIR: &str = "src";

/// Entries never imported from an origin directory
const IMPORT_SKIP: &[&str] = &[".git", ".svn", "config", "node_modules"];

/// Persisted project settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Stable identifier the UI uses to locate the project
    pub id: String,
    pub project_name: String,
    pub username: String,
    pub login_url: Option<String>,
    #[serde(default)]
    pub instance_url: Option<String>,
    pub workspace: PathBuf,
    /// Metadata subscription
    #[serde(default)]
    pub package: Option<PackageDescriptor>,
    pub created_at: DateTime<Utc>,
}

/// A local metadata workspace
#[derive(Debug, Clone)]
pub struct Project {
    path: PathBuf,
    settings: ProjectSettings,
    session: Option<Session>,
    origin: Option<PathBuf>,
}

impl Project {
    /// Build an uninitialized project from a creation payload.
    ///
    /// `name` and `username` must be present. The project lives at
    /// `<workspace>/<name>`, where `workspace` comes from the payload or
    /// `default_workspace`. An `origin` (or `directory`) field names existing
    /// source to import.
    pub fn from_payload(payload: &CommandPayload, default_workspace: &Path) -> Result<Self, CommandError> {
        let name = payload
            .get_str("name")
            .ok_or_else(|| CommandError::Validation("Please specify a project name".to_string()))?;
        let username = payload
            .get_str("username")
            .ok_or_else(|| CommandError::Validation("Please specify a username".to_string()))?;

        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(CommandError::Validation(format!("Invalid project name: {}", name)));
        }

        let workspace = payload
            .get_str("workspace")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_workspace.to_path_buf());
        let origin = payload
            .get_str("origin")
            .or_else(|| payload.get_str("directory"))
            .map(PathBuf::from);

        Ok(Self {
            path: workspace.join(name),
            settings: ProjectSettings {
                id: uuid::Uuid::new_v4().to_string(),
                project_name: name.to_string(),
                username: username.to_string(),
                login_url: payload.get_str("loginUrl").map(str::to_string),
                instance_url: None,
                workspace,
                package: None,
                created_at: Utc::now(),
            },
            session: None,
            origin,
        })
    }

    /// Load an existing project rooted at `path`
    pub async fn load(path: &Path) -> Result<Self, CommandError> {
        let root = Dir::new(path);
        let settings_file = settings_file(&root);
        if !settings_file.exists().await {
            return Err(CommandError::Validation(format!(
                "{} is not a MavensMate project",
                path.display()
            )));
        }

        let settings: ProjectSettings = settings_file.read_json().await?;
        let session_file = session_file(&root);
        let session = if session_file.exists().await {
            Some(session_file.read_json::<StoredSession>().await?.into())
        } else {
            None
        };

        debug!("Loaded project {} ({})", settings.project_name, settings.id);
        Ok(Self {
            path: path.to_path_buf(),
            settings,
            session,
            origin: None,
        })
    }

    /// Walk up from `start` to the nearest project root
    pub async fn discover(start: &Path) -> Result<Option<Self>, CommandError> {
        for dir in start.ancestors() {
            if settings_file(&Dir::new(dir)).exists().await {
                return Self::load(dir).await.map(Some);
            }
        }
        Ok(None)
    }

    /// Project a command runs against.
    ///
    /// An explicit directory must load. A discovered one that fails to load is
    /// logged and skipped, so commands that need no project still run.
    pub async fn resolve_active(explicit: Option<&Path>, cwd: &Path) -> Result<Option<Self>, CommandError> {
        if let Some(dir) = explicit {
            return Self::load(dir).await.map(Some);
        }

        match Self::discover(cwd).await {
            Ok(project) => Ok(project),
            Err(e) => {
                warn!("Ignoring unreadable project above {}: {}", cwd.display(), e);
                Ok(None)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Session or a validation error naming the project
    pub fn require_session(&self) -> Result<&Session, CommandError> {
        self.session.as_ref().ok_or_else(|| {
            CommandError::Validation(format!(
                "Project {} has no session; run update-creds first",
                self.settings.project_name
            ))
        })
    }

    pub fn src_dir(&self) -> Dir {
        Dir::new(self.path.join(SRC_DIR))
    }

    /// Attach an authenticated session
    pub fn bind_session(&mut self, session: Session) {
        self.settings.instance_url = Some(session.instance_url.clone());
        self.session = Some(session);
    }

    /// Write the project to disk.
    ///
    /// `create_on_disk` scaffolds the directory tree; `from_existing_source`
    /// copies the origin directory (when one was given) into `src/`. Requires
    /// a bound session. Partially written files are left in place on failure.
    pub async fn initialize(&mut self, from_existing_source: bool, create_on_disk: bool) -> Result<(), CommandError> {
        let session = self.session.as_ref().ok_or_else(|| {
            CommandError::Initialization("Project has no authenticated session".to_string())
        })?;
        let root = Dir::new(&self.path);

        if create_on_disk {
            if settings_file(&root).exists().await {
                return Err(CommandError::Initialization(format!(
                    "A project already exists at {}",
                    self.path.display()
                )));
            }
            init_step(root.subdir(CONFIG_DIR).create().await, "create config directory")?;
            init_step(self.src_dir().create().await, "create src directory")?;
        }

        if from_existing_source {
            self.import_origin().await?;
        }

        let stored = StoredSession::from(session);
        init_step(self.save_settings().await, "write settings")?;
        init_step(write_session(&root, &stored).await, "write session")?;

        info!("Project {} written to {}", self.settings.project_name, self.path.display());
        Ok(())
    }

    async fn import_origin(&self) -> Result<(), CommandError> {
        let Some(origin) = &self.origin else {
            debug!("No origin directory, nothing to import");
            return Ok(());
        };

        let origin_dir = Dir::new(origin);
        if !origin_dir.exists().await {
            return Err(CommandError::Initialization(format!(
                "Origin directory {} does not exist",
                origin.display()
            )));
        }
        if origin == &self.path {
            debug!("Origin is the project directory, importing in place");
            return Ok(());
        }

        // Prefer an existing src/ layout, otherwise treat the whole origin as source.
        let source = origin_dir.subdir(SRC_DIR);
        let source = if source.exists().await { source } else { origin_dir };

        let copied = init_step(source.copy_into(&self.src_dir(), IMPORT_SKIP).await, "import source")?;
        info!("Imported {} files from {}", copied, origin.display());
        Ok(())
    }

    /// Replace credentials after a successful re-authentication
    pub async fn update_credentials(
        &mut self,
        username: &str,
        login_url: Option<String>,
        session: Session,
    ) -> Result<(), CommandError> {
        self.settings.username = username.to_string();
        if login_url.is_some() {
            self.settings.login_url = login_url;
        }
        self.bind_session(session);

        self.save_settings().await?;
        if let Some(session) = &self.session {
            write_session(&Dir::new(&self.path), &StoredSession::from(session)).await?;
        }
        Ok(())
    }

    /// Replace the metadata subscription and its `package.xml`
    pub async fn set_subscription(&mut self, package: PackageDescriptor, api_version: &str) -> Result<(), CommandError> {
        self.src_dir()
            .file("package.xml")
            .write_string(&package::render_package_xml(&package, api_version))
            .await?;
        self.settings.package = Some(package);
        self.save_settings().await
    }

    pub async fn save_settings(&self) -> Result<(), CommandError> {
        settings_file(&Dir::new(&self.path))
            .write_json_atomic(&self.settings)
            .await
    }
}

fn settings_file(root: &Dir) -> File {
    root.subdir(CONFIG_DIR).file(SETTINGS_FILE)
}

fn session_file(root: &Dir) -> File {
    root.subdir(CONFIG_DIR).file(SESSION_FILE)
}

async fn write_session(root: &Dir, session: &StoredSession) -> Result<(), CommandError> {
    let file = session_file(root);
    file.write_json(session).await?;
    file.set_permissions_600().await
}

fn init_step<T>(result: Result<T, CommandError>, step: &str) -> Result<T, CommandError> {
    result.map_err(|e| match e {
        CommandError::Initialization(_) => e,
        other => CommandError::Initialization(format!("{}: {}", step, other)),
    })
}
