//! Editor integration
//!
//! Commands never talk to an editor directly; they ask an [`EditorFactory`]
//! for an [`EditorService`] bound to the caller's editor (if any).

pub mod launcher;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::CommandError;

/// Editors the client knows how to hand off to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKind {
    Sublime,
    Atom,
    Vscode,
}

impl EditorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorKind::Sublime => "sublime",
            EditorKind::Atom => "atom",
            EditorKind::Vscode => "vscode",
        }
    }

    /// Executable looked up on `PATH` when no override is configured
    pub fn default_binary(&self) -> &'static str {
        match self {
            EditorKind::Sublime => "subl",
            EditorKind::Atom => "atom",
            EditorKind::Vscode => "code",
        }
    }
}

impl fmt::Display for EditorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sublime" | "subl" => Ok(EditorKind::Sublime),
            "atom" => Ok(EditorKind::Atom),
            "vscode" | "code" => Ok(EditorKind::Vscode),
            _ => Err(format!("Unknown editor: {}", s)),
        }
    }
}

/// Minimal context handed to a UI launch, e.g. `{"pid": ...}`
pub type UiContext = BTreeMap<String, String>;

/// Editor-launch service
#[async_trait]
pub trait EditorService: Send + Sync {
    /// Open the UI for `command`. Resolves once the launch is acknowledged.
    async fn launch_ui(&self, command: &str, context: &UiContext) -> Result<(), CommandError>;

    /// Open `path` in the editor
    async fn open(&self, path: &Path) -> Result<(), CommandError>;
}

/// Builds an [`EditorService`] for one invocation's editor
pub trait EditorFactory: Send + Sync {
    fn create(&self, editor: Option<EditorKind>) -> Arc<dyn EditorService>;
}
