//! Process-backed editor service

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use crate::editor::{EditorFactory, EditorKind, EditorService, UiContext};
use crate::errors::CommandError;

/// Creates [`ProcessEditor`]s sharing one configuration
pub struct ProcessEditorFactory {
    ui_base_url: String,
    overrides: BTreeMap<EditorKind, PathBuf>,
}

impl ProcessEditorFactory {
    pub fn new(ui_base_url: &str, overrides: BTreeMap<EditorKind, PathBuf>) -> Self {
        Self {
            ui_base_url: ui_base_url.to_string(),
            overrides,
        }
    }
}

impl EditorFactory for ProcessEditorFactory {
    fn create(&self, editor: Option<EditorKind>) -> Arc<dyn EditorService> {
        let binary = editor.map(|kind| {
            self.overrides
                .get(&kind)
                .cloned()
                .unwrap_or_else(|| PathBuf::from(kind.default_binary()))
        });

        Arc::new(ProcessEditor {
            editor,
            binary,
            ui_base_url: self.ui_base_url.clone(),
        })
    }
}

/// Opens projects by spawning the editor executable and UIs in the browser
pub struct ProcessEditor {
    editor: Option<EditorKind>,
    binary: Option<PathBuf>,
    ui_base_url: String,
}

impl ProcessEditor {
    fn resolve_binary(&self) -> Result<PathBuf, CommandError> {
        let binary = self
            .binary
            .as_ref()
            .ok_or_else(|| CommandError::Delegation("No editor configured".to_string()))?;

        which::which(binary).map_err(|e| {
            CommandError::Delegation(format!("Editor executable {} not found: {}", binary.display(), e))
        })
    }
}

/// `<base>/app/<command>?<context>`
pub fn ui_url(base: &str, command: &str, context: &UiContext) -> Result<Url, CommandError> {
    let mut url = Url::parse(base)
        .and_then(|base| base.join(&format!("app/{}", command)))
        .map_err(|e| CommandError::Config(format!("Invalid UI base URL {}: {}", base, e)))?;

    if !context.is_empty() {
        url.query_pairs_mut().extend_pairs(context.iter());
    }
    Ok(url)
}

#[async_trait]
impl EditorService for ProcessEditor {
    async fn launch_ui(&self, command: &str, context: &UiContext) -> Result<(), CommandError> {
        let url = ui_url(&self.ui_base_url, command, context)?;
        info!("Launching UI for {}: {}", command, url);

        let target = url.to_string();
        tokio::task::spawn_blocking(move || webbrowser::open(&target))
            .await
            .map_err(|e| CommandError::Internal(format!("UI launch task failed: {}", e)))?
            .map_err(|e| CommandError::Delegation(format!("Unable to open {}: {}", url, e)))
    }

    async fn open(&self, path: &Path) -> Result<(), CommandError> {
        let binary = self.resolve_binary()?;
        debug!("Opening {} with {}", path.display(), binary.display());

        let status = Command::new(&binary)
            .arg(path)
            .status()
            .await
            .map_err(|e| CommandError::Delegation(format!("Failed to run {}: {}", binary.display(), e)))?;

        if !status.success() {
            return Err(CommandError::Delegation(format!(
                "{} exited with {} while opening {}",
                self.editor.map(|e| e.as_str()).unwrap_or("editor"),
                status,
                path.display()
            )));
        }

        Ok(())
    }
}
