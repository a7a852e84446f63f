//! Command-line definitions
//!
//! Only argument structures live here; turning them into a payload is the
//! job of [`crate::payload`].

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::CommandName;
use crate::editor::EditorKind;
use crate::logs::LogLevel;
use crate::payload::Invocation;

/// Top-level CLI
#[derive(Parser, Debug)]
#[command(name = "mavensmate", about = "Manage and deploy metadata projects", version)]
pub struct Cli {
    /// Editor invoking this command (sublime, atom, vscode)
    #[arg(long, global = true, value_name = "EDITOR")]
    pub editor: Option<EditorKind>,

    /// Settings file (default: ~/.mavensmate/settings.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Project directory (default: nearest project above the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

/// `--ui` switch shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct UiArgs {
    /// Launches the default UI for the selected command.
    #[arg(long)]
    pub ui: bool,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploys metadata to one or more remote orgs
    Deploy {
        #[command(flatten)]
        ui: UiArgs,
    },
    /// Creates a new MavensMate project from an existing directory
    NewProjectFromExistingDirectory {
        #[command(flatten)]
        ui: UiArgs,
        /// Directory to create new MavensMate project from
        #[arg(short, long, value_name = "DIR")]
        directory: Option<PathBuf>,
    },
    /// Edits the metadata subscription of the active project
    EditProject {
        #[command(flatten)]
        ui: UiArgs,
    },
    /// Updates the credentials of the active project
    UpdateCreds {
        #[command(flatten)]
        ui: UiArgs,
    },
    /// Prints version information as JSON
    Version,
}

impl Command {
    /// The command to execute and its raw invocation; `None` for `version`
    pub fn invocation(&self) -> Option<(CommandName, Invocation)> {
        match self {
            Command::Deploy { ui } => Some((CommandName::Deploy, Invocation::new(ui.ui))),
            Command::NewProjectFromExistingDirectory { ui, directory } => Some((
                CommandName::NewProjectFromExistingDirectory,
                Invocation::new(ui.ui).with_flag(
                    "directory",
                    directory.as_ref().map(|d| d.to_string_lossy().into_owned()),
                ),
            )),
            Command::EditProject { ui } => Some((CommandName::EditProject, Invocation::new(ui.ui))),
            Command::UpdateCreds { ui } => Some((CommandName::UpdateCreds, Invocation::new(ui.ui))),
            Command::Version => None,
        }
    }
}
