//! MavensMate client - Entry Point
//!
//! Resolves the invocation into a payload, executes one command and writes
//! its single result to stdout as JSON.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing::{debug, error};

use mavensmate::cli::Cli;
use mavensmate::client::{Client, CommandRequest, Services};
use mavensmate::commands::CommandOutput;
use mavensmate::errors::CommandError;
use mavensmate::filesys::file::File;
use mavensmate::logs::{init_logging, LogOptions};
use mavensmate::payload::resolve_payload;
use mavensmate::project::Project;
use mavensmate::storage::layout::StorageLayout;
use mavensmate::storage::settings::Settings;
use mavensmate::utils::version_info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let Some((name, invocation)) = cli.command.invocation() else {
        println!("{}", serde_json::to_string_pretty(&version_info())?);
        return Ok(ExitCode::SUCCESS);
    };

    // Settings and logging
    let settings_file = cli
        .settings
        .clone()
        .map(File::new)
        .unwrap_or_else(|| StorageLayout::default().settings_file());
    let mut settings = Settings::load(&settings_file)
        .await
        .context("Failed to load settings")?;
    if let Some(level) = cli.log_level.clone() {
        settings.log_level = level;
    }

    let _log_guard = init_logging(LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.log_dir.clone(),
        json_format: settings.json_logs,
        ..Default::default()
    })
    .context("Failed to initialize logging")?;

    // Active project
    let project = Project::resolve_active(cli.project.as_deref(), &std::env::current_dir()?)
        .await
        .context("Failed to load project")?;
    if let Some(project) = &project {
        debug!("Active project: {}", project.path().display());
    }

    let services = Services::remote(&settings).context("Failed to create remote client")?;
    let client = Arc::new(Client::new(Arc::new(settings), services).with_project(project));

    let result = match resolve_payload(invocation, tokio::io::stdin()).await {
        Ok(body) => {
            client
                .execute_command(CommandRequest {
                    name,
                    body,
                    editor: cli.editor,
                })
                .await
        }
        Err(e) => Err(e),
    };

    report(result)
}

fn report(result: Result<CommandOutput, CommandError>) -> anyhow::Result<ExitCode> {
    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output.to_json())?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Command failed: {}", e);
            let mut body = serde_json::json!({ "error": e.to_string(), "kind": e.kind() });
            if let CommandError::RemoteOperation { details: Some(details), .. } = &e {
                body["details"] = details.clone();
            }
            println!("{}", serde_json::to_string_pretty(&body)?);
            eprintln!("{} {}", "error:".red().bold(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}
