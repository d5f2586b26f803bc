//! Command-line interface: argument definitions, config loading and tracing.

mod args;
mod handlers;

use std::process::ExitCode;

use anyhow::{Context, Result};
use cmdgate_config::{ConfigManager, DebugConfig};
use cmdgate_core::PolicyAction;

pub use args::{Cli, Commands, ProfilesCommand};

/// What a subcommand reports back to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Verdict(PolicyAction),
}

impl Outcome {
    /// 0 = allow, 2 = deny, 3 = confirm.
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Success | Self::Verdict(PolicyAction::Allow) => ExitCode::SUCCESS,
            Self::Verdict(PolicyAction::Deny) => ExitCode::from(2),
            Self::Verdict(PolicyAction::Confirm) => ExitCode::from(3),
        }
    }
}

pub fn run(args: Cli) -> Result<Outcome> {
    let manager = load_config(&args)?;
    initialize_tracing_from_config(&manager.config().debug);
    if let Some(path) = manager.config_path() {
        tracing::debug!(path = %path.display(), "using configuration file");
    }

    match args.command {
        Commands::Parse {
            command,
            backend,
            json,
        } => handlers::handle_parse(manager.config(), &command, backend, json),
        Commands::Check {
            commands,
            profile,
            json,
            summary,
        } => handlers::handle_check(
            manager.config(),
            &commands,
            profile.as_deref(),
            json,
            summary,
        ),
        Commands::Resolve { group, profile } => {
            handlers::handle_resolve(manager.config(), &group, profile.as_deref())
        }
        Commands::Profiles { command } => handlers::handle_profiles(manager.config(), command),
    }
}

fn load_config(args: &Cli) -> Result<ConfigManager> {
    if let Some(path) = &args.config {
        return ConfigManager::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()));
    }
    if let Some(workspace) = &args.workspace {
        anyhow::ensure!(
            workspace.is_dir(),
            "Workspace path does not exist or is not a directory: {}",
            workspace.display()
        );
        return ConfigManager::load_from_workspace(workspace).with_context(|| {
            format!(
                "Failed to load configuration for workspace {}",
                workspace.display()
            )
        });
    }
    ConfigManager::load().context("Failed to load configuration")
}

/// `RUST_LOG` takes precedence over any configuration.
pub fn initialize_tracing_from_env() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Install a subscriber from `[debug]` when enabled and `RUST_LOG` is unset.
fn initialize_tracing_from_config(debug: &DebugConfig) {
    if !debug.enable_tracing || std::env::var("RUST_LOG").is_ok() {
        return;
    }

    let directive = debug.filter_directive();
    let installed = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&directive))
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        tracing::info!(filter = %directive, "Debug tracing enabled");
    }
}
