use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use ch_app::RegistrationOrchestrator;
use ch_core::ports::WidgetAnchor;
use ch_core::{ClubhouseConfig, FlowVariant};
use tokio::io::BufReader;
use tracing::{info, warn};

use super::config::resolve_config;
use super::tracing::init_tracing_subscriber;
use super::wiring::wire_registration;
use crate::cli::{Cli, Command};
use crate::console::{ConsoleNavigator, ConsoleSession, SessionOutcome, TracingEventPort};

/// Log files live next to the data they describe.
fn log_dir(config: &ClubhouseConfig) -> PathBuf {
    let data_dir = if config.store.data_dir.as_os_str().is_empty() {
        ch_infra::fs::default_data_dir()
    } else {
        config.store.data_dir.clone()
    };
    data_dir.join("logs")
}

pub async fn run_app(cli: Cli) -> anyhow::Result<()> {
    let (config, config_path) = resolve_config(cli.config.as_deref())?;

    if let Err(err) = init_tracing_subscriber(&log_dir(&config)) {
        eprintln!("Failed to initialize tracing: {err:#}");
    }
    match &config_path {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found, using defaults"),
    }

    match cli.command {
        Command::ShowConfig => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render configuration")?;
            println!("{rendered}");
            Ok(())
        }
        Command::Register { flow } => run_registration(&config, flow.into()).await,
    }
}

async fn run_registration(config: &ClubhouseConfig, variant: FlowVariant) -> anyhow::Result<()> {
    let navigator = Arc::new(ConsoleNavigator::new());
    let deps = wire_registration(config, navigator.clone(), Arc::new(TracingEventPort))
        .context("Failed to wire registration ports")?;
    let orchestrator = Arc::new(RegistrationOrchestrator::new(
        variant,
        deps,
        config.registration.clone(),
        &config.navigation,
    ));
    info!(flow_id = %orchestrator.flow_id(), %variant, "registration started");

    let mut session = ConsoleSession::new(
        orchestrator,
        WidgetAnchor::new(config.bot_check.anchor.clone()),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    );
    match session.run().await? {
        SessionOutcome::Completed => {
            let destination = navigator.destination().unwrap_or_default();
            println!("Continue at {destination}");
            Ok(())
        }
        SessionOutcome::Abandoned => {
            warn!(%variant, "registration abandoned");
            Ok(())
        }
    }
}
