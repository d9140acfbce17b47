//! Multicast service discovery daemon.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::Layer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use msd::{GroupId, HostConfig, NodeConfig, PeerEvent, derive_address};
use msd_config::{DEFAULT_GROUP_ID, MULTICAST_INTERFACE_ENV};

use cli::{Cli, Commands, NodeArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over the CLI flag
    let console_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level.to_string()));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    if let Some(log_file) = &cli.log_file {
        let file_dir = log_file.parent().unwrap_or_else(|| Path::new("."));
        let file_name = log_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("msd.log");

        let file_appender = tracing_appender::rolling::never(file_dir, file_name);
        let file_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trace"));

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_filter(file_filter);

        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(console_layer).init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Discover { node }) => cmd_discover(&node),
        Some(Commands::Announce { node, id, url }) => cmd_announce(&node, id, url),
        Some(Commands::Address { group, expanded }) => cmd_address(group, expanded),
        Some(Commands::GenerateConfig { json }) => cmd_generate_config(json),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

fn cmd_discover(args: &NodeArgs) -> Result<()> {
    let config = load_config(args)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(msd::run_discoverer(&config, shutdown_signal(), print_event))?;
    Ok(())
}

fn cmd_announce(args: &NodeArgs, id: Option<String>, url: Option<String>) -> Result<()> {
    let mut config = load_config(args)?;

    if id.is_some() || url.is_some() {
        let existing = config.host.take();
        config.host = Some(HostConfig {
            id: id
                .or_else(|| existing.as_ref().map(|h| h.id.clone()))
                .unwrap_or_default(),
            url: url
                .or_else(|| existing.as_ref().map(|h| h.url.clone()))
                .unwrap_or_default(),
        });
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(msd::run_instance(&config, shutdown_signal()))
        .context("Failed to run instance")?;
    Ok(())
}

fn cmd_address(group: Option<String>, expanded: bool) -> Result<()> {
    let group = group.as_deref().unwrap_or(DEFAULT_GROUP_ID);
    let group: GroupId = group
        .parse()
        .with_context(|| format!("Invalid group id: {}", group))?;
    let address = derive_address(&group);

    if expanded {
        println!("{}", address.to_expanded_string());
    } else {
        println!("{}", address);
    }
    Ok(())
}

fn cmd_generate_config(json_output: bool) -> Result<()> {
    let config = NodeConfig::generate();
    let output = if json_output {
        config.to_json()?
    } else {
        config.to_hjson_with_comments()
    };
    println!("{}", output);
    Ok(())
}

/// Load the configuration file, if any, and apply command-line overrides.
fn load_config(args: &NodeArgs) -> Result<NodeConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            if path.extension().is_some_and(|ext| ext == "json") {
                NodeConfig::from_json(&data)?
            } else {
                NodeConfig::from_hjson(&data)?
            }
        }
        None => {
            let mut config = NodeConfig::generate();
            config.apply_interface_env(std::env::var(MULTICAST_INTERFACE_ENV).ok());
            config
        }
    };

    if let Some(group) = &args.group {
        config.multicast_group_id = group.clone();
    }
    if let Some(interface) = &args.interface {
        config.multicast_interface = Some(interface.clone());
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn print_event(event: PeerEvent) {
    match event {
        PeerEvent::Joined(host) => println!("joined    {} {}", host.id, host.url),
        PeerEvent::Refreshed(host) => println!("refreshed {} {}", host.id, host.url),
        PeerEvent::LoggedOff(host) => println!("logoff    {} {}", host.id, host.url),
        PeerEvent::Expired(host) => println!("expired   {} {}", host.id, host.url),
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
