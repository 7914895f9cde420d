//! formcheck CLI
//!
//! Serve the validation endpoint, validate a single value, or check a
//! configuration file without touching the network.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use formcheck_core::ValidationRequest;
use formcheck_runtime::transport;
use formcheck_runtime::{ProviderRegistry, RuntimeConfig, ValidationService};

#[derive(Parser)]
#[command(name = "formcheck")]
#[command(about = "LLM-backed form field validation", version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "FORMCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP validation endpoint
    Serve {
        /// Listen address, overrides server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Validate one value and print the verdict as JSON
    Validate {
        /// Value to judge
        #[arg(long)]
        value: String,

        /// Field type (text, email, number, ...)
        #[arg(short = 't', long, default_value = "text")]
        field_type: String,

        /// Natural-language validation rule
        #[arg(short, long)]
        rules: String,

        /// Report provider and parse failures instead of the safe default
        #[arg(long)]
        strict: bool,
    },

    /// Print the prompt that would be sent for a value
    Prompt {
        #[arg(long)]
        value: String,

        #[arg(short = 't', long, default_value = "text")]
        field_type: String,

        #[arg(short, long)]
        rules: String,
    },

    /// Check configuration and credential availability
    CheckConfig,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

fn build_service(config: &RuntimeConfig) -> Result<ValidationService> {
    let registry = ProviderRegistry::builtin();
    ValidationService::from_config(config, &registry).context("Failed to start validation service")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            let addr = config.bind_addr()?;
            let service = build_service(&config)?;

            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;

            transport::serve(listener, service, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for shutdown signal");
                }
                tracing::info!("Shutting down");
            })
            .await?;
        }

        Commands::Validate {
            value,
            field_type,
            rules,
            strict,
        } => {
            let service = build_service(&config)?;
            let request = ValidationRequest::new(value, field_type, rules);

            let verdict = if strict {
                service.try_validate(&request).await?
            } else {
                service.validate(&request).await?
            };
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }

        Commands::Prompt {
            value,
            field_type,
            rules,
        } => {
            let request = ValidationRequest::new(value, field_type, rules);
            println!("{}", formcheck_core::ModelPrompt::build(&request).as_str());
        }

        Commands::CheckConfig => {
            config.validate()?;
            let registry = ProviderRegistry::builtin();
            registry
                .check(&config.provider)
                .with_context(|| format!("Provider '{}' is not usable", config.provider.kind))?;

            println!(
                "provider:  {} ({})",
                config.provider.kind,
                registry.describe(&config.provider.kind).unwrap_or("unknown")
            );
            println!("model:     {}", config.completion.model);
            println!("timeout:   {:?}", config.completion.timeout);
            println!("bind:      {}", config.server.bind);
            println!("OK");
        }
    }

    Ok(())
}
