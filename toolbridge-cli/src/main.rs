//! CLI entry point for toolbridge

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use toolbridge_core::config::{Config, ConfigLoader, LoggingConfig};
use toolbridge_core::logging::init_logging;
use toolbridge_providers::{GeminiCli, ProcessRunner, ZaiClient};
use toolbridge_tools::{gemini_registry, glm_registry, McpServer, ToolRegistry};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "toolbridge")]
#[command(about = "Expose the Gemini CLI and Z.ai GLM as MCP tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a backend's tools over stdio
    Serve {
        #[arg(value_enum)]
        backend: Backend,
    },
    /// Print a backend's tool definitions as JSON
    Tools {
        #[arg(value_enum)]
        backend: Backend,
    },
    /// Write the default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Gemini,
    Glm,
}

impl Backend {
    fn server_name(&self) -> &'static str {
        match self {
            Backend::Gemini => "gemini-cli",
            Backend::Glm => "zai-glm",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = match cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };

    if let Commands::Init { force } = cli.command {
        return run_init(&loader, force);
    }

    let config = loader.load().context("failed to load configuration")?;
    let _guard = init_logging(&resolve_log_dir(&config.logging, loader.config_dir()));

    match cli.command {
        Commands::Serve { backend } => run_serve(&config, backend).await,
        Commands::Tools { backend } => {
            let registry = build_registry(&config, backend);
            println!("{}", serde_json::to_string_pretty(&registry.get_definitions())?);
            Ok(())
        }
        Commands::Init { .. } => Ok(()),
    }
}

fn run_init(loader: &ConfigLoader, force: bool) -> Result<()> {
    let config_path = loader.config_dir().join("config.json");
    if config_path.exists() && !force {
        println!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_path.display()
        );
        return Ok(());
    }

    loader.save(&Config::default())?;
    println!("Wrote {}", config_path.display());
    Ok(())
}

async fn run_serve(config: &Config, backend: Backend) -> Result<()> {
    let registry = build_registry(config, backend);
    info!(
        "Starting {} server with tools: {}",
        backend.server_name(),
        registry.tool_names().join(", ")
    );

    let server = McpServer::new(
        backend.server_name(),
        env!("CARGO_PKG_VERSION"),
        Arc::new(registry),
    );
    server.serve_stdio().await?;
    Ok(())
}

fn build_registry(config: &Config, backend: Backend) -> ToolRegistry {
    match backend {
        Backend::Gemini => {
            let gemini = &config.gemini;
            if which::which(&gemini.binary).is_err() {
                warn!(
                    "'{}' not found on PATH; gemini tools will fail until it is installed",
                    gemini.binary
                );
            }

            let cli = GeminiCli::new(
                Arc::new(ProcessRunner::new(gemini.binary.clone())),
                gemini.default_model.clone(),
                Duration::from_secs(gemini.timeout_secs),
                Duration::from_secs(gemini.admin_timeout_secs),
            );
            gemini_registry(Arc::new(cli), gemini.yolo)
        }
        Backend::Glm => {
            let zai = &config.zai;
            if zai.api_key.trim().is_empty() {
                warn!("Z.ai API key is not set; GLM tools will report a configuration error");
            }

            let client = ZaiClient::new(
                zai.api_key.clone(),
                Some(zai.api_base.clone()),
                zai.default_model.clone(),
                Duration::from_secs(zai.timeout_secs),
            );
            glm_registry(Arc::new(client))
        }
    }
}

/// Relative log directories live under the config directory
fn resolve_log_dir(logging: &LoggingConfig, config_dir: &Path) -> LoggingConfig {
    let mut logging = logging.clone();
    if Path::new(&logging.dir).is_relative() {
        logging.dir = config_dir.join(&logging.dir).to_string_lossy().to_string();
    }
    logging
}
