//! azdo - Azure DevOps Pipelines over REST, MCP, and the command line.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use azdo_azure::AzureDevOpsClient;
use azdo_core::config::Config;
use azdo_core::{Pipeline, PipelineService, RunRequest};
use azdo_storage::{resolve_token, CredentialStore, KeychainStore, TOKEN_KEY};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "azdo")]
#[command(author, version, about = "Azure DevOps Pipelines adapter", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST server
    Serve {
        /// Port to listen on (defaults to config, then 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start the MCP server on stdin/stdout
    Mcp,

    /// List or run pipelines
    Pipelines {
        #[command(subcommand)]
        command: PipelineCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum PipelineCommands {
    /// List pipelines in the project
    List,

    /// Trigger a pipeline run by name
    Run {
        /// Pipeline name (exact, case-sensitive)
        name: String,

        /// Pipeline variable as key=value (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,

        /// Branch to run
        #[arg(long)]
        branch: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print one value (e.g. azure.project)
    Get { key: String },

    /// Set one value (e.g. azure.project my-project)
    Set { key: String, value: String },

    /// Store or delete the access token in the OS keychain
    Token {
        /// Token value
        #[arg(required_unless_present = "delete")]
        value: Option<String>,

        /// Remove the stored token
        #[arg(long, conflicts_with = "value")]
        delete: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout belongs to MCP, so logs always go to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command {
        Some(Commands::Serve { port }) => {
            let (service, config) = build_service(&config_path)?;
            let port = port.unwrap_or_else(|| config.server.port());
            let addr = SocketAddr::from(([0, 0, 0, 0], port));

            azdo_rest::serve(service, addr)
                .await
                .with_context(|| format!("REST server failed on {}", addr))?;
        }
        Some(Commands::Mcp) => {
            let (service, _) = build_service(&config_path)?;
            azdo_mcp::McpServer::new(service).run().await?;
        }
        Some(Commands::Pipelines { command }) => {
            let (service, _) = build_service(&config_path)?;
            match command {
                PipelineCommands::List => {
                    let pipelines = service.list_pipelines().await?;
                    print!("{}", format_table(&pipelines));
                }
                PipelineCommands::Run { name, vars, branch } => {
                    let request = RunRequest {
                        variables: vars.into_iter().collect(),
                        branch,
                    };
                    let run = service.trigger_run(&name, request).await?;
                    println!("{}", serde_json::to_string_pretty(&run)?);
                }
            }
        }
        Some(Commands::Config { command }) => handle_config(command, &config_path)?,
        None => {
            println!("azdo - Azure DevOps Pipelines adapter");
            println!("Run with --help for usage information");
        }
    }

    Ok(())
}

/// Load config, apply env and keychain, and fail fast on missing settings.
fn build_service(config_path: &Path) -> anyhow::Result<(PipelineService, Config)> {
    let mut config = Config::load_from(config_path)?;
    config.apply_env();
    resolve_token(&mut config, &KeychainStore::new());

    let settings = config.validate()?;
    tracing::debug!(?settings, "Resolved settings");

    let client = AzureDevOpsClient::from_settings(&settings);
    Ok((PipelineService::new(Arc::new(client)), config))
}

fn handle_config(command: ConfigCommands, config_path: &Path) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = Config::load_from(config_path)?;
            println!("# {}", config_path.display());
            print!("{}", toml::to_string_pretty(&config)?);

            let token = if KeychainStore::new().exists(TOKEN_KEY) {
                "stored in keychain"
            } else {
                "not stored"
            };
            println!("# access token: {}", token);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load_from(config_path)?;
            match config.get(&key)? {
                Some(value) => println!("{}", value),
                None => bail!("{} is not set", key),
            }
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_from(config_path)?;
            config.set(&key, &value)?;
            config.save_to(config_path)?;
            println!("{} = {}", key, value);
        }
        ConfigCommands::Token { value, delete } => {
            let store = KeychainStore::new();
            if delete {
                store.delete(TOKEN_KEY)?;
                println!("Access token removed from keychain");
            } else if let Some(value) = value {
                store.store(TOKEN_KEY, value.trim())?;
                println!("Access token stored in keychain");
            }
        }
    }
    Ok(())
}

/// Parse a `KEY=VALUE` pipeline variable.
fn parse_var(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("invalid variable '{}': expected KEY=VALUE", s)),
    }
}

fn format_table(pipelines: &[Pipeline]) -> String {
    if pipelines.is_empty() {
        return "No pipelines found\n".to_string();
    }

    let id_width = pipelines
        .iter()
        .map(|p| p.id.to_string().len())
        .max()
        .unwrap_or(0)
        .max("ID".len());
    let name_width = pipelines
        .iter()
        .map(|p| p.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut out = format!("{:<id_width$}  {:<name_width$}  URL\n", "ID", "NAME");
    for p in pipelines {
        out.push_str(&format!(
            "{:<id_width$}  {:<name_width$}  {}\n",
            p.id, p.name, p.web_url
        ));
    }
    out
}
