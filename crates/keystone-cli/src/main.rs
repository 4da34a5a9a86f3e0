mod config;

use clap::{Parser, Subcommand, ValueEnum};
use config::{KeystoneConfig, API_KEY_ENV};
use keystone_agent::build_client;
use keystone_builtins::register_builtins;
use keystone_core::ProjectInput;
use keystone_gateway::GatewayServer;
use keystone_orchestrator::{AgentRegistry, Orchestrator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keystone", about = "Keystone construction-project analysis")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "keystone.toml")]
    config: PathBuf,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Analyze one project brief and print the consolidated output
    Run {
        /// JSON brief to analyze; `-` reads stdin
        #[arg(short, long)]
        input: PathBuf,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the agent execution waves
    Graph,
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn build_orchestrator(config: &KeystoneConfig) -> anyhow::Result<Orchestrator> {
    let client = build_client(config.model.clone())?;
    let mut registry = AgentRegistry::new();
    register_builtins(&mut registry, client);
    Ok(Orchestrator::new(registry, config.orchestrator.clone())?)
}

fn require_api_key(config: &KeystoneConfig) -> anyhow::Result<()> {
    if config.has_api_key() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "No model API key: set [model].api_key in the config file or {API_KEY_ENV}"
        ))
    }
}

async fn read_brief(path: &Path) -> anyhow::Result<ProjectInput> {
    let text = if path.as_os_str() == "-" {
        tokio::task::spawn_blocking(|| std::io::read_to_string(std::io::stdin())).await??
    } else {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            anyhow::anyhow!("Failed to read brief '{}': {e}", path.display())
        })?
    };
    Ok(serde_json::from_str(&text)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    let cli = Cli::parse();
    init_logging(cli.log_format);

    let mut config = KeystoneConfig::load(&cli.config).await?;
    config.apply_api_key_fallback(std::env::var(API_KEY_ENV).ok());

    match cli.command {
        Commands::Serve { host, port } => {
            require_api_key(&config)?;
            let orchestrator = Arc::new(build_orchestrator(&config)?);
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{host}:{port}");

            let app = GatewayServer::build(orchestrator);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Keystone gateway listening on {}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    if tokio::signal::ctrl_c().await.is_err() {
                        warn!("Could not install Ctrl-C handler");
                        std::future::pending::<()>().await;
                    }
                    info!("Shutting down");
                })
                .await?;
        }
        Commands::Run { input, pretty } => {
            require_api_key(&config)?;
            let orchestrator = build_orchestrator(&config)?;
            let brief = read_brief(&input).await?;
            let output = orchestrator.process(brief).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&output)?
            } else {
                serde_json::to_string(&output)?
            };
            println!("{json}");
        }
        Commands::Graph => {
            let orchestrator = build_orchestrator(&config)?;
            let graph = orchestrator.graph();
            for (i, wave) in graph.waves().iter().enumerate() {
                println!("wave {}:", i + 1);
                for name in wave {
                    let deps = graph.dependencies(name).unwrap_or_default();
                    if deps.is_empty() {
                        println!("  {name}");
                    } else {
                        println!("  {name} <- {}", deps.join(", "));
                    }
                }
            }
        }
    }

    Ok(())
}
