// src/main.rs
// continuum - session context tracking for AI-assisted development

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use continuum::layout::ContextLayout;
use continuum::mcp::{ContinuumServer, ProjectRequest, tools};
use continuum::tokens::{DEFAULT_MAX_TOKENS, TokenCounter};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "continuum")]
#[command(about = "Session context tracking and restoration for AI coding assistants")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Used when no subcommand is given
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Args, Debug, PartialEq)]
struct ServeArgs {
    /// Token budget for projects that have no config.json yet
    #[arg(long, env = "CONTINUUM_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u64,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Run as MCP server over stdio (default)
    Serve(ServeArgs),

    /// Create the .context directory for a project
    Init {
        /// Project path
        path: PathBuf,
        /// Project name (default: directory name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Print the recorded summary for a project
    Status {
        /// Project path (default: current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,
    },
}

impl Cli {
    fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Serve(self.serve))
    }
}

async fn run_mcp_server(max_tokens: u64) -> Result<()> {
    info!(max_tokens, "Starting MCP server");
    let server = ContinuumServer::new(TokenCounter::new(max_tokens));

    let transport = rmcp::transport::io::stdio();
    let service = rmcp::serve_server(server, transport).await?;
    service.waiting().await?;

    Ok(())
}

async fn run_init(path: PathBuf, name: Option<String>) -> Result<()> {
    let layout = ContextLayout::new(&path);
    let seeded = layout.ensure_structure(name.as_deref()).await?;

    if seeded {
        println!("Initialized {}", layout.context_dir().display());
    } else {
        println!(
            "{} already initialized (config.json kept)",
            layout.context_dir().display()
        );
    }
    Ok(())
}

async fn run_status(project: Option<PathBuf>) -> Result<()> {
    let project = match project {
        Some(p) => p,
        None => std::env::current_dir()?,
    };

    let server = ContinuumServer::default();
    let summary = tools::restore::project_summary(
        &server,
        ProjectRequest {
            project_path: Some(project.to_string_lossy().into_owned()),
        },
    )
    .await
    .map_err(anyhow::Error::msg)?;

    print!("{}", summary);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (global first, then project - project overrides)
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".continuum/.env"));
    }
    let _ = dotenvy::dotenv();

    let command = Cli::parse().into_command();

    let log_level = match &command {
        Commands::Serve(_) => Level::WARN, // stdout carries the protocol
        Commands::Init { .. } | Commands::Status { .. } => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match command {
        Commands::Serve(args) => run_mcp_server(args.max_tokens).await?,
        Commands::Init { path, name } => run_init(path, name).await?,
        Commands::Status { project } => run_status(project).await?,
    }

    Ok(())
}
