// ABOUTME: Entry point for the aether binary.
// ABOUTME: Loads configuration, hires the CEO, then serves the HTTP API or chats with the CEO on stdin.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use aether_agent::{Swarm, create_llm_client};
use aether_core::AgentRole;
use aether_server::{AetherConfig, AppState, create_router};

#[derive(Debug, Parser)]
#[command(name = "aether", version, about = "A team of LLM agents that hire each other and track work")]
struct Cli {
    /// Deadline in seconds for each message sent to an agent from outside the swarm
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Address to bind, overriding AETHER_BIND
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Talk to the CEO from the terminal, one line per message
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "aether=debug,aether_agent=debug,aether_server=debug,tower_http=debug",
                )
            }),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AetherConfig::from_env()?;
    if let Some(secs) = cli.timeout_secs {
        config.call_timeout = Some(Duration::from_secs(secs));
    }

    let (client, model) = create_llm_client(&config.provider, config.model.as_deref())?;
    tracing::info!(provider = %config.provider, model = %model, "aether starting up");

    let swarm = Arc::new(
        Swarm::builder(client)
            .retry(config.retry_policy())
            .call_timeout(config.call_timeout)
            .build(),
    );
    let ceo = swarm.hire(AgentRole::Ceo, &config.ceo_persona).await?;
    tracing::info!(agent = %ceo.name(), "CEO hired");

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or(config.bind);
            let listener = tokio::net::TcpListener::bind(bind).await?;
            tracing::info!(%bind, "listening");
            let app = create_router(Arc::new(AppState::new(swarm)));
            axum::serve(listener, app).await?;
        }
        Command::Chat => chat(&swarm, ceo.name()).await?,
    }

    Ok(())
}

async fn chat(swarm: &Swarm, ceo: &str) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(format!("You are talking with {ceo}, the CEO. Ctrl-D to quit.\n> ").as_bytes())
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if !line.is_empty() {
            let reply = match swarm.post_message(ceo, line).await {
                Ok(reply) => reply,
                Err(e) => format!("[error] {e}"),
            };
            stdout.write_all(format!("{ceo}: {reply}\n").as_bytes()).await?;
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }
    Ok(())
}
