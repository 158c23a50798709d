//! # Main Entry Point
//!
//! `serve` runs the core server with the demo bot; `send` acts as a minimal
//! front end and forwards one message to a running server.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;

use stagebot::application::handler::MessageHandler;
use stagebot::domain::config::AppConfig;
use stagebot::domain::types::{InboundMessage, Messenger, PayloadMap, UserId};
use stagebot::infrastructure::memory_store::MemoryUserStore;
use stagebot::infrastructure::server::{Server, send_to_server};
use stagebot::interface::demo;
use stagebot::strings::logs;

#[derive(Parser)]
#[command(name = "stagebot")]
#[command(about = "Stage-based messenger bot core", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "data/config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the core server
    Serve,
    /// Forward one message to a running server
    Send {
        /// Server address, defaults to the configured one
        #[arg(short, long)]
        address: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        user: UserId,
        #[arg(short, long, default_value = "tg")]
        messenger: String,
        #[arg(long, conflicts_with = "payload")]
        text: Option<String>,
        /// Inline payload as a JSON object
        #[arg(long)]
        payload: Option<String>,
    },
}

fn load_config(path: &str) -> Result<(AppConfig, bool)> {
    if Path::new(path).exists() {
        Ok((AppConfig::load(path)?, true))
    } else {
        Ok((AppConfig::default(), false))
    }
}

fn init_logging(config: &AppConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let dir = Path::new(&config.logging.dir);
    if !dir.exists() {
        std::fs::create_dir_all(dir).context("Failed to create log directory")?;
    }

    let file_appender = tracing_appender::rolling::never(dir, &config.logging.file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = if config.debug {
        "debug"
    } else {
        config.logging.filter.as_str()
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(guard)
}

async fn serve(config: AppConfig) -> Result<()> {
    let router = Arc::new(demo::build_router(&config).context("Failed to build the router")?);
    let dispatcher =
        Arc::new(demo::build_dispatcher(&config).context("Failed to build the reply division")?);
    let store = Arc::new(MemoryUserStore::new(config.start_stage.as_str()));
    let handler = Arc::new(MessageHandler::new(router, store.clone()).with_access_store(store));

    let address = config.server.address();
    tracing::info!("{}", logs::starting(&address));
    let server =
        Server::new(handler, dispatcher).with_max_message_bytes(config.server.max_message_bytes);

    tokio::select! {
        result = server.run(&address) => result,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => tracing::info!("{}", logs::SHUTDOWN),
                Err(e) => tracing::error!("{}", logs::shutdown_fail(&e.to_string())),
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, from_file) = load_config(&cli.config)?;
    let _guard = init_logging(&config)?;

    if from_file {
        tracing::info!("{}", logs::config_loaded(&cli.config));
    } else {
        tracing::warn!("{}", logs::CONFIG_MISSING);
    }

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Send {
            address,
            user,
            messenger,
            text,
            payload,
        } => {
            let payload = payload
                .map(|raw| serde_json::from_str::<PayloadMap>(&raw))
                .transpose()
                .context("Payload must be a JSON object")?;
            let message = InboundMessage {
                user_id: user,
                messenger: Messenger::new(messenger),
                text,
                payload,
                files: Vec::new(),
            };
            let address = address.unwrap_or_else(|| config.server.address());
            send_to_server(&address, &message).await?;
            tracing::info!("{}", logs::message_sent(&address));
            Ok(())
        }
    }
}
