use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lanshare::clipboard::{ClipboardSink, CommandSink, LogSink};
use lanshare::ingest::{self, CopiedHandle, DirectPath};
use lanshare::{netaddr, AppState, ClipboardStore, Config, ShareServer};

#[derive(Parser, Debug)]
#[command(name = "lanshare")]
#[command(about = "Share a directory and a clipboard with browsers on the local network")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "LANSHARE_PORT", default_value = "8080")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "LANSHARE_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Directory to share (created if missing)
    #[arg(short, long, env = "LANSHARE_DIR", default_value = "./uploads")]
    dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, env = "LANSHARE_VERBOSE")]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, env = "LANSHARE_CONFIG")]
    config: Option<PathBuf>,

    /// Copy a local file into the shared directory after startup (repeatable)
    #[arg(long = "publish", value_name = "PATH")]
    publish: Vec<PathBuf>,

    /// Read stdin and share it under NAME after startup
    #[arg(long = "publish-stdin", value_name = "NAME")]
    publish_stdin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "lanshare=debug,tower_http=debug"
    } else {
        "lanshare=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from file if provided, otherwise use defaults
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    let sink: Arc<dyn ClipboardSink> = match config.clipboard_command.clone().and_then(CommandSink::new) {
        Some(command) => Arc::new(command),
        None => Arc::new(LogSink),
    };

    let state = AppState::with_config(cli.dir.clone(), config, ClipboardStore::new(sink));
    let mut server = ShareServer::new(state.clone());

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;
    let bound = server.start(addr).await?;
    info!("Open {} on another device", netaddr::share_url(bound.port()));

    for path in cli.publish {
        match ingest::publish(&state.repository, DirectPath(path.clone())).await {
            Ok(name) => info!("Shared {} as {}", path.display(), name),
            Err(e) => warn!("Could not share {}: {}", path.display(), e),
        }
    }

    if let Some(name) = cli.publish_stdin {
        let handle = CopiedHandle::new(Some(name), tokio::io::stdin());
        if let Err(e) = ingest::publish(&state.repository, handle).await {
            error!("Could not share stdin: {}", e);
        }
    }

    shutdown_signal().await;
    info!("Shutdown signal received");
    server.stop().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
