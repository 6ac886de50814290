use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::warn;

use threads_capture::{serve, AppConfig, AppState, LogConfig};

#[derive(Debug, Parser)]
#[command(name = "threads-capture", about = "Threads post capture and short-link server")]
struct Cli {
    /// Address the HTTP server binds to.
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Public base URL used in OG/Twitter tags.
    #[arg(long, env = "PUBLIC_DOMAIN", default_value = "http://localhost:3000")]
    public_domain: String,

    /// JSON file the capture records are stored in.
    #[arg(long, default_value = "data/threads.json")]
    data_file: PathBuf,

    /// Directory captured PNGs are written to and served from.
    #[arg(long, default_value = "public/images")]
    images_dir: PathBuf,

    /// Log level when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    threads_capture::setup_logging(LogConfig {
        log_level: cli.log_level.clone(),
        ..Default::default()
    });

    let config = AppConfig {
        public_domain: cli.public_domain.trim_end_matches('/').to_string(),
        data_file: cli.data_file,
        images_dir: cli.images_dir,
    };

    if let Err(e) = std::fs::create_dir_all(&config.images_dir) {
        warn!(dir = %config.images_dir.display(), error = %e, "Could not create images directory");
    }

    let state = Arc::new(AppState::new(config));
    serve(state, cli.bind).await
}
