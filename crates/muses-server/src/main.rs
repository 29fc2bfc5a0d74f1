//! muses server binary.
//!
//! Serves one resource (`users`, `museums` or `artworks`) over HTTP. Reads
//! `config.toml` (or the path given with `--config`) if present; environment
//! variables override the file.
//!
//! ```text
//! PORT=8081 AUTH_SVC_NAME=auth muses --resource users
//! ```

use std::{future::IntoFuture as _, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use muses_server::{Resource, ServerConfig};
use tokio::{net::TcpListener, sync::Notify};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "MuSES resource service")]
struct Cli {
  /// Which resource this process serves.
  #[arg(short, long, value_enum)]
  resource: Resource,

  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(cli.resource, &cli.config)
    .context("failed to load configuration")?;

  let app = muses_server::build(cli.resource, &cfg)
    .await
    .with_context(|| format!("failed to start {:?} service", cli.resource))?;

  let address = cfg.address();
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  info!("Listening on http://{address}");

  // Stop accepting on the first signal, then give in-flight requests the
  // grace period to finish.
  let stopping = Arc::new(Notify::new());
  let server = axum::serve(listener, app)
    .with_graceful_shutdown({
      let stopping = Arc::clone(&stopping);
      async move {
        wait_for_signal().await;
        info!("shutting down");
        stopping.notify_one();
      }
    })
    .into_future();

  let grace = cfg.shutdown_grace();
  tokio::select! {
    res = server => res.context("server error")?,
    () = async {
      stopping.notified().await;
      tokio::time::sleep(grace).await;
    } => warn!(?grace, "grace period elapsed with requests still in flight"),
  }

  info!("stopped");
  Ok(())
}

async fn wait_for_signal() {
  #[cfg(unix)]
  {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sigterm) => {
        tokio::select! {
          _ = sigterm.recv() => {},
          _ = tokio::signal::ctrl_c() => {},
        }
      }
      Err(e) => {
        warn!(error = %e, "cannot listen for SIGTERM, relying on ctrl-c");
        let _ = tokio::signal::ctrl_c().await;
      }
    }
  }

  #[cfg(not(unix))]
  {
    let _ = tokio::signal::ctrl_c().await;
  }
}
