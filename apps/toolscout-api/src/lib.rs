pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = toolscout_cli::VERSION,
	rename_all = "kebab",
	styles = toolscout_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = toolscout_config::load(&args.config)?;

	init_tracing(&config)?;

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let admin_addr: SocketAddr = config.service.admin_bind.parse()?;

	if !admin_addr.ip().is_loopback() {
		return Err(eyre::eyre!("admin_bind must be a loopback address."));
	}

	let state = AppState::new(config).await?;
	let shutdown = state.shutdown.clone();
	let app = routes::router(state.clone());
	let admin_app = routes::admin_router(state);

	tokio::spawn(watch_shutdown_signals(shutdown.clone()));

	let http_listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	let http_server =
		axum::serve(http_listener, app).with_graceful_shutdown(shutdown.clone().cancelled_owned());
	let admin_listener = TcpListener::bind(admin_addr).await?;

	tracing::info!(%admin_addr, "Admin server listening.");

	let admin_server =
		axum::serve(admin_listener, admin_app).with_graceful_shutdown(shutdown.cancelled_owned());

	tokio::try_join!(http_server.into_future(), admin_server.into_future())?;

	tracing::info!("Servers stopped.");

	Ok(())
}

fn init_tracing(config: &toolscout_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}

/// Cancels `shutdown` on SIGINT or SIGTERM.
async fn watch_shutdown_signals(shutdown: CancellationToken) {
	#[cfg(unix)]
	{
		use tokio::signal::unix::{SignalKind, signal};

		match signal(SignalKind::terminate()) {
			Ok(mut sigterm) => {
				tokio::select! {
					_ = tokio::signal::ctrl_c() => {},
					_ = sigterm.recv() => {},
				}
			},
			Err(err) => {
				tracing::warn!(error = %err, "Failed to listen for SIGTERM. Watching SIGINT only.");

				let _ = tokio::signal::ctrl_c().await;
			},
		}
	}
	#[cfg(not(unix))]
	{
		let _ = tokio::signal::ctrl_c().await;
	}

	tracing::info!("Shutdown signal received.");

	shutdown.cancel();
}
