//! Simulon CLI and HTTP server entry point.
//!
//! Binary name: `simulon`
//!
//! `serve` wires configuration, provider, session store and event logging,
//! then serves the HTTP API until Ctrl+C / SIGTERM. `think` is the terminal
//! client shell talking to a running server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use simulon_observe::tracing_setup::{default_filter, init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "simulon", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli.otel, default_filter(cli.verbose, cli.quiet))
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = match cli.command {
        Commands::Serve { port, host } => serve(&host, port, cli.quiet).await,
        Commands::Think(args) => cli::think::run(args, cli.json).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    shutdown_tracing();
    result
}

async fn serve(host: &str, port: u16, quiet: bool) -> anyhow::Result<()> {
    let (state, config) = AppState::init().await?;

    let shutdown = CancellationToken::new();
    let sweeper = state.spawn_background(&config, shutdown.clone());

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, model = %config.provider.model, "simulon listening");

    if !quiet {
        println!(
            "  {} Simulon listening on {}",
            console::style("⚡").bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "session sweeper did not stop cleanly");
    }

    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
