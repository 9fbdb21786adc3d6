//! Waypost CLI and relay server entry point.
//!
//! Binary name: `wpost`
//!
//! Parses CLI arguments, initializes the database and services, then
//! dispatches to the appropriate command handler or starts the relay
//! server.

mod cli;
mod http;
mod state;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands, SessionCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,waypost=debug",
        _ => "trace",
    };
    waypost_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "wpost", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (DB, clients, relay)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { host, port } => {
            serve(state, &host, port).await?;
        }

        Commands::Sessions { action } => match action {
            SessionCommand::List { limit } => {
                cli::session::list_sessions(&state, limit, cli.json).await?;
            }
            SessionCommand::Show { identity } => {
                cli::session::show_session(&state, &identity, cli.json).await?;
            }
            SessionCommand::Delete { identity, force } => {
                cli::session::delete_session(&state, &identity, force, cli.json).await?;
            }
        },

        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    waypost_observe::tracing_setup::shutdown_tracing();
    Ok(())
}

/// Run the relay server until Ctrl+C or SIGTERM.
async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    // Background sweep for expired report files
    let cancel = CancellationToken::new();
    let cleanup = tokio::spawn(waypost_infra::report::run_cleanup(
        Arc::clone(&state.reports),
        Duration::from_secs(3600),
        Duration::from_secs(state.config.report_ttl_minutes * 60),
        cancel.clone(),
    ));

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Waypost relay listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!(
        "  {} webhook: POST /webhooks/inbound ({} mode)",
        console::style("↳").dim(),
        state.config.mode
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    let _ = cleanup.await;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
