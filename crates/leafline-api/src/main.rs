//! Leafline webhook server entry point.
//!
//! Binary name: `leafline`
//!
//! Parses CLI arguments, loads environment settings, initializes the store
//! and services, then starts the webhook server or runs a one-shot command.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use leafline_infra::settings::Settings;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,leafline=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Shell completions don't need settings or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "leafline", &mut std::io::stdout());
        return Ok(());
    }

    let settings = Settings::from_env()?;
    let state = AppState::init(&settings).await?;

    match cli.command {
        Commands::Serve { port, host } => {
            let port = port.unwrap_or(settings.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Leafline webhook listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}/webhook")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Status => {
            let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
                .fetch_one(&state.db_pool.reader)
                .await?;
            let (postings,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM postings")
                .fetch_one(&state.db_pool.reader)
                .await?;

            println!();
            println!(
                "  {} Store: {}",
                console::style("🍂").bold(),
                console::style(settings.database_url).cyan()
            );
            println!("  {users} user record(s), {postings} posting(s)");
            println!();
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

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
