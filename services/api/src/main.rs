use anyhow::Context;
use clap::{Parser, Subcommand};
use sea_orm::Database;
use tracing::info;

use tabletop_api::config::ApiConfig;
use tabletop_api::router::build_router;
use tabletop_api::state::AppState;
use tabletop_api::usecase::admin::{SeedAdminInput, SeedAdminUseCase};
use tabletop_core::tracing::init_tracing;

#[derive(Parser)]
#[command(name = "tabletop", about = "Multi-tenant restaurant ordering API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Create the initial super admin if the email is not registered yet.
    SeedAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Super Admin")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = ApiConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    let state = AppState {
        db,
        tokens: config.tokens,
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let router = build_router(state);
            let addr = format!("0.0.0.0:{}", config.api_port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            info!("tabletop api listening on {addr}");
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("server error")?;
            info!("tabletop api stopped");
        }
        Command::SeedAdmin {
            email,
            password,
            name,
        } => {
            let usecase = SeedAdminUseCase {
                users: state.user_repo(),
            };
            let (admin, created) = usecase
                .execute(SeedAdminInput {
                    email,
                    password,
                    name,
                })
                .await?;
            info!(user_id = admin.id, email = %admin.email, created, "seed-admin finished");
        }
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM so in-flight requests can finish.
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}
