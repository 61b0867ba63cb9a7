use std::path::Path;

use clap::Parser;
use mocknow::{create_router, QueryRunner};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mocknow")]
#[command(about = "A local mock of the ServiceNow Table and Aggregate REST APIs", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8430)]
    port: u16,

    /// Directory of per-table dataset JSON files
    #[arg(long, default_value = "./dataset")]
    data_dir: String,

    /// Directory of per-table fields catalog JSON files
    #[arg(long, default_value = "./schemas")]
    schema_dir: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mocknow=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let runner = QueryRunner::load(Path::new(&args.data_dir), Path::new(&args.schema_dir))?;
    tracing::info!(
        "Dataset loaded from {} (schemas from {})",
        args.data_dir,
        args.schema_dir
    );

    let app = create_router(runner);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
