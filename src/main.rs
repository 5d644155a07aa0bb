//! Shift Scheduler - Axum Server
//!
//! Run with: cargo run
//! Then open: http://localhost:7860/q/swagger-ui

use tracing_subscriber::EnvFilter;

use shift_scheduler::{api, config::ServerConfig, console};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("shift_scheduler=info".parse()?))
        .init();

    let config = ServerConfig::from_env()?;
    console::print_banner();

    let app = api::create_router();
    let addr = config.addr();
    println!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
