use anyhow::Result;
use directory_stub::{serve, StubState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("directory stub listening on {}", listener.local_addr()?);

    serve(listener, StubState::default()).await?;
    Ok(())
}
