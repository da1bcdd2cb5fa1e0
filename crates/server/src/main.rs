//! docsearch Server binary
//!
//! Reads configuration from `.env`, `docsearch.yaml` and `DOCSEARCH_*`
//! environment variables, then serves until Ctrl+C or SIGTERM.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;

    server::start_server(config).await?;

    Ok(())
}
