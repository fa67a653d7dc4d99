use clap::Parser;
use dlp_server::{app, cli::Cli, logging};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = cli.app_config();
    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(target = "dlproxy", %addr, "listening");
    axum::serve(listener, app::router(config)).await?;
    Ok(())
}
