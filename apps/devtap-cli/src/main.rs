//! devtap command-line entry point.
//!
//! Usage: `devtap [URL...]`. Every configured request plus each URL given on
//! the command line is issued through the instrumented host, then the
//! captured console and network logs are exported as JSON.

mod app;
mod config;
mod export;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting devtap");

    let config = config::Config::load()?;
    tracing::info!(
        export_dir = %config.export_dir,
        requests = config.requests.len(),
        "configuration loaded"
    );

    let urls: Vec<String> = std::env::args().skip(1).collect();

    let rt = tokio::runtime::Runtime::new()?;
    let written = rt.block_on(app::run(config, urls))?;

    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
