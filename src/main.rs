use std::process;

use clap::Parser;
use commit_scribe::Cli;

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout carries only the commit message.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli.execute().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
