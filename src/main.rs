use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod client;
mod config;
mod dispatch;
mod edit;
mod format;
mod normalize;
mod prompts;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_from(cli::with_default_command(std::env::args_os()));
    setup_logging(cli.verbose);

    if let Err(err) = cli.run().await {
        format::report_error(&err);
        std::process::exit(1);
    }
}

fn setup_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info,hyper=warn,reqwest=warn"),
        2 => EnvFilter::new("debug,hyper=warn,reqwest=warn"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
