use clap::Parser;
use colored::Colorize;
use std::time::Duration;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use directory_client::{run_session, ClientOptions, DirectoryClient};

/// directory-client - query the gRPC user directory
#[derive(Parser)]
#[command(name = "directory-client")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Server URL, shared by gRPC and the token endpoint
    #[arg(long, env = "DIRECTORY_SERVER", default_value = "http://localhost:5001")]
    server: String,

    /// Group id sent with list and stream requests
    #[arg(long, default_value_t = 1)]
    group_id: i32,

    /// Deadline for each call, in seconds (no deadline when omitted)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);

        if let Some(source) = e.source() {
            eprintln!("\n{} {}", "Caused by:".yellow(), source);
        }

        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let options = ClientOptions {
        server: cli.server,
        group_id: cli.group_id,
        timeout: cli.timeout_secs.map(Duration::from_secs),
    };

    let mut client = DirectoryClient::connect(&options).await?;
    let input = BufReader::new(tokio::io::stdin());
    let mut output = std::io::stdout();

    run_session(&mut client, input, &mut output).await?;
    Ok(())
}
