use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use gmail_mcp_bridge::gmail::auth::SetupFlow;
use gmail_mcp_bridge::{server, Config};

#[derive(Parser)]
#[command(name = "gmail-mcp-bridge")]
#[command(about = "Gmail MCP bridge server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the one-time OAuth setup flow and print the credential header
    Setup {
        /// Google OAuth client ID
        #[arg(long)]
        client_id: String,

        /// Google OAuth client secret
        #[arg(long)]
        client_secret: String,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays free for tooling
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Setup {
            client_id,
            client_secret,
        }) => run_setup(config, client_id, client_secret).await,
        None => server::serve(config).await,
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run_setup(
    config: Config,
    client_id: String,
    client_secret: String,
) -> gmail_mcp_bridge::Result<()> {
    let flow = SetupFlow::new(config, client_id, client_secret);
    let credentials = flow.run().await?;

    println!("\nSetup complete. Use this Authorization header value:");
    println!("{}", credentials.to_header());
    Ok(())
}
