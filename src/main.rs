use clap::Parser;
use tracing_subscriber::EnvFilter;

use fileshelf::cli;
use fileshelf::error::Result;
use fileshelf::local::DirectorySaver;
use fileshelf::manager::FileManager;
use fileshelf::storage::StorageClient;

use fileshelf::cli::Args;
use fileshelf::config::load_client_config;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging();

    if let Err(e) = run_app(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_app(args: Args) -> Result<()> {
    let mut config = load_client_config()?;
    args.apply(&mut config);

    let client = StorageClient::new(&config)?;
    let saver = DirectorySaver::new(&config.download_dir)?;
    let manager = FileManager::new(client, saver).with_auto_refresh(config.auto_refresh);

    cli::run(args.command, manager).await?;
    Ok(())
}
