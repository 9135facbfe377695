use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use doc_sorter::notify;
use doc_sorter::pipeline::BatchEntry;
use doc_sorter::{config::Config, create_router, utils::init_logger, AppState, ClientContact, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "doc-sorter", about = "Sorts incoming case documents into typed folders")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the output folder structure
    Setup,

    /// Process a single document
    Process {
        /// Document to process (PDF, JPG, JPEG, PNG or TIFF)
        path: PathBuf,

        /// Notify this address about the outcome
        #[arg(long)]
        client_email: Option<String>,

        /// Name used in the greeting when none is extracted
        #[arg(long)]
        client_name: Option<String>,
    },

    /// Process every file in the input directory
    Batch {
        /// Input directory (defaults to INPUT_DIR)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Run the HTTP API (default)
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    let _log_guard = init_logger(&config.logging);
    info!("Configuration loaded: {:?}", config.server);

    let pipeline = Arc::new(Pipeline::from_config(&config));
    pipeline.setup()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Setup => {
            std::fs::create_dir_all(&config.sorter.input_dir)?;
            println!("Input folder ready at {}", config.sorter.input_dir.display());
            println!("Output folders ready under {}", pipeline.layout().root().display());
        }
        Commands::Process {
            path,
            client_email,
            client_name,
        } => {
            let contact = ClientContact::from_parts(client_email, client_name);
            let report = tokio::task::spawn_blocking(move || pipeline.process_file(&path, contact.as_ref())).await??;
            println!("{}", report.outcome);
            if let Some(new_filename) = &report.new_filename {
                println!("Filed as {}", new_filename);
            }
        }
        Commands::Batch { input } => {
            let input = input.unwrap_or_else(|| config.sorter.input_dir.clone());
            let report = tokio::task::spawn_blocking(move || pipeline.process_all(&input)).await??;

            for (file, entry) in &report.results {
                match entry {
                    BatchEntry::Done(result) => println!("{}: {}", file, result.outcome),
                    BatchEntry::Failed { error } => println!("{}: FAILED ({})", file, error),
                }
            }
            println!();
            for (outcome, count) in report.counts() {
                println!("{:<20} {}", outcome, count);
            }

            if report.failures() > 0 {
                anyhow::bail!("{} document(s) failed", report.failures());
            }
        }
        Commands::Serve => {
            let (_, mailbox) = notify::transport_from_config(&config.notify);
            let state = AppState {
                config: config.clone(),
                pipeline,
                mailbox,
            };
            let app = create_router(state);

            let host: std::net::IpAddr = config
                .server
                .host
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid HOST {}: {}", config.server.host, e))?;
            let addr = SocketAddr::new(host, config.server.port);
            info!("Server listening on {}", addr);

            let listener = TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .await
                .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
        }
    }

    Ok(())
}
