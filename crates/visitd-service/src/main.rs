//! # visitd Service
//!
//! Binary entry point for the branch-visit ingestion service.
//!
//! This executable:
//! - Resolves settings from defaults, `.env`, and the environment
//! - Initializes process-wide logging (stdout + dated log file)
//! - Dispatches console commands when a subcommand is given
//! - Otherwise starts the HTTP server with graceful shutdown

mod console;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use visitd_api::{logging, start_server, AppState, ServiceError, Settings};

/// visitd - branch-visit ingestion service
#[derive(Parser)]
#[command(name = "visitd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Branch-visit ingestion HTTP service")]
struct Cli {
    /// Console command to run instead of the HTTP server
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available console commands
#[derive(Subcommand)]
enum Commands {
    /// Import branch-visit records from a previously uploaded file
    #[command(name = "importVisitUker")]
    ImportVisitUker {
        /// Name of the uploaded file to import
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Settings and logging failures happen before the subscriber exists,
    // so they go to stderr directly.
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("failed to load settings: {e}");
            std::process::exit(3);
        }
    };

    let _log_guard = match logging::init(&settings) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            std::process::exit(4);
        }
    };

    match cli.command {
        Some(Commands::ImportVisitUker { file }) => {
            if let Err(e) = console::import_visit_uker(file.as_deref()).await {
                eprintln!("{e}");
                error!(error = %e, "console command failed");
                std::process::exit(1);
            }
        }
        None => {
            info!(
                app = %settings.get_string("APP_NAME"),
                environment = %settings.get_string("APP_ENV"),
                "starting visitd"
            );

            let state = AppState::new(settings);
            if let Err(e) = start_server(state).await {
                error!(error = %e, "HTTP server terminated with an error");
                let exit_code = match e {
                    ServiceError::BindFailed { .. } => 1,
                    ServiceError::ServerFailed { .. } => 2,
                    ServiceError::Settings(_) => 3,
                    ServiceError::Logging(_) => 4,
                };
                std::process::exit(exit_code);
            }
        }
    }
}
