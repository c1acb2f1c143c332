//! fs-router
//!
//! Serves a directory of TOML route manifests over HTTP.
//!
//! ```text
//!     Client Request
//!     ──▶ axum (timeout, request ID, trace)
//!     ──▶ FsRouter::handle
//!           ├─ lookup cache ──▶ route trie ◀── routes directory (watched)
//!           ├─ handler cache ──▶ ManifestLoader (reads the route file)
//!           └─ static files / 404
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use fs_router::config::{load_config, RouterConfig};
use fs_router::lifecycle::startup;
use fs_router::observability::logging;
use fs_router::routing::scan;
use fs_router::ManifestLoader;

#[derive(Parser)]
#[command(name = "fs-router")]
#[command(about = "File-system driven HTTP router", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "fs-router.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the routes directory
    Serve,
    /// Print the route table in matching priority order
    Routes,
}

fn load(path: &Path) -> Result<RouterConfig, ExitCode> {
    load_config(path).map_err(|e| {
        eprintln!("Error: failed to load {}: {}", path.display(), e);
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load(&cli.config) {
        Ok(config) => config,
        Err(code) => return code,
    };

    match cli.command {
        Commands::Serve => {
            if let Err(e) = logging::init(&config.observability) {
                eprintln!("Error: failed to initialize logging: {}", e);
                return ExitCode::FAILURE;
            }
            tracing::info!("fs-router v{} starting", env!("CARGO_PKG_VERSION"));

            match startup::run(config, Arc::new(ManifestLoader::new())).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "Startup failed");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Routes => match scan(config.routes.root, config.routes.extensions).await {
            Ok(table) => {
                let prefix = config.routes.prefix;
                for (pattern, file) in table.routes() {
                    let url = if prefix.is_empty() || pattern != "/" {
                        format!("{prefix}{pattern}")
                    } else {
                        prefix.clone()
                    };
                    println!("{url:<40} {file}");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}
