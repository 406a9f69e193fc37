//! Bespoke Model API server binary.
//!
//! HTTP REST API for the model-fill and projection workflows.

use std::path::PathBuf;

use clap::Parser;

use bespoke_model::api::{run_server, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "bespoke-server")]
#[command(version)]
#[command(about = "Bespoke Model API server")]
#[command(long_about = r#"
Bespoke Model API server

Endpoints:
  POST /api/process             - Fill the Bespoke Model from an uploaded
                                  sales-team input sheet (multipart 'file')
  POST /api/project             - 10-year ROI projection from tabular
                                  building data (multipart 'file')
  GET  /api/download/:filename  - Download a generated workbook
  GET  /health                  - Health check
  GET  /version                 - Server version info
  GET  /                        - Service info

Features:
  - CORS enabled for cross-origin requests
  - Graceful shutdown on SIGINT/SIGTERM
  - Tracing and structured logging

Example usage:
  bespoke-server --template 'Bespoke Model - US - v2.xlsm'
  bespoke-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/process \
    -F file=@input.xlsm
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "BESPOKE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "BESPOKE_PORT")]
    port: u16,

    /// Path to the Bespoke Model template workbook
    #[arg(
        short,
        long,
        default_value = "Bespoke Model - US - v2.xlsm",
        env = "BESPOKE_TEMPLATE"
    )]
    template: PathBuf,

    /// Directory for generated files (defaults to the system temp dir)
    #[arg(long, env = "BESPOKE_TEMP_DIR")]
    temp_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        template_path: args.template,
        temp_dir: args.temp_dir.unwrap_or_else(std::env::temp_dir),
    };

    run_server(config).await
}
