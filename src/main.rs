use clap::{Parser, Subcommand};
use std::path::PathBuf;

use bespoke_model::cli;
use bespoke_model::error::ModelResult;

#[derive(Parser)]
#[command(name = "bespoke")]
#[command(about = "Bespoke Model toolkit - fill the model template, run ROI projections")]
#[command(long_about = "Bespoke Model toolkit

COMMANDS:
  fill     - Copy sales-team input values into a Bespoke Model template
  project  - Compute a 10-year revenue/expense projection from building data

EXAMPLES:
  bespoke fill input.xlsm --template 'Bespoke Model - US - v2.xlsm'
  bespoke fill input.xlsx -t model.xlsm -o filled.xlsm
  bespoke project building.csv -o projection.xlsx

The HTTP API runs as a separate binary: bespoke-server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a Bespoke Model template from a sales-team input sheet
    Fill {
        /// Workbook containing the 'Sales Team Input Sheet' worksheet
        input: PathBuf,

        /// Bespoke Model template to copy and fill
        #[arg(short, long, env = "BESPOKE_TEMPLATE")]
        template: PathBuf,

        /// Output path (defaults next to the input, keeping the template extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute a 10-year ROI projection from tabular building data
    Project {
        /// Excel or CSV file with building columns (base_revenue, base_expenses, growth_rate, ...)
        input: PathBuf,

        /// Output workbook path (defaults to projection.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result: ModelResult<()> = match cli.command {
        Commands::Fill {
            input,
            template,
            output,
        } => cli::fill(input, template, output),
        Commands::Project { input, output } => cli::project(input, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
