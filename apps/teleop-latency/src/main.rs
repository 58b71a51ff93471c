//! # teleop-latency
//!
//! Latency budget for a teleoperated robot arm with a video return path.
//!
//! ```text
//! teleop-latency json     <table> [output-dir]           # latency_{Best,Typical,Worst}.json
//! teleop-latency diagram  <table> [output] [scenario]    # Graphviz DOT swimlane
//! teleop-latency summary  <table> [--scenario S] [--json]
//! teleop-latency validate <table>
//! teleop-latency convert  <table> <output.json>
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use teleop_latency::cli::{
    self, CliError, DEFAULT_DIAGRAM_PATH, DEFAULT_OUTPUT_DIR, DiagramConfig, ExportConfig,
    TABLE_ENV, TableInput,
};
use teleop_latency::teleop_latency_core::Scenario;
use teleop_latency::teleop_latency_core::formats::TableFormat;

#[derive(Parser, Debug)]
#[command(name = "teleop-latency")]
#[command(version, about = "Command-to-photon latency budget for teleoperation")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// By file extension
    Auto,
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct TableArgs {
    /// Parameter table (.csv export of the sheet, or .json)
    #[arg(env = TABLE_ENV)]
    table: PathBuf,

    /// Table format
    #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
    format: FormatArg,

    /// Zero-based CSV header row (default: first row starting with "Parameter")
    #[arg(long)]
    header_row: Option<usize>,
}

impl From<TableArgs> for TableInput {
    fn from(args: TableArgs) -> Self {
        let format = match args.format {
            FormatArg::Auto => None,
            FormatArg::Csv => Some(TableFormat::Csv),
            FormatArg::Json => Some(TableFormat::Json),
        };
        TableInput {
            path: args.table,
            format,
            header_row: args.header_row,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the Best, Typical and Worst JSON reports
    Json {
        #[command(flatten)]
        table: TableArgs,

        /// Output directory
        #[arg(default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Keep exporting after a scenario fails (still exits non-zero)
        #[arg(long)]
        keep_going: bool,
    },

    /// Write the swimlane diagram as Graphviz DOT
    Diagram {
        #[command(flatten)]
        table: TableArgs,

        /// Output path
        #[arg(default_value = DEFAULT_DIAGRAM_PATH)]
        output: PathBuf,

        /// Scenario to draw
        #[arg(default_value_t = Scenario::Typical)]
        scenario: Scenario,
    },

    /// Print lane totals for one scenario
    Summary {
        #[command(flatten)]
        table: TableArgs,

        #[arg(short, long, default_value_t = Scenario::Typical)]
        scenario: Scenario,

        /// Print JSON instead of a text table
        #[arg(long)]
        json: bool,
    },

    /// Check which scenarios resolve
    Validate {
        #[command(flatten)]
        table: TableArgs,
    },

    /// Write the table as JSON
    Convert {
        #[command(flatten)]
        table: TableArgs,

        /// Output path
        output: PathBuf,
    },
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Json {
            table,
            output_dir,
            keep_going,
        } => {
            let config = ExportConfig {
                output_dir,
                keep_going,
            };
            let written = cli::cmd_json(&table.into(), &config)?;
            for path in written {
                println!("{}", path.display());
            }
        }
        Commands::Diagram {
            table,
            output,
            scenario,
        } => {
            let config = DiagramConfig { output, scenario };
            let path = cli::cmd_diagram(&table.into(), &config)?;
            println!("{}", path.display());
        }
        Commands::Summary {
            table,
            scenario,
            json,
        } => {
            print!("{}", cli::cmd_summary(&table.into(), scenario, json)?);
            if json {
                println!();
            }
        }
        Commands::Validate { table } => {
            let validation = cli::cmd_validate(&table.into())?;
            print!("{}", validation.render());
            if let Some(err) = validation.failure() {
                return Err(err);
            }
        }
        Commands::Convert { table, output } => {
            cli::cmd_convert(&table.into(), &output)?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    cli::init_logging(cli.verbose);

    if let Err(err) = run(cli.command) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
