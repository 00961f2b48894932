mod calc;
mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Abacus multi-user calculator service.
#[derive(Parser)]
#[command(name = "abacus", version, about = "Abacus multi-user calculator service")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve(serve::ServeArgs),

    /// Evaluate one calculation without a server
    Eval {
        /// Operation name (addition, subtraction, multiplication, division,
        /// exponentiation, power, modulus)
        operation: String,
        /// Inputs as a JSON array, e.g. '[1, 2, 3]'
        inputs: String,
    },

    /// Summarize a JSON file of calculation records
    Stats {
        /// Path to a JSON array of calculation records
        records: PathBuf,
        /// Only count records owned by this user id
        #[arg(long)]
        user: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match cli.command {
        Commands::Serve(args) => {
            serve::cmd_serve(args, cli.output, cli.quiet);
        }
        Commands::Eval { operation, inputs } => {
            calc::cmd_eval(&operation, &inputs, cli.output, cli.quiet);
        }
        Commands::Stats { records, user } => {
            calc::cmd_stats(&records, user.as_deref(), cli.output, cli.quiet);
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG`
/// overrides the default level.
fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

/// Report `msg` and exit with status 1.
pub(crate) fn fail(msg: &str, output: OutputFormat, quiet: bool) -> ! {
    report_error(msg, output, quiet);
    process::exit(1);
}
