use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kodgen", author, version, about)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// The project directory to generate code for; must contain an `Include`
    /// subdirectory.
    #[arg(value_name = "WORKING_DIRECTORY")]
    working_directory: PathBuf,

    /// Silences all non-essential logging.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Enables additional detailed logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    kodgen::cmd::generate::run(&cli.working_directory)
}
