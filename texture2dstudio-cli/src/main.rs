//! Texture2DStudio command line.

mod commands;
mod error;

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::compress::CompressArgs;
use commands::decompress::DecompressArgs;
use commands::inspect::InspectArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "texture2dstudio")]
#[command(version = texture2dstudio::VERSION)]
#[command(about = "Compress images to ETC1/ETC2/ASTC textures and decode them back")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compress an image or slice array into a texture file
    Compress(CompressArgs),
    /// Decode a texture file to PNG
    Decompress(DecompressArgs),
    /// Print the container headers of a texture file
    Inspect(InspectArgs),
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Compress(args) => commands::compress::run(args),
        Commands::Decompress(args) => commands::decompress::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}
