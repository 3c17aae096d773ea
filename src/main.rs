use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use code2map::commands::{self, BuildArgs};
use code2map::diagnostics;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "code2map",
    version,
    about = "Slice source files into per-symbol fragments with an index and a map"
)]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
    /// Log at debug level (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write fragments, INDEX and MAP for a file, or for every supported file in a directory
    Build {
        /// Tolerate files without symbols instead of failing them
        #[arg(long)]
        allow_empty: bool,
        /// Print planned fragment paths without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Output root (default: `output_dir` from .code2map.toml, else code2map-out)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Source file or directory
        path: PathBuf,
        /// Analysis root for a single file; recorded paths are relative to it
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Print a reference document: languages, layout, config, exit codes
    Info {
        /// Output as JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
    /// Print the fragment path and line range of a symbol recorded in a map
    Lookup {
        /// Map document (MAP.json or map/<source>.json)
        map: PathBuf,
        /// Qualified name, e.g. `Service#run`
        symbol: String,
    },
    /// List the symbols and warnings of a source file without writing anything
    Symbols {
        /// Source file
        file: PathBuf,
    },
}

/// Send logs to stderr so stdout carries only command output.
fn init_tracing(verbose: bool) {
    let default = if verbose { "code2map=debug" } else { "code2map=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Build { allow_empty, dry_run, out, path, root } => {
            commands::build(&BuildArgs { allow_empty, dry_run, out, path, root })
        },
        Commands::Info { json } => {
            commands::info(json);
            Ok(ExitCode::SUCCESS)
        },
        Commands::Lookup { map, symbol } => {
            commands::lookup(&map, &symbol).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Symbols { file } => commands::symbols(&file).map(|()| return ExitCode::SUCCESS),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}
