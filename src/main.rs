use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_tabulate::errors::Result;
use osm_tabulate::{load_user_config, AuditEtl, Etl, ProcessMapEtl, UserConfig};

#[derive(Parser, Debug)]
#[command(name = "osm-tabulate")]
#[command(about = "Clean an OpenStreetMap extract and split it into CSV tables", long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shape nodes and ways into nodes.csv, nodes_tags.csv, ways.csv, ways_nodes.csv and ways_tags.csv
    Process(RunArgs),
    /// Write key, value and contributor statistics to audit.json
    Audit(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON config file; command line flags override its values
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Source .osm file (.osm.xz is decompressed on the fly)
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Directory receiving the output files
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,

    /// Check every shaped element against the table schemas (much slower)
    #[arg(long)]
    validate: bool,

    /// Audit summary whose street names count as already observed
    #[arg(long)]
    known_streets: Option<PathBuf>,

    /// Show a progress counter
    #[arg(long)]
    progress: bool,
}

fn build_config(args: RunArgs) -> Result<UserConfig> {
    let mut config = match (&args.config, &args.input, &args.output_dir) {
        (Some(path), _, _) => load_user_config(path)?,
        (None, Some(input), Some(output_dir)) => UserConfig::new(input, output_dir),
        (None, _, _) => return Err("either --config or both --input and --output-dir are required".into()),
    };
    if let Some(input) = args.input {
        config.data_path = input;
    }
    if let Some(output_dir) = args.output_dir {
        config.dest_path = output_dir;
    }
    if let Some(known_streets) = args.known_streets {
        config.known_streets_path = Some(known_streets);
    }
    config.validate |= args.validate;
    config.progress |= args.progress;
    Ok(config)
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match cli.command {
        Command::Process(args) => {
            let config = build_config(args)?;
            ProcessMapEtl::new(&config)?.process()
        }
        Command::Audit(args) => {
            let config = build_config(args)?;
            AuditEtl::new(&config).process()
        }
    }
}
