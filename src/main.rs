use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ctorize::config::Config;
use ctorize::discover::Discovery;
use ctorize::engine::Engine;
use ctorize::repair::Repairer;
use ctorize::runner::{RunOptions, RunReport, Runner};
use ctorize::util::truncate;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const MAX_ERROR_LEN: usize = 240;

#[derive(Parser, Debug)]
#[command(
    name = "ctorize",
    about = "Move Angular inject() fields into constructor parameters",
    version,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    convert: ConvertArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert inject() fields (the default)
    Convert(ConvertArgs),
    /// Only fix token parameters and stale imports in already converted files
    Repair(CommonArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Source root to process
    #[arg(default_value = "src")]
    path: PathBuf,

    /// Config file (defaults to ctorize.toml in the current directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report what would change without writing files
    #[arg(long)]
    dry_run: bool,

    /// Extra file names to leave untouched
    #[arg(long = "skip", value_name = "NAME")]
    skip: Vec<String>,

    /// File extensions to process, replacing the configured list
    #[arg(long = "ext", value_name = "EXT")]
    ext: Vec<String>,

    /// Print the run report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug, Clone)]
struct ConvertArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Skip the token repair pass after conversion
    #[arg(long)]
    no_repair: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let code = match cli.command {
        Some(Commands::Convert(args)) => run_convert(args)?,
        Some(Commands::Repair(args)) => run_repair(args)?,
        None => run_convert(cli.convert)?,
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("ctorize=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(args: &CommonArgs) -> Result<Config> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let mut config = Config::resolve(&cwd, args.config.as_deref())?;
    config.skip_files.extend(args.skip.iter().cloned());
    if !args.ext.is_empty() {
        config.extensions = args
            .ext
            .iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .collect();
    }
    config.validate()?;
    Ok(config)
}

fn run_convert(args: ConvertArgs) -> Result<i32> {
    let common = &args.common;
    init_tracing(common.verbose);
    let config = load_config(common)?;
    let root = canonical_root(&common.path)?;

    let files = Discovery::new(&config).candidates(&root)?;
    let engine = Engine::new(config.clone())?;
    let repairer = Repairer::new(&config)?;
    let options = RunOptions {
        dry_run: common.dry_run,
    };

    if !common.json {
        println!("Found {} files to process\n", files.len());
    }

    let repairer = (!args.no_repair).then_some(&repairer);
    let report = Runner::new(&root, options).convert(&engine, repairer, &files, |entry| {
        if !common.json {
            if let Some(line) = entry.status_line() {
                println!("{}", line);
            }
        }
    });

    finish(&report, common.json, false)
}

fn run_repair(args: CommonArgs) -> Result<i32> {
    init_tracing(args.verbose);
    let config = load_config(&args)?;
    let root = canonical_root(&args.path)?;

    let files = Discovery::new(&config).source_files(&root)?;
    let repairer = Repairer::new(&config)?;

    if !args.json {
        println!("Checking {} files\n", files.len());
    }

    let report = Runner::new(&root, RunOptions { dry_run: args.dry_run })
        .repair(&repairer, &files, |entry| {
            if !args.json {
                if let Some(line) = entry.status_line() {
                    println!("{}", line);
                }
            }
        });

    finish(&report, args.json, true)
}

fn canonical_root(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("Source root {} does not exist", path.display()))
}

fn finish(report: &RunReport, json: bool, repair_only: bool) -> Result<i32> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(report.exit_code());
    }

    println!("\nResults:");
    if repair_only {
        println!("  Repaired: {}", report.repaired());
    } else {
        println!("  Converted: {}", report.converted());
        println!("  Skipped: {}", report.skipped());
    }
    println!("  Errors: {}", report.errored());
    if report.dry_run {
        println!("  (dry run, no files written)");
    }

    if report.errored() > 0 {
        println!("\nError details:");
        for (path, message) in report.errors() {
            println!("  {}: {}", path, truncate(message, MAX_ERROR_LEN));
        }
    }

    Ok(report.exit_code())
}
