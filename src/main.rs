use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser as ClapParser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tiny_tree::config::{check_spacing, Config};
use tiny_tree::{dump_tokens, layout, parse, tokenize};

#[derive(ClapParser)]
#[command(author, version, about = "TINY scanner, parser and syntax tree layout")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize a source file and write the token dump
    Scan {
        /// Source file, or `-` for stdin
        file: PathBuf,
        /// Output path for the dump (defaults to the configured token_output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse a source file and print its syntax tree
    Parse {
        /// Source file, or `-` for stdin
        file: PathBuf,
        /// Print the node arena as JSON instead of an outline
        #[arg(long)]
        json: bool,
    },
    /// Parse a source file and print the layout instructions as JSON
    Layout {
        /// Source file, or `-` for stdin
        file: PathBuf,
        #[arg(long)]
        x_spacing: Option<f64>,
        #[arg(long)]
        y_spacing: Option<f64>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a config file with defaults
    Init,
    /// Print the config file path
    Path,
}

fn initialize_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("cannot read source from stdin")?;
        return Ok(source);
    }

    fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn scan(file: &Path, output: Option<PathBuf>, config: &Config) -> anyhow::Result<()> {
    let source = read_source(file)?;
    let tokens = tokenize(&source)?;
    let output = output.unwrap_or_else(|| config.token_output.clone());

    fs::write(&output, dump_tokens(&tokens))
        .with_context(|| format!("cannot write {}", output.display()))?;
    info!(count = tokens.len(), output = %output.display(), "wrote token dump");
    println!("Tokenization complete. Check '{}' for results.", output.display());
    Ok(())
}

fn parse_file(file: &Path, json: bool) -> anyhow::Result<()> {
    let source = read_source(file)?;
    let tree = parse(&tokenize(&source)?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        print!("{}", tree.outline());
    }
    Ok(())
}

fn layout_file(
    file: &Path,
    x_spacing: Option<f64>,
    y_spacing: Option<f64>,
    config: &Config,
) -> anyhow::Result<()> {
    let mut spacing = config.spacing;
    if let Some(x) = x_spacing {
        check_spacing("x_spacing", x)?;
        spacing.x = x;
    }
    if let Some(y) = y_spacing {
        check_spacing("y_spacing", y)?;
        spacing.y = y;
    }

    let source = read_source(file)?;
    let tree = parse(&tokenize(&source)?)?;
    let placed = layout(&tree, spacing);
    debug!(nodes = tree.len(), instructions = placed.instructions.len(), "layout ready");
    println!("{}", serde_json::to_string_pretty(&placed)?);
    Ok(())
}

fn run_config(command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&Config::load()?)?);
        }
        ConfigCommands::Init => {
            let path = Config::get_config_path();
            if path.exists() {
                println!("Config file already exists at: {}", path.display());
            } else {
                Config::default()
                    .save()
                    .with_context(|| format!("cannot write {}", path.display()))?;
                println!("Initialized new config file at: {}", path.display());
            }
        }
        ConfigCommands::Path => {
            println!("{}", Config::get_config_path().display());
        }
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Scan { file, output } => scan(&file, output, &Config::load()?),
        Commands::Parse { file, json } => parse_file(&file, json),
        Commands::Layout {
            file,
            x_spacing,
            y_spacing,
        } => layout_file(&file, x_spacing, y_spacing, &Config::load()?),
        Commands::Config { command } => run_config(command),
    }
}

fn main() -> ExitCode {
    initialize_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
