//! Classbuilder CLI
//!
//! Usage:
//!   classbuilder [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>  Builder configuration (TOML format)
//!   -t, --types <FILE>   Type declarations for the dry-run object system (TOML format)
//!   --check              Only validate and compile; list template ids
//!   -i, --id <ID>        Template to instantiate (repeatable)
//!   -v, --verbose        Debug logging
//!   -h, --help           Print help

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classbuilder::{Builder, BuilderConfig, MemoryObjects};

#[derive(Parser)]
#[command(name = "classbuilder")]
#[command(about = "Validate, compile and dry-run interface markup documents")]
struct Cli {
    /// Input file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Builder configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Type declarations for the in-memory object system (TOML format).
    /// Without it every class is accepted.
    #[arg(short, long)]
    types: Option<PathBuf>,

    /// Stop after compilation and print the template ids
    #[arg(long)]
    check: bool,

    /// Template id to instantiate; defaults to every top-level object
    #[arg(short = 'i', long = "id")]
    ids: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    // Validation warnings are printed below with source context
    let filter = if cli.verbose {
        "debug"
    } else {
        "warn,classbuilder::validate=error"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(io::stderr),
        )
        .init();

    let config = match &cli.config {
        Some(path) => BuilderConfig::from_file(path).unwrap_or_else(|e| {
            fail(format!("Error loading configuration '{}': {}", path.display(), e))
        }),
        None => BuilderConfig::default(),
    };

    let objects = match &cli.types {
        Some(path) => MemoryObjects::from_file(path).unwrap_or_else(|e| {
            fail(format!("Error loading type declarations '{}': {}", path.display(), e))
        }),
        None => MemoryObjects::permissive(),
    };

    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => fail(format!("Error reading file '{}': {}", path.display(), e)),
        },
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                fail(format!("Error reading from stdin: {}", e));
            }
            (buffer, "<stdin>".to_string())
        }
    };

    let builder = match Builder::from_str(&source, objects, config) {
        Ok(builder) => builder,
        Err(e) => fail(e.format(&source, &filename)),
    };
    for warning in builder.warnings() {
        eprintln!("{}", warning.format(&source, &filename));
    }

    if cli.check {
        for id in builder.templates().ids() {
            println!("{}", id);
        }
        return;
    }

    let ids: Vec<String> = if cli.ids.is_empty() {
        builder.templates().roots().map(|t| t.id.clone()).collect()
    } else {
        cli.ids.clone()
    };
    for id in &ids {
        match builder.instantiate(id) {
            Ok(instance) => print!("{}", instance.object().dump()),
            Err(e) => fail(format!("Error instantiating '{}': {}", id, e)),
        }
    }
}
