//! Strata CLI
//!
//! Entry point for the `strata` command-line tool.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process;

use strata_descriptor::{load_and_merge, MergeReport};

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Layered application-descriptor merge lane", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a base descriptor with one or more extension descriptors
    Merge {
        /// Path to the base descriptor
        #[arg(long)]
        base: PathBuf,

        /// Extension descriptor, repeatable; applied in the given order
        #[arg(long = "ext")]
        extensions: Vec<PathBuf>,

        /// Write the merged descriptor to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print a JSON provenance report to stderr
        #[arg(long)]
        report: bool,
    },

    /// Validate a descriptor and list its issues
    Validate {
        /// Path to the descriptor to validate
        file: PathBuf,

        /// Treat the file as an extension descriptor
        #[arg(long)]
        extension: bool,

        /// Output issues in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Merge {
            base,
            extensions,
            output,
            report,
        } => run_merge(&base, &extensions, output.as_deref(), report),
        Commands::Validate {
            file,
            extension,
            json,
        } => run_validate(&file, extension, json),
    };
    process::exit(code);
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_merge(
    base: &std::path::Path,
    extensions: &[PathBuf],
    output: Option<&std::path::Path>,
    report: bool,
) -> i32 {
    let MergeReport { document, sources } = match load_and_merge(base, extensions) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("error: {}", render_chain(&err));
            return 2;
        }
    };

    let yaml = match serde_yaml::to_string(&document) {
        Ok(yaml) => yaml,
        Err(err) => {
            eprintln!("error: could not serialize the merged descriptor: {err}");
            return 2;
        }
    };

    if report {
        match serde_json::to_string_pretty(&sources) {
            Ok(json) => eprintln!("{json}"),
            Err(err) => {
                eprintln!("error: could not serialize the merge report: {err}");
                return 2;
            }
        }
    }

    match output {
        Some(path) => {
            if let Err(err) = fs::write(path, yaml) {
                eprintln!("error: could not write {}: {err}", path.display());
                return 2;
            }
        }
        None => print!("{yaml}"),
    }
    0
}

fn run_validate(file: &std::path::Path, extension: bool, json: bool) -> i32 {
    let source = match fs::read_to_string(file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: could not read {}: {err}", file.display());
            return 2;
        }
    };

    let issues = if extension {
        strata_validate::validate_extension(&source)
    } else {
        strata_validate::validate_document(&source)
    };

    if json {
        match serde_json::to_string_pretty(&issues) {
            Ok(out) => println!("{out}"),
            Err(err) => {
                eprintln!("error: could not serialize issues: {err}");
                return 2;
            }
        }
    } else if issues.is_empty() {
        println!("{}: no issues found", file.display());
    } else {
        for issue in &issues {
            println!("{}:{}: {}", file.display(), issue.line, issue.message);
        }
    }

    if issues.is_empty() {
        0
    } else {
        1
    }
}

/// Render an error with its full source chain, outermost first.
fn render_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
