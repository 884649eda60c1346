//! wordvec CLI
//!
//! Loads a text model and answers similarity queries interactively.

use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use wordvec::{DimensionPolicy, EmbeddingStore, LoadConfig};

/// wordvec CLI - Interactive Embedding Queries
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a text model (`word v1 v2 ... vN` per line)
    model: String,

    /// Skip malformed rows instead of aborting the load
    #[arg(long, default_value_t = false)]
    lenient: bool,

    /// Print load progress
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Refuse to start if vector lengths are inconsistent
    #[arg(long, default_value_t = false)]
    validate: bool,

    /// How the model dimension is chosen
    #[arg(long, value_enum, default_value_t = PolicyArg::LastRow)]
    dimension_policy: PolicyArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    LastRow,
    MostCommon,
}

impl From<PolicyArg> for DimensionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::LastRow => DimensionPolicy::LastRow,
            PolicyArg::MostCommon => DimensionPolicy::MostCommon,
        }
    }
}

/// REPL commands
#[derive(Debug, PartialEq)]
enum Command {
    Lookup { word: String, k: usize },
    Compare { a: String, b: String },
    Prune { keep: Vec<String> },
    Save { path: String },
    Validate,
    Info,
}

const DEFAULT_K: usize = 10;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("wordvec=info".parse()?))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = LoadConfig::default()
        .with_verbose(args.verbose)
        .with_strict(!args.lenient)
        .with_dimension_policy(args.dimension_policy.into());

    let (mut store, report) = wordvec::load_with(&args.model, &config)?;
    if report.skipped > 0 {
        warn!("Skipped {} malformed rows in {}", report.skipped, args.model);
    }

    if args.validate && !store.validate_dimensions() {
        anyhow::bail!(
            "model dimensions are inconsistent (declared dimension {})",
            store.dimension()
        );
    }

    info!(
        "Loaded {} words of dimension {} from {}",
        store.len(),
        store.dimension(),
        args.model
    );
    println!("Type 'help' for available commands, 'quit' to exit.\n");

    loop {
        print!("wordvec> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("help") {
            print_help();
            continue;
        }

        match parse_command(input) {
            Ok(cmd) => execute(&mut store, cmd),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}

fn execute(store: &mut EmbeddingStore, cmd: Command) {
    match cmd {
        Command::Lookup { word, k } => match store.lookup(&word, k) {
            Some(results) => {
                for (i, hit) in results.iter().enumerate() {
                    println!("no. {} : {} {:.6}", i, hit.word, hit.score);
                }
            }
            None => println!("(not found) {}", word),
        },
        Command::Compare { a, b } => match store.compare(&a, &b) {
            Some(score) => println!("{:.6}", score),
            None => println!("(not found) {} / {}", a, b),
        },
        Command::Prune { keep } => {
            let before = store.len();
            store.prune(Some(keep.as_slice()));
            println!("(pruned) {} -> {} words", before, store.len());
        }
        Command::Save { path } => match store.save(&path) {
            Ok(()) => println!("OK"),
            Err(e) => eprintln!("Error: {}", e),
        },
        Command::Validate => println!("{}", store.validate_dimensions()),
        Command::Info => println!(
            "words: {}, dimension: {}",
            store.len(),
            store.dimension()
        ),
    }
}

fn parse_command(input: &str) -> anyhow::Result<Command> {
    let parts: Vec<&str> = input.split_whitespace().collect();

    if parts.is_empty() {
        anyhow::bail!("Empty command");
    }

    let cmd = parts[0].to_uppercase();

    match cmd.as_str() {
        "LOOKUP" => {
            if parts.len() < 2 {
                anyhow::bail!("LOOKUP requires a word: LOOKUP <word> [k]");
            }
            let k = if parts.len() > 2 {
                parts[2].parse::<usize>()?
            } else {
                DEFAULT_K
            };
            Ok(Command::Lookup {
                word: parts[1].to_string(),
                k,
            })
        }

        "COMPARE" => {
            if parts.len() < 3 {
                anyhow::bail!("COMPARE requires two words: COMPARE <a> <b>");
            }
            Ok(Command::Compare {
                a: parts[1].to_string(),
                b: parts[2].to_string(),
            })
        }

        "PRUNE" => Ok(Command::Prune {
            keep: parts[1..].iter().map(|w| w.to_string()).collect(),
        }),

        "SAVE" => {
            if parts.len() < 2 {
                anyhow::bail!("SAVE requires a path: SAVE <path>");
            }
            Ok(Command::Save {
                path: parts[1].to_string(),
            })
        }

        "VALIDATE" => Ok(Command::Validate),

        "INFO" => Ok(Command::Info),

        _ => anyhow::bail!("Unknown command: {}. Type 'help' for available commands.", cmd),
    }
}

fn print_help() {
    println!(
        r#"
Available commands:

  LOOKUP <word> [k]   - Show the k most similar words (default 10)
  COMPARE <a> <b>     - Cosine similarity between two words
  PRUNE <word>...     - Keep only the listed words (no words = remove all)
  SAVE <path>         - Write the model as text
  VALIDATE            - Check that all vectors share the model dimension
  INFO                - Show vocabulary size and dimension

  help                - Show this help
  quit / exit         - Exit the CLI

Examples:
  LOOKUP dog 5
  COMPARE dog cat
  PRUNE dog cat puppy
  SAVE pruned.txt
"#
    );
}
