use clap::{Parser as ClapParser, Subcommand};
use conditions_lang::cli::{self, CheckOptions, CheckResult, CliError};
use std::error::Error;
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "cond")]
#[command(about = "Parse and evaluate boolean conditions against JSON arguments")]
#[command(version)]
struct Cli {
    /// Log parsing and evaluation details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and evaluate a condition
    Check {
        /// The condition to evaluate
        expression: String,

        /// Arguments as a JSON object (reads from stdin if not provided)
        #[arg(short, long)]
        args: Option<String>,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,

        /// Operator precedence version (0 or 1)
        #[arg(long)]
        precedence: Option<i64>,
    },

    /// Print the tokens of a condition, one per line
    Tokens {
        /// The condition to split
        expression: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let result = match cli.command {
        Commands::Check {
            expression,
            args,
            syntax_only,
            precedence,
        } => run_check(expression, args, syntax_only, precedence),
        Commands::Tokens { expression } => cli::tokenize(&expression).map(|lines| {
            for line in lines {
                println!("{line}");
            }
        }),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}

fn run_check(
    expression: String,
    args: Option<String>,
    syntax_only: bool,
    precedence: Option<i64>,
) -> Result<(), CliError> {
    let args = match args {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CheckOptions {
        expression,
        args,
        syntax_only,
        precedence,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Result(value) => println!("{value}"),
    }
    Ok(())
}

/// Prints the error followed by each of its causes.
fn report(error: &CliError) {
    eprintln!("error: {error}");

    let mut source = error.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}
