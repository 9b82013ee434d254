use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::Reporter;
use rox::scanner::Scanner;
use rox::session::{Outcome, Session};
use rox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Where `--log` writes
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a program and prints its syntax tree
    Parse { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive prompt
    Repl,
}

/// Reads the contents of a file as UTF‑8 text
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger(path: &PathBuf) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    // Compact "[module:line] - message" lines
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env() // RUST_LOG still wins
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

/// Print and clear everything the reporter collected.
fn flush_diagnostics(reporter: &mut Reporter) {
    for diagnostic in reporter.take_diagnostics() {
        eprintln!("{}", diagnostic);
    }
}

fn tokenize(filename: &PathBuf, json: bool) -> Result<i32> {
    let source = read_file(filename)?;
    let mut tokens: Vec<Token> = Vec::new();
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?
        );
    }

    Ok(if tokenized { 0 } else { 65 })
}

fn parse(filename: &PathBuf) -> Result<i32> {
    let source = read_file(filename)?;
    let mut session = Session::new();
    let statements = session.parse(&source);

    if session.reporter().had_error() {
        flush_diagnostics(session.reporter_mut());
        return Ok(Outcome::StaticError.exit_code());
    }

    println!("{}", AstPrinter.print_program(&statements));

    Ok(0)
}

fn run(filename: &PathBuf) -> Result<i32> {
    let source = read_file(filename)?;
    let mut session = Session::new();

    let outcome = session.run(&source);
    flush_diagnostics(session.reporter_mut());

    info!("Program finished: {:?}", outcome);

    Ok(outcome.exit_code())
}

fn repl() -> Result<i32> {
    let mut session = Session::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            println!();
            return Ok(0);
        }

        session.run(&line);
        flush_diagnostics(session.reporter_mut());

        // A bad line must not poison the next one.
        session.reporter_mut().reset();
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    }

    info!("CLI arguments: {:?}", args);

    let code = match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json)?,
        Commands::Parse { filename } => parse(filename)?,
        Commands::Run { filename } => run(filename)?,
        Commands::Repl => repl()?,
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
