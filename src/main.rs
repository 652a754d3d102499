use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::parser::Parser;
use rox::pipeline::EXIT_USAGE;
use rox::scanner::{self, Scanner};
use rox::token::Token;
use rox::{Lox, Outcome};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints every statement's syntax tree
    Parse { filename: PathBuf },

    /// Runs a file as a Lox program, or starts a prompt when no file is given
    Run { filename: Option<PathBuf> },
}

/// Maps a source file and checks it is valid UTF‑8.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // Zero-length mappings are rejected by the OS.
    if len == 0 {
        return Ok(String::new());
    }

    let map: Mmap = unsafe { Mmap::map(&file) }
        .context(format!("Failed to map file {:?}", filename))?;

    let source: &str = std::str::from_utf8(&map)
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    info!("Read {} bytes from {:?}", map.len(), filename);

    Ok(source.to_owned())
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

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
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn report_all(errors: &[LoxError]) {
    for e in errors {
        eprintln!("{}", e);
    }
}

fn report_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Ok => {}
        Outcome::StaticError(errors) => report_all(errors),
        Outcome::RuntimeError { message, line } => eprintln!("{}\n[line {}]", message, line),
    }
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    info!("Running Tokenize subcommand");
    let source = read_file(filename)?;

    let mut tokens: Vec<Token> = Vec::new();
    let mut failed = false;

    for item in Scanner::new(&source) {
        match item {
            Ok(token) => {
                debug!("Scanned token: {}", token);
                tokens.push(token);
            }
            Err(e) => {
                failed = true;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if json {
        let rendered = serde_json::to_string_pretty(&tokens).context("Failed to encode tokens")?;
        println!("{}", rendered);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if failed {
        debug!("Tokenization failed, exiting with code 65");
        return Ok(rox::pipeline::EXIT_STATIC_ERROR);
    }

    info!("Tokenization completed successfully");
    Ok(0)
}

fn parse(filename: &Path) -> Result<i32> {
    info!("Running Parse subcommand");
    let source = read_file(filename)?;

    let tokens: Vec<Token> = match scanner::tokenize(&source) {
        Ok(tokens) => tokens,
        Err(errors) => {
            report_all(&errors);
            return Ok(rox::pipeline::EXIT_STATIC_ERROR);
        }
    };

    match Parser::new(&tokens).parse() {
        Ok(statements) => {
            info!("Parsed {} statement(s)", statements.len());
            for stmt in &statements {
                println!("{}", AstPrinter::print_stmt(stmt));
            }
            Ok(0)
        }
        Err(errors) => {
            debug!("Parse failed with {} error(s)", errors.len());
            report_all(&errors);
            Ok(rox::pipeline::EXIT_STATIC_ERROR)
        }
    }
}

fn run_file(filename: &Path) -> Result<i32> {
    info!("Running Run subcommand on {:?}", filename);
    let source = read_file(filename)?;
    debug!("Provided input:\n {}", source);

    let outcome = Lox::new().run(&source);
    report_outcome(&outcome);

    info!("Program finished with exit code {}", outcome.exit_code());
    Ok(outcome.exit_code())
}

/// Interactive prompt.  Each line runs in the same session; errors are
/// reported and the prompt carries on.
fn run_prompt() -> Result<i32> {
    info!("Starting interactive prompt");
    let mut lox = Lox::new();
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

        if read == 0 || line.trim() == "exit" {
            info!("Leaving interactive prompt");
            return Ok(0);
        }

        let outcome = lox.run(&line);
        report_outcome(&outcome);
    }
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code: i32 = match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json)?,
        Commands::Parse { filename } => parse(filename)?,
        Commands::Run { filename: Some(filename) } => run_file(filename)?,
        Commands::Run { filename: None } => run_prompt()?,
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
