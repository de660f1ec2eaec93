use brook_interpreter::{Interpreter, InterpreterConfig, Io};
use brook_parser::{ParseError, Script};
use clap::{Parser, Subcommand};
use miette::{Diagnostic, MietteHandlerOpts};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;

mod sexpr;

#[derive(Parser)]
#[command(
    name = "brook",
    version,
    about = "The Brook scripting language",
    long_about = "Brook is a small line-oriented scripting language with classes, exceptions and implicit conversions."
)]
struct Cli {
    /// Log interpreter activity to stderr (also enabled by BROOK_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and run a Brook script
    Run {
        /// Brook source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Also write the parsed script as JSON to this path
        #[arg(long, value_name = "PATH")]
        emit: Option<PathBuf>,

        /// Maximum nesting of script function calls
        #[arg(long, value_name = "N")]
        max_depth: Option<usize>,
    },

    /// Parse a Brook script and save it as JSON
    Compile {
        /// Brook source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output path (defaults to the source path with a .brookc extension)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Run a script saved by `compile`
    Exec {
        /// Compiled .brookc file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Maximum nesting of script function calls
        #[arg(long, value_name = "N")]
        max_depth: Option<usize>,
    },

    /// Parse Brook source files and display their AST as s-expressions
    Parse {
        /// Brook source files to parse (use '-' to read from stdin)
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, Error, Diagnostic)]
enum CliError {
    #[error("Cannot read {path}")]
    #[diagnostic(code(brook::cli::read))]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write {path}")]
    #[diagnostic(code(brook::cli::write))]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a compiled Brook script")]
    #[diagnostic(
        code(brook::cli::decode),
        help("Compiled scripts are produced by `brook compile`")
    )]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot serialize the parsed script")]
    #[diagnostic(code(brook::cli::encode))]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}: {error}")]
    #[diagnostic(forward(error))]
    Parse { path: String, error: ParseError },
}

type Result<T> = std::result::Result<T, CliError>;

fn main() {
    setup_miette_handler();

    let cli = Cli::parse();
    if cli.verbose || std::env::var_os("BROOK_LOG").is_some() {
        setup_tracing(cli.verbose);
    }

    let code = match cli.command {
        Some(Commands::Run {
            file,
            emit,
            max_depth,
        }) => handle_run_command(&file, emit.as_deref(), max_depth),
        Some(Commands::Compile { file, output }) => handle_compile_command(&file, output),
        Some(Commands::Exec { file, max_depth }) => handle_exec_command(&file, max_depth),
        Some(Commands::Parse { files }) => handle_parse_command(files),
        None => {
            // No subcommand provided, show help
            Cli::parse_from(["brook", "--help"]);
            0
        }
    };

    process::exit(code);
}

/// Configure miette for error reporting
fn setup_miette_handler() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .color(true)
                .tab_width(4)
                .with_cause_chain()
                .build(),
        )
    }))
    .ok();
}

/// Log to stderr. `BROOK_LOG` holds an env-filter directive; `-v` without it
/// means debug for the Brook crates.
fn setup_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match std::env::var("BROOK_LOG") {
        Ok(directive) => EnvFilter::new(directive),
        Err(_) if verbose => EnvFilter::new("brook=debug,brook_parser=debug,brook_interpreter=debug"),
        Err(_) => EnvFilter::new("warn"),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}

fn report(error: CliError) -> i32 {
    eprintln!("{:?}", miette::Report::new(error));
    1
}

fn read_source(path: &Path) -> Result<String> {
    if path.to_str() == Some("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| CliError::Read {
                path: "<stdin>".to_string(),
                source,
            })?;
        return Ok(buffer);
    }
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Script libraries are looked up next to the script itself.
fn config_for(path: &Path, max_depth: Option<usize>) -> InterpreterConfig {
    let base_dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    InterpreterConfig::default()
        .with_base_dir(base_dir)
        .with_max_call_depth(max_depth)
}

fn parse_file(interpreter: &Interpreter, path: &Path) -> Result<Script> {
    let source = read_source(path)?;
    tracing::debug!(file = %path.display(), "parsing");
    interpreter.parse(&source).map_err(|error| CliError::Parse {
        path: path.display().to_string(),
        error,
    })
}

fn write_compiled(script: &Script, path: &Path) -> Result<()> {
    let json = script
        .to_json()
        .map_err(|source| CliError::Encode { source })?;
    fs::write(path, json).map_err(|source| CliError::Write {
        path: path.display().to_string(),
        source,
    })
}

fn execute(interpreter: &Interpreter, script: &Script) -> i32 {
    interpreter.execute(script, Io::standard()).exit_code()
}

fn handle_run_command(file: &Path, emit: Option<&Path>, max_depth: Option<usize>) -> i32 {
    let interpreter = Interpreter::new(config_for(file, max_depth));
    let script = match parse_file(&interpreter, file) {
        Ok(script) => script,
        Err(error) => return report(error),
    };
    if let Some(emit) = emit {
        if let Err(error) = write_compiled(&script, emit) {
            return report(error);
        }
    }
    execute(&interpreter, &script)
}

fn handle_compile_command(file: &Path, output: Option<PathBuf>) -> i32 {
    let interpreter = Interpreter::new(config_for(file, None));
    let output = output.unwrap_or_else(|| file.with_extension("brookc"));
    let result = parse_file(&interpreter, file).and_then(|script| write_compiled(&script, &output));
    match result {
        Ok(()) => 0,
        Err(error) => report(error),
    }
}

fn handle_exec_command(file: &Path, max_depth: Option<usize>) -> i32 {
    let loaded = read_source(file).and_then(|json| {
        Script::from_json(&json).map_err(|source| CliError::Decode {
            path: file.display().to_string(),
            source,
        })
    });
    match loaded {
        Ok(script) => execute(&Interpreter::new(config_for(file, max_depth)), &script),
        Err(error) => report(error),
    }
}

fn handle_parse_command(files: Vec<PathBuf>) -> i32 {
    let mut success = true;
    let multiple_files = files.len() > 1;

    for file in files {
        let interpreter = Interpreter::new(config_for(&file, None));
        match parse_file(&interpreter, &file) {
            Ok(script) => {
                if multiple_files {
                    println!(";; {}", file.display());
                }
                println!("{}", sexpr::format_script_as_sexpr(&script));
            }
            Err(error) => {
                report(error);
                success = false;
            }
        }
    }

    if success { 0 } else { 1 }
}
