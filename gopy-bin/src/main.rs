use std::{
    env, fs,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gopy::{
    compiler::{self, CompileError},
    lexer,
    util::fmt::tree,
};

mod log;
mod toolchain;

use log::ErrorLog;
use toolchain::Toolchain;

/// Compiles a gopy program to Go, then builds and runs it with the Go
/// toolchain.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The gopy source file.
    input: PathBuf,

    /// What to produce. Only `build` and `run` need the Go toolchain.
    #[arg(long, value_enum, default_value_t = Emit::Run)]
    emit: Emit,

    /// Path of the executable. Defaults to the input path without its
    /// extension.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// The Go toolchain binary.
    #[arg(long, env = "GOPY_GO", default_value = "go", value_name = "PATH")]
    go: PathBuf,

    /// Seconds each external process may run before it is killed.
    #[arg(long, default_value_t = 120, value_name = "SECS")]
    timeout: u64,

    /// File to which failures are appended.
    #[arg(long, default_value = "gopy_errors.log", value_name = "PATH")]
    log_file: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Print the token stream.
    Tokens,
    /// Print the syntax tree.
    Ast,
    /// Print the generated Go source.
    Go,
    /// Build an executable.
    Build,
    /// Build an executable and run it.
    Run,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log = ErrorLog::new(&cli.log_file);
    match execute(&cli, &log) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            log.record(format_args!("{error:#}"));
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli, log: &ErrorLog) -> Result<ExitCode> {
    let src = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read input file {}", cli.input.display()))?;

    match cli.emit {
        Emit::Tokens => {
            for token in lexer::lex_in_new(&src) {
                println!("{}\t{:?}\t{:?}", token.span(), token.kind, token.literal(&src));
            }
        }
        Emit::Ast => match compiler::parse(&src) {
            Ok(program) => print!("{}", tree::print_program_string(&program)),
            Err(error) => return Ok(report(log, &error)),
        },
        Emit::Go => match compiler::compile(&src) {
            Ok(code) => print!("{code}"),
            Err(error) => return Ok(report(log, &error)),
        },
        Emit::Build | Emit::Run => {
            let code = match compiler::compile(&src) {
                Ok(code) => code,
                Err(error) => return Ok(report(log, &error)),
            };
            let toolchain = Toolchain::new(&cli.go, Duration::from_secs(cli.timeout));
            let output = output_path(cli);
            toolchain.build(&code, &output)?;
            if cli.emit == Emit::Run {
                toolchain.run(&output)?;
            } else {
                eprintln!("built {}", output.display());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Prints compile diagnostics to stderr and appends them to the log.
fn report(log: &ErrorLog, error: &CompileError) -> ExitCode {
    match error {
        CompileError::Parse(errors) => {
            for error in errors {
                eprintln!("parse error: {error}");
                log.record(format_args!("parse error: {error}"));
            }
        }
        CompileError::Generate { .. } => {
            eprintln!("generate error: {error}");
            log.record(format_args!("generate error: {error}"));
        }
    }
    ExitCode::FAILURE
}

fn output_path(cli: &Cli) -> PathBuf {
    let output = cli.output.clone().unwrap_or_else(|| {
        let mut path = cli.input.with_extension("");
        path.as_mut_os_string().push(env::consts::EXE_SUFFIX);
        path
    });
    // A bare file name would be looked up in `PATH` when run.
    if output.components().count() == 1 && output.is_relative() {
        Path::new(".").join(output)
    } else {
        output
    }
}
