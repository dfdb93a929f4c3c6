use clap::{Parser, Subcommand};
use shade_lang::{diagnostics, language, lsp};
use std::path::PathBuf;
use std::process::ExitCode;
use std::fs;

#[derive(Debug, Parser)]
#[command(
    name = "shade-lang",
    version,
    about = "Shading-language server and syntax tools",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the language server over stdio
    Lsp,
    /// Parse shader files and report syntax errors
    Check {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Lsp => match lsp::serve_stdio() {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("server error: {error}");
                ExitCode::FAILURE
            }
        },
        Commands::Check { files } => run_check(&files),
    }
}

fn run_check(files: &[PathBuf]) -> ExitCode {
    let mut failed = false;
    for path in files {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(error) => {
                diagnostics::report_io_error(path, &error);
                failed = true;
                continue;
            }
        };
        let parsed = language::parser::parse(&source);
        if parsed.errors.is_empty() {
            continue;
        }
        failed = true;
        diagnostics::emit_syntax_errors(path, &source, &parsed.errors);
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
