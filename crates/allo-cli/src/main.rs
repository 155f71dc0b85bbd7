//! `allo`: CLI du langage Allo
//!
//! Ici on fait uniquement : parsing d'arguments, initialisation des traces,
//! et délégation à `allo_cli` (lib).
//!
//! Codes de sortie : 0 ok, 64 usage, 65 erreur runtime, 70 erreur de
//! compilation, 74 fichier illisible.

#![forbid(unsafe_code)]

use std::{path::PathBuf, process::ExitCode};

use clap::{error::ErrorKind, ArgAction, Parser};

use allo_cli as cli;
use allo_compiler::CompilerOptions;
use allo_vm::{VmOptions, STACK_MAX};

// ──────────────────────────── CLI (clap) ────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "allo", version, about = "Allo : exécuter un script, ou lancer un REPL sans argument", long_about = None)]
struct Opt {
    /// Script à exécuter (REPL si omis)
    script: Option<PathBuf>,

    /// Désassembler chaque chunk compilé
    #[arg(long = "print-code")]
    print_code: bool,

    /// Tracer chaque instruction avec l'état de la pile
    #[arg(long = "trace-execution")]
    trace_execution: bool,

    /// Profondeur maximale de la pile de valeurs
    #[arg(long = "stack-max", default_value_t = STACK_MAX, value_parser = clap::value_parser!(usize))]
    stack_max: usize,

    /// Invite du REPL
    #[arg(long, default_value = "> ")]
    prompt: String,

    /// Augmente la verbosité (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Mode silencieux (casse la verbosité)
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    let opt = match Opt::try_parse() {
        Ok(opt) => opt,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        },
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(cli::EX_USAGE);
        },
    };

    cli::init_tracing(&cli::TraceSettings {
        verbose: opt.verbose,
        quiet: opt.quiet,
        print_code: opt.print_code,
        trace_execution: opt.trace_execution,
    });

    let options = VmOptions {
        trace_execution: opt.trace_execution,
        stack_max: opt.stack_max,
        compiler: CompilerOptions { print_code: opt.print_code },
        ..VmOptions::default()
    };

    match opt.script {
        Some(path) => match cli::run_file(&path, options) {
            Ok(result) => ExitCode::from(cli::exit_code(result)),
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::from(cli::EX_IOERR)
            },
        },
        None => match cli::repl(options, &opt.prompt) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::from(cli::EX_IOERR)
            },
        },
    }
}
