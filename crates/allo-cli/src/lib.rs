//! allo-cli: bibliothèque interne du binaire `allo`
//!
//! But : garder `main.rs` limité au parsing d'arguments, et exposer ici une
//! API testable :
//! - initialisation des traces (`tracing-subscriber`, filtre `ALLO_LOG`)
//! - exécution d'un script (lecture fichier → VM → code de sortie)
//! - REPL (feature `repl`, via `rustyline`), globales conservées entre les lignes

#![forbid(unsafe_code)]

use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use allo_vm::{InterpretResult, Vm, VmOptions};

/// Ligne de commande invalide (sysexits `EX_USAGE`).
pub const EX_USAGE: u8 = 64;
/// Fichier illisible (sysexits `EX_IOERR`).
pub const EX_IOERR: u8 = 74;

// ───────────────────────────── Initialisation ─────────────────────────────

/// Réglages des traces, remplis depuis les drapeaux du CLI.
#[derive(Clone, Debug, Default)]
pub struct TraceSettings {
    /// `-v` répétés : warn → info → debug → trace.
    pub verbose: u8,
    /// `-q` : seulement les erreurs.
    pub quiet: bool,
    /// Laisser passer le désassemblage (`allo::code`).
    pub print_code: bool,
    /// Laisser passer la trace d'exécution (`allo::exec`).
    pub trace_execution: bool,
}

impl TraceSettings {
    /// Niveau par défaut quand `ALLO_LOG` n'est pas défini.
    pub const fn default_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Construit le filtre : `ALLO_LOG` sinon la verbosité, plus les cibles
    /// de diagnostic demandées.
    pub fn filter(&self) -> EnvFilter {
        let mut filter =
            EnvFilter::try_from_env("ALLO_LOG").unwrap_or_else(|_| EnvFilter::new(self.default_level()));
        if self.print_code {
            if let Ok(directive) = "allo::code=debug".parse() {
                filter = filter.add_directive(directive);
            }
        }
        if self.trace_execution {
            if let Ok(directive) = "allo::exec=trace".parse() {
                filter = filter.add_directive(directive);
            }
        }
        filter
    }
}

/// Installe le subscriber global (sur stderr). Sans effet s'il y en a déjà un.
pub fn init_tracing(settings: &TraceSettings) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(settings.filter())
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

// ───────────────────────────── Exécution ─────────────────────────────

/// Lit un script.
///
/// # Errors
/// Fichier absent, illisible, ou pas en UTF-8.
pub fn read_script(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("lecture de {}", path.display()))
}

/// Exécute un script dans une VM neuve.
///
/// # Errors
/// Uniquement si le fichier ne peut pas être lu ; les erreurs de compilation
/// et d'exécution sont déjà affichées sur stderr et portées par le résultat.
pub fn run_file(path: &Path, options: VmOptions) -> Result<InterpretResult> {
    let source = read_script(path)?;
    info!(path = %path.display(), bytes = source.len(), "running script");
    Ok(Vm::with_options(options).interpret(&source))
}

/// Code de sortie du processus pour un résultat d'exécution.
pub fn exit_code(result: InterpretResult) -> u8 { u8::try_from(result.exit_code()).unwrap_or(1) }

// ───────────────────────────── REPL ─────────────────────────────

/// Résultat d'une commande méta du REPL.
#[derive(Debug, PartialEq, Eq)]
pub enum Meta {
    /// Quitter la session.
    Quit,
    /// Oublier les globales et libérer le tas.
    Reset,
    /// Afficher l'aide.
    Help,
    /// Commande inconnue.
    Unknown(String),
}

/// Interprète une ligne commençant par `:`.
pub fn parse_meta(line: &str) -> Option<Meta> {
    let cmd = line.trim().strip_prefix(':')?;
    Some(match cmd.trim() {
        "q" | "quit" => Meta::Quit,
        "reset" => Meta::Reset,
        "help" | "h" => Meta::Help,
        other => Meta::Unknown(other.to_owned()),
    })
}

const REPL_HELP: &str = ":help  aide\n:reset oublie les globales\n:quit  quitte";

/// Traite une ligne du REPL sur une VM persistante. Retourne `false` pour quitter.
pub fn repl_line(vm: &mut Vm, line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }
    match parse_meta(trimmed) {
        Some(Meta::Quit) => return false,
        Some(Meta::Reset) => vm.free_objects(),
        Some(Meta::Help) => eprintln!("{REPL_HELP}"),
        Some(Meta::Unknown(cmd)) => eprintln!("commande inconnue : :{cmd} (voir :help)"),
        None => {
            let result = vm.interpret(line);
            debug!(?result, "repl line");
        }
    }
    true
}

/// Boucle interactive. Les globales survivent d'une ligne à l'autre.
///
/// # Errors
/// Échec du terminal (hors Ctrl-C / Ctrl-D).
#[cfg(feature = "repl")]
pub fn repl(options: VmOptions, prompt: &str) -> Result<()> {
    use anyhow::anyhow;
    use rustyline::{error::ReadlineError, history::DefaultHistory, Config as RLConfig, Editor};

    let rl_cfg = RLConfig::builder().history_ignore_dups(true).map_err(|e| anyhow!("configuration REPL: {e}"))?.build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(rl_cfg)?;
    let mut vm = Vm::with_options(VmOptions { persistent_globals: true, ..options });

    loop {
        let line = match rl.readline(prompt) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(anyhow!("readline: {e}")),
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }
        if !repl_line(&mut vm, &line) {
            break;
        }
    }
    vm.free_objects();
    Ok(())
}

/// REPL indisponible sans la feature `repl`.
///
/// # Errors
/// Toujours.
#[cfg(not(feature = "repl"))]
pub fn repl(_options: VmOptions, _prompt: &str) -> Result<()> {
    anyhow::bail!("REPL indisponible : recompile `allo-cli` avec la feature `repl`")
}

// ───────────────────────────── Tests ─────────────────────────────
