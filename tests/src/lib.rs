//! Utilitaires partagés par les tests d'intégration.

#![forbid(unsafe_code)]

use allo_vm::{InterpretResult, Vm, VmOptions};

/// Ce qu'un programme a produit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Résultat de `interpret`.
    pub result: InterpretResult,
    /// Tout ce que `print` a écrit.
    pub stdout: String,
    /// Diagnostics de compilation ou erreur runtime.
    pub stderr: String,
}

/// Exécute `source` dans une VM neuve avec les options données.
pub fn run_with(source: &str, options: VmOptions) -> Outcome {
    let (mut vm, out, err) = Vm::with_captured_output(options);
    let result = vm.interpret(source);
    Outcome { result, stdout: out.take(), stderr: err.take() }
}

/// Exécute `source` avec les options par défaut.
pub fn run(source: &str) -> Outcome { run_with(source, VmOptions::default()) }

/// Exécute `source` et exige un succès ; retourne stdout.
///
/// # Panics
/// Si le programme ne se termine pas avec `InterpretResult::Ok`.
pub fn stdout_of(source: &str) -> String {
    let outcome = run(source);
    assert_eq!(outcome.result, InterpretResult::Ok, "stderr: {}", outcome.stderr);
    outcome.stdout
}
