//! Charges de travail partagées par les benches.

#![forbid(unsafe_code)]

use std::fmt::Write as _;

/// Petits programmes représentatifs : (nom, source).
pub const MICRO: &[(&str, &str)] = &[
    ("arith", "print -((1.2 + 3.4) / 5.6) * 7 - 8 / 2;"),
    ("globals", "var a = 1; var b = 2; a = a + b; b = a * b; print a + b;"),
    ("locals", "{ var a = 1; { var b = a + 1; { var c = b * 2; print c; } } }"),
    ("strings", "var s = \"hello\"; print s == \"hello\"; print s != \"world\";"),
    ("loop", "for (var i = 0; i < 1000; i = i + 1) { var x = i * 2; x = x - 1; }"),
];

/// Source synthétique d'environ `kib` KiB pour le scanner. Elle dépasse
/// vite la limite de constantes d'un chunk : ne sert qu'au lexing.
pub fn synthetic_source(kib: usize) -> String {
    let target = kib * 1024;
    let mut src = String::with_capacity(target + 128);
    let mut i = 0usize;
    while src.len() < target {
        let _ = writeln!(src, "var g{i} = {i} * 2.5 + 1; {{ var l = \"s{i}\"; print l != nil; }} // ligne {i}");
        i += 1;
    }
    src
}

/// Boucle de `n` itérations : charge d'exécution dont la taille de chunk est fixe.
pub fn counting_loop(n: usize) -> String {
    format!("var total = 0;\nfor (var i = 0; i < {n}; i = i + 1) {{\n  if (i > 10 and i < 20) total = total + 1; else total = total - i / 2;\n}}\nprint total;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workloads_run_cleanly() {
        for (name, src) in MICRO {
            let (mut vm, _, err) = allo_vm::Vm::with_captured_output(allo_vm::VmOptions::default());
            assert!(vm.interpret(src).is_ok(), "{name}: {}", err.get());
        }
        let big = synthetic_source(4);
        assert!(big.len() >= 4 * 1024);
        let tokens = allo_lexer::Scanner::new(&big).tokenize();
        assert!(tokens.iter().all(|t| t.kind != allo_lexer::TokenKind::Error));

        let mut heap = allo_core::Heap::new();
        assert!(allo_compiler::compile(&counting_loop(100), &mut heap).is_ok());
    }
}
