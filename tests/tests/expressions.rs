//! Expressions : arithmétique, comparaisons, égalité, vérité.

use allo_tests::{run, stdout_of};
use allo_vm::InterpretResult;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn precedence_and_associativity() {
    assert_eq!(stdout_of("print 1 + 2 * 3;"), "7\n");
    assert_eq!(stdout_of("print (1 + 2) * 3;"), "9\n");
    assert_eq!(stdout_of("print 10 - 4 - 3;"), "3\n");
    assert_eq!(stdout_of("print 2 * 3 / 4;"), "1.5\n");
    assert_eq!(stdout_of("print - - 4;"), "4\n");
    assert_eq!(stdout_of("print -((1.2 + 3.4) / 5.6);"), format!("{}\n", -((1.2_f64 + 3.4) / 5.6)));
}

#[test]
fn equality_has_no_coercion() {
    assert_eq!(stdout_of("print 1 == 1;"), "true\n");
    assert_eq!(stdout_of("print 1 == \"1\";"), "false\n");
    assert_eq!(stdout_of("print nil == nil;"), "true\n");
    assert_eq!(stdout_of("print true != false;"), "true\n");
    assert_eq!(stdout_of("print \"a\" == \"a\";"), "true\n");
}

#[test]
fn truthiness() {
    assert_eq!(stdout_of("print !nil;"), "true\n");
    assert_eq!(stdout_of("print !0;"), "false\n");
    assert_eq!(stdout_of("print !\"\";"), "false\n");
    assert_eq!(stdout_of("print !!false;"), "false\n");
}

#[test]
fn comparisons() {
    assert_eq!(stdout_of("print 1 < 2; print 2 <= 2; print 3 > 4; print 4 >= 5;"), "true\ntrue\nfalse\nfalse\n");
}

#[test]
fn value_rendering() {
    assert_eq!(stdout_of("print nil; print true; print 2.50; print \"raw text\";"), "nil\ntrue\n2.5\nraw text\n");
}

#[test]
fn comparing_mixed_types_is_a_runtime_error() {
    let outcome = run("print \"a\" < 1;");
    assert_eq!(outcome.result, InterpretResult::RuntimeError);
    assert_eq!(outcome.stderr, "Operands must be numbers.\n[line 1] in script\n");
}

/* ────────── Propriétés ────────── */

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }

    const fn is_factor(self) -> bool { matches!(self, Self::Mul | Self::Div) }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
        }
    }
}

fn op() -> impl Strategy<Value = Op> { prop_oneof![Just(Op::Add), Just(Op::Sub), Just(Op::Mul), Just(Op::Div)] }

/// Évaluation de référence d'une chaîne plate : facteurs d'abord, puis termes,
/// chacun de gauche à droite.
fn eval_flat(first: f64, rest: &[(Op, f64)]) -> f64 {
    let mut terms: Vec<(Op, f64)> = Vec::new();
    let mut acc = first;
    let mut pending = Op::Add;
    for &(op, n) in rest {
        if op.is_factor() {
            acc = op.apply(acc, n);
        } else {
            terms.push((pending, acc));
            pending = op;
            acc = n;
        }
    }
    terms.push((pending, acc));

    let mut iter = terms.into_iter();
    let (_, mut total) = iter.next().unwrap_or((Op::Add, 0.0));
    for (op, term) in iter {
        total = op.apply(total, term);
    }
    total
}

/// Arbre entièrement parenthésé : (source, valeur).
fn tree() -> impl Strategy<Value = (String, f64)> {
    let leaf = (0u16..1000).prop_map(|n| (n.to_string(), f64::from(n)));
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), op(), inner.clone())
                .prop_map(|((ls, lv), op, (rs, rv))| (format!("({ls} {} {rs})", op.symbol()), op.apply(lv, rv))),
            inner.prop_map(|(s, v)| (format!("-{s}"), -v)),
        ]
    })
}

proptest! {
    #[test]
    fn flat_chains_follow_precedence(first in 0u16..1000, rest in prop::collection::vec((op(), 1u16..1000), 0..8)) {
        let mut src = format!("print {first}");
        for (op, n) in &rest {
            src.push_str(&format!(" {} {n}", op.symbol()));
        }
        src.push(';');
        let rest: Vec<(Op, f64)> = rest.into_iter().map(|(op, n)| (op, f64::from(n))).collect();
        let expected = eval_flat(f64::from(first), &rest);
        prop_assert_eq!(stdout_of(&src), format!("{expected}\n"));
    }

    #[test]
    fn nested_trees_match_direct_evaluation((expr, value) in tree()) {
        prop_assert_eq!(stdout_of(&format!("print {expr};")), format!("{value}\n"));
    }
}
