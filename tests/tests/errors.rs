//! Diagnostics de compilation et erreurs d'exécution, tels qu'affichés.

use allo_tests::run;
use allo_vm::InterpretResult;
use pretty_assertions::assert_eq;

#[test]
fn syntax_error_runs_nothing() {
    let src = "print \"before\";\nprint (1 + 2;";
    let first = run(src);
    assert_eq!(first.result, InterpretResult::CompileError);
    assert_eq!(first.stdout, "");
    assert_eq!(first.stderr, "[line 2] Error at ';': Expect ')' after expression.\n");

    // same source, same failure
    assert_eq!(run(src), first);
}

#[test]
fn error_locations() {
    assert_eq!(run("print 1").stderr, "[line 1] Error at end: Expect ';' after value.\n");
    assert_eq!(run("print \"open").stderr, "[line 1] Error: Unterminated string.\n");
    assert_eq!(run("print @;").stderr, "[line 1] Error: Unexpected character.\n");
    assert_eq!(run("var a = 1; var b = 2;\na + b = 3;").stderr, "[line 2] Error at '=': Invalid assignment target.\n");
}

#[test]
fn panic_mode_reports_once_per_statement() {
    let outcome = run("print ;\nvar 1;\nprint 2;\n{ var x = 1; var x = 2; }");
    assert_eq!(outcome.result, InterpretResult::CompileError);
    assert_eq!(
        outcome.stderr,
        "[line 1] Error at ';': Expect expression.\n\
         [line 2] Error at '1': Expect variable name.\n\
         [line 4] Error at 'x': Already a variable with this name in this scope.\n"
    );
}

#[test]
fn runtime_error_keeps_earlier_output() {
    let outcome = run("print 1;\nprint 2;\nprint undefined;\nprint 4;");
    assert_eq!(outcome.result, InterpretResult::RuntimeError);
    assert_eq!(outcome.stdout, "1\n2\n");
    assert_eq!(outcome.stderr, "Undefined variable 'undefined'.\n[line 3] in script\n");
}

#[test]
fn assignment_never_declares() {
    let outcome = run("fresh = 1;");
    assert_eq!(outcome.result, InterpretResult::RuntimeError);
    assert_eq!(outcome.stderr, "Undefined variable 'fresh'.\n[line 1] in script\n");
}

#[test]
fn negating_a_string() {
    let outcome = run("var s = \"x\";\n\nprint -s;");
    assert_eq!(outcome.result, InterpretResult::RuntimeError);
    assert_eq!(outcome.stderr, "Operand must be a number.\n[line 3] in script\n");
}

#[test]
fn too_many_constants() {
    let mut src = String::new();
    for i in 0..256 {
        src.push_str(&format!("{i};\n"));
    }
    assert_eq!(run(&src).result, InterpretResult::Ok);
    src.push_str("256;\n");
    let outcome = run(&src);
    assert_eq!(outcome.result, InterpretResult::CompileError);
    assert_eq!(outcome.stderr, "[line 257] Error at '256': Too many constants in one chunk.\n");
}

#[test]
fn runaway_nesting_is_reported_not_a_crash() {
    let src = format!("print 1;\nprint {}1{};\nprint 2;", "(".repeat(50_000), ")".repeat(50_000));
    let outcome = run(&src);
    assert_eq!(outcome.result, InterpretResult::CompileError);
    assert_eq!(outcome.stdout, "");
    assert_eq!(outcome.stderr, "[line 2] Error at '(': Expression nested too deeply.\n");
}
