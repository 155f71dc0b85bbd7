//! `if`, `while`, `for`, `and`, `or`.

use allo_tests::{run, stdout_of};
use allo_vm::InterpretResult;
use pretty_assertions::assert_eq;

#[test]
fn if_else_follows_truthiness() {
    assert_eq!(stdout_of("if (0) print \"zero is truthy\";"), "zero is truthy\n");
    assert_eq!(stdout_of("if (nil) print 1; else print 2;"), "2\n");
    assert_eq!(stdout_of("if (false) print 1; else if (true) print 2; else print 3;"), "2\n");
    assert_eq!(stdout_of("if (true) { var a = 1; print a; }"), "1\n");
}

#[test]
fn logical_operators_short_circuit() {
    // the right-hand side would fail at runtime if it were evaluated
    assert_eq!(stdout_of("print false and missing;"), "false\n");
    assert_eq!(stdout_of("print 1 or missing;"), "1\n");
    assert_eq!(stdout_of("print nil or \"fallback\";"), "fallback\n");
    assert_eq!(stdout_of("print true and 3;"), "3\n");

    let outcome = run("print true and missing;");
    assert_eq!(outcome.result, InterpretResult::RuntimeError);
}

#[test]
fn and_binds_tighter_than_or() {
    assert_eq!(stdout_of("print false and false or true;"), "true\n");
    assert_eq!(stdout_of("print true or false and false;"), "true\n");
}

#[test]
fn while_loops() {
    let src = "var i = 3;\nwhile (i > 0) {\n  print i;\n  i = i - 1;\n}";
    assert_eq!(stdout_of(src), "3\n2\n1\n");
    assert_eq!(stdout_of("while (false) print 1; print \"done\";"), "done\n");
}

#[test]
fn for_loops() {
    assert_eq!(stdout_of("for (var i = 0; i < 3; i = i + 1) print i * i;"), "0\n1\n4\n");
    assert_eq!(stdout_of("var j = 2; for (; j > 0;) { print j; j = j - 1; }"), "2\n1\n");

    let src = "var sum = 0;\nfor (var i = 1; i <= 3; i = i + 1)\n  for (var j = 1; j <= 3; j = j + 1)\n    sum = sum + i * j;\nprint sum;";
    assert_eq!(stdout_of(src), "36\n");
}

#[test]
fn for_initializer_is_scoped_to_the_loop() {
    let outcome = run("for (var i = 0; i < 1; i = i + 1) {}\nprint i;");
    assert_eq!(outcome.result, InterpretResult::RuntimeError);
    assert_eq!(outcome.stderr, "Undefined variable 'i'.\n[line 2] in script\n");
}

#[test]
fn loops_leave_the_stack_balanced() {
    // more iterations than stack slots: any leaked value would overflow
    assert_eq!(stdout_of("var n = 0; while (n < 1500) { var t = n; n = t + 1; } print n;"), "1500\n");
}
