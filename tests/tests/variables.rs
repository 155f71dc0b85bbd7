//! Variables : globales par nom, locales par slot, portées imbriquées.

use allo_tests::{run, run_with, stdout_of};
use allo_vm::{InterpretResult, Vm, VmOptions};
use pretty_assertions::assert_eq;

#[test]
fn nested_block_sees_assignment() {
    assert_eq!(stdout_of("{ var a = 1; { a = 2; print a; } }"), "2\n");
    assert_eq!(stdout_of("{ var a = 1; { a = 2; } print a; }"), "2\n");
}

#[test]
fn shadowing_in_nested_block_is_legal() {
    let src = "{\n  var a = 1;\n  {\n    var a = a + 10;\n    print a;\n  }\n  print a;\n}";
    // an initializer cannot read the local it is declaring, even when an outer one exists
    let outcome = run(src);
    assert_eq!(outcome.result, InterpretResult::CompileError);
    assert_eq!(outcome.stderr, "[line 4] Error at 'a': Can't read local variable in its own initializer.\n");

    let src = "{ var a = 1; { var b = a + 10; var a = b; print a; } print a; }";
    assert_eq!(stdout_of(src), "11\n1\n");
}

#[test]
fn redeclaring_in_same_block_is_rejected() {
    let outcome = run("{ var a = 1; var a = 2; }");
    assert_eq!(outcome.result, InterpretResult::CompileError);
    assert_eq!(outcome.stderr, "[line 1] Error at 'a': Already a variable with this name in this scope.\n");
}

#[test]
fn globals_define_get_set() {
    assert_eq!(stdout_of("var a; print a; a = 3; print a; var a = \"again\"; print a;"), "nil\n3\nagain\n");
    assert_eq!(stdout_of("var a = 1; var b = a = 5; print b;"), "5\n");
}

#[test]
fn assignment_is_right_associative_and_yields_value() {
    assert_eq!(stdout_of("var a; var b; a = b = 7; print a; print b;"), "7\n7\n");
    assert_eq!(stdout_of("{ var x = 0; print x = 4; }"), "4\n");
}

#[test]
fn locals_do_not_leak_into_globals() {
    let outcome = run("{ var hidden = 1; }\nprint hidden;");
    assert_eq!(outcome.result, InterpretResult::RuntimeError);
    assert_eq!(outcome.stderr, "Undefined variable 'hidden'.\n[line 2] in script\n");
}

#[test]
fn many_locals_and_the_slot_limit() {
    let mut src = String::from("{\n");
    for i in 0..256 {
        src.push_str(&format!("var l{i};\n"));
    }
    // every slot is live, expressions still need room above them
    src.push_str("print l0;\nprint l255 == l0 and -1 < (2 + 3) * 4;\n}\n");
    let outcome = run(&src);
    assert_eq!(outcome.result, InterpretResult::Ok);
    assert_eq!(outcome.stdout, "nil\ntrue\n");

    let mut src = String::from("{\n");
    for i in 0..257 {
        src.push_str(&format!("var l{i};\n"));
    }
    src.push_str("}\n");
    let outcome = run(&src);
    assert_eq!(outcome.result, InterpretResult::CompileError);
    assert_eq!(outcome.stderr, "[line 258] Error at 'l256': Too many local variables in function.\n");
}

#[test]
fn heap_is_released_between_runs() {
    let (mut vm, out, _) = Vm::with_captured_output(VmOptions::default());
    assert_eq!(vm.interpret("var s = \"one\"; print s;"), InterpretResult::Ok);
    assert!(vm.heap().is_empty());
    assert_eq!(vm.interpret("print s;"), InterpretResult::RuntimeError);
    assert_eq!(out.take(), "one\n");
}

#[test]
fn repl_sessions_keep_globals() {
    let outcome = run_with("var a = 1;", VmOptions::repl());
    assert_eq!(outcome.result, InterpretResult::Ok);

    let (mut vm, out, _) = Vm::with_captured_output(VmOptions::repl());
    for line in ["var count = 0;", "count = count + 1;", "count = count + 1;", "print count;"] {
        assert_eq!(vm.interpret(line), InterpretResult::Ok);
    }
    assert_eq!(out.take(), "2\n");
}
