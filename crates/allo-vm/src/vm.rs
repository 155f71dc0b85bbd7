//! The virtual machine: owns the heap, the globals and the value stack, and
//! runs chunks through a fetch/decode/execute loop.

use std::{
    collections::HashMap,
    fmt::Write as _,
    io::{self, Write},
};

use allo_compiler::compile_with;
use allo_core::{
    disasm::disassemble_instruction, helpers::validate_chunk, Chunk, CoreError, Heap, OpCode, Value,
};
use tracing::{debug, trace};

use crate::capture::Captured;
use crate::error::{InterpretResult, RuntimeError, RuntimeErrorKind};
use crate::options::VmOptions;
use crate::stack::ValueStack;

/// Control flow after one instruction.
enum Flow {
    Continue,
    Return,
}

/// Stack-based bytecode interpreter.
pub struct Vm {
    options: VmOptions,
    stack: ValueStack,
    heap: Heap,
    globals: HashMap<String, Value>,
    stdout: Box<dyn Write + Send>,
    stderr: Box<dyn Write + Send>,
}

impl Default for Vm {
    fn default() -> Self { Self::new() }
}

impl Vm {
    /// VM with default options, writing to the process stdout/stderr.
    pub fn new() -> Self { Self::with_options(VmOptions::default()) }

    /// VM with explicit options.
    pub fn with_options(options: VmOptions) -> Self {
        Self {
            stack: ValueStack::new(options.stack_max),
            options,
            heap: Heap::new(),
            globals: HashMap::new(),
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Variante utile pour tests : stdout et stderr capturés.
    pub fn with_captured_output(options: VmOptions) -> (Self, Captured, Captured) {
        let out = Captured::default();
        let err = Captured::default();
        let vm = Self::with_options(options).with_stdout(out.clone()).with_stderr(err.clone());
        (vm, out, err)
    }

    /// Permet d’injecter un writer custom pour `print`.
    #[must_use]
    pub fn with_stdout<W: Write + Send + 'static>(mut self, w: W) -> Self {
        self.stdout = Box::new(w);
        self
    }

    /// Permet d’injecter un writer custom pour les diagnostics.
    #[must_use]
    pub fn with_stderr<W: Write + Send + 'static>(mut self, w: W) -> Self {
        self.stderr = Box::new(w);
        self
    }

    /// Active options.
    pub const fn options(&self) -> &VmOptions { &self.options }

    /// Object heap (read).
    pub const fn heap(&self) -> &Heap { &self.heap }

    /// Object heap (write), for building chunks by hand.
    pub fn heap_mut(&mut self) -> &mut Heap { &mut self.heap }

    /// Current value of a global.
    pub fn global(&self, name: &str) -> Option<Value> { self.globals.get(name).copied() }

    /// Number of defined globals.
    pub fn globals_len(&self) -> usize { self.globals.len() }

    /// Current stack depth (0 after every completed run).
    pub fn stack_len(&self) -> usize { self.stack.len() }

    /// Releases every heap object and forgets the globals.
    pub fn free_objects(&mut self) {
        debug!(objects = self.heap.len(), bytes = self.heap.bytes_allocated(), "freeing objects");
        self.globals.clear();
        self.stack.reset();
        self.heap.free_objects();
    }

    /// Compiles and runs `source`.
    ///
    /// Compile diagnostics and runtime errors go to the stderr writer. The
    /// chunk is dropped whatever the outcome; heap objects and globals are
    /// released too unless `persistent_globals` is set. Strings allocated by
    /// a failed compile are always released.
    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        let mark = self.heap.len();
        let result = match compile_with(source, &mut self.heap, self.options.compiler.clone()) {
            Ok(chunk) => self.interpret_chunk(&chunk),
            Err(err) => {
                self.heap.truncate(mark);
                for diag in &err.diagnostics {
                    let _ = writeln!(self.stderr, "{diag}");
                }
                InterpretResult::CompileError
            }
        };
        let _ = self.stderr.flush();
        let _ = self.stdout.flush();

        if !self.options.persistent_globals {
            self.free_objects();
        }
        debug!(?result, "interpret finished");
        result
    }

    /// Runs a pre-built chunk. Constants that reference objects must live in
    /// this VM's heap (see [`Vm::heap_mut`]).
    pub fn interpret_chunk(&mut self, chunk: &Chunk) -> InterpretResult {
        if let Err(err) = validate_chunk(chunk) {
            self.report(&RuntimeError { kind: err.into(), line: 0 });
            return InterpretResult::RuntimeError;
        }
        match self.run(chunk) {
            Ok(()) => InterpretResult::Ok,
            Err(err) => {
                self.report(&err);
                InterpretResult::RuntimeError
            }
        }
    }

    fn report(&mut self, err: &RuntimeError) {
        debug!(line = err.line, kind = %err.kind, "runtime error");
        let _ = writeln!(self.stderr, "{err}");
        self.stack.reset();
    }

    /* ────────── Boucle d'exécution ────────── */

    fn run(&mut self, chunk: &Chunk) -> Result<(), RuntimeError> {
        let mut ip = 0;
        loop {
            let offset = ip;
            if self.options.trace_execution {
                self.trace_instruction(chunk, offset);
            }
            match self.step(chunk, &mut ip) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Return) => return Ok(()),
                Err(kind) => return Err(RuntimeError { kind, line: chunk.line_at(offset) }),
            }
        }
    }

    fn step(&mut self, chunk: &Chunk, ip: &mut usize) -> Result<Flow, RuntimeErrorKind> {
        let offset = *ip;
        let byte = read_byte(chunk, ip)?;
        let op = OpCode::from_byte(byte).ok_or(CoreError::UnknownOpcode { byte, offset })?;

        match op {
            OpCode::Constant => {
                let value = read_constant(chunk, ip)?;
                self.stack.push(value)?;
            }
            OpCode::Nil => self.stack.push(Value::Nil)?,
            OpCode::True => self.stack.push(Value::Bool(true))?,
            OpCode::False => self.stack.push(Value::Bool(false))?,
            OpCode::Pop => {
                self.stack.pop()?;
            }

            OpCode::GetLocal => {
                let slot = usize::from(read_byte(chunk, ip)?);
                let value = self.stack.get(slot)?;
                self.stack.push(value)?;
            }
            OpCode::SetLocal => {
                let slot = usize::from(read_byte(chunk, ip)?);
                let value = self.stack.peek(0)?;
                self.stack.set(slot, value)?;
            }

            OpCode::GetGlobal => {
                let name = global_name(&self.heap, read_constant(chunk, ip)?)?;
                let value = self
                    .globals
                    .get(name)
                    .copied()
                    .ok_or_else(|| RuntimeErrorKind::UndefinedVariable(name.to_owned()))?;
                self.stack.push(value)?;
            }
            OpCode::DefineGlobal => {
                let name = global_name(&self.heap, read_constant(chunk, ip)?)?.to_owned();
                let value = self.stack.pop()?;
                self.globals.insert(name, value);
            }
            OpCode::SetGlobal => {
                let name = global_name(&self.heap, read_constant(chunk, ip)?)?;
                let value = self.stack.peek(0)?;
                match self.globals.get_mut(name) {
                    Some(slot) => *slot = value,
                    None => return Err(RuntimeErrorKind::UndefinedVariable(name.to_owned())),
                }
            }

            OpCode::Equal | OpCode::NotEqual => {
                let b = self.stack.pop()?;
                let a = self.stack.pop()?;
                let equal = self.heap.values_equal(a, b);
                self.stack.push(Value::Bool(equal == (op == OpCode::Equal)))?;
            }
            OpCode::Greater => self.binary(|a, b| Value::Bool(a > b))?,
            OpCode::GreaterEqual => self.binary(|a, b| Value::Bool(a >= b))?,
            OpCode::Less => self.binary(|a, b| Value::Bool(a < b))?,
            OpCode::LessEqual => self.binary(|a, b| Value::Bool(a <= b))?,
            OpCode::Add => self.binary(|a, b| Value::Number(a + b))?,
            OpCode::Subtract => self.binary(|a, b| Value::Number(a - b))?,
            OpCode::Multiply => self.binary(|a, b| Value::Number(a * b))?,
            OpCode::Divide => self.binary(|a, b| Value::Number(a / b))?,

            OpCode::Not => {
                let value = self.stack.pop()?;
                self.stack.push(Value::Bool(value.is_falsey()))?;
            }
            OpCode::Negate => {
                let n = self.stack.peek(0)?.as_number().ok_or(RuntimeErrorKind::OperandMustBeNumber)?;
                self.stack.pop()?;
                self.stack.push(Value::Number(-n))?;
            }

            OpCode::Print => {
                let value = self.stack.pop()?;
                writeln!(self.stdout, "{}", self.heap.display(value))?;
            }

            OpCode::Jump => {
                let distance = usize::from(read_u16(chunk, ip)?);
                *ip += distance;
            }
            OpCode::JumpIfFalse => {
                let distance = usize::from(read_u16(chunk, ip)?);
                if self.stack.peek(0)?.is_falsey() {
                    *ip += distance;
                }
            }
            OpCode::Loop => {
                let distance = usize::from(read_u16(chunk, ip)?);
                *ip = (*ip)
                    .checked_sub(distance)
                    .ok_or(CoreError::JumpOutOfRange { offset, target: -1 })?;
            }

            OpCode::Return => return Ok(Flow::Return),
        }
        Ok(Flow::Continue)
    }

    /// Numeric binary operator: pops `b` then `a`, pushes `f(a, b)`.
    fn binary(&mut self, f: impl FnOnce(f64, f64) -> Value) -> Result<(), RuntimeErrorKind> {
        let (Some(b), Some(a)) = (self.stack.peek(0)?.as_number(), self.stack.peek(1)?.as_number()) else {
            return Err(RuntimeErrorKind::OperandsMustBeNumbers);
        };
        self.stack.pop()?;
        self.stack.pop()?;
        self.stack.push(f(a, b))
    }

    fn trace_instruction(&self, chunk: &Chunk, offset: usize) {
        let mut stack = String::new();
        for value in self.stack.as_slice() {
            let _ = write!(stack, "[ {} ]", self.heap.display(*value));
        }
        let mut instruction = String::new();
        disassemble_instruction(chunk, &self.heap, offset, &mut instruction);
        trace!(target: "allo::exec", stack = %stack, "{}", instruction.trim_end());
    }
}

/* ────────── Lecture des opérandes ────────── */

fn read_byte(chunk: &Chunk, ip: &mut usize) -> Result<u8, CoreError> {
    let byte = chunk.byte_at(*ip).ok_or(CoreError::TruncatedInstruction { offset: *ip })?;
    *ip += 1;
    Ok(byte)
}

fn read_u16(chunk: &Chunk, ip: &mut usize) -> Result<u16, CoreError> {
    let value = chunk.read_u16(*ip).ok_or(CoreError::TruncatedInstruction { offset: *ip })?;
    *ip += 2;
    Ok(value)
}

fn read_constant(chunk: &Chunk, ip: &mut usize) -> Result<Value, CoreError> {
    let index = usize::from(read_byte(chunk, ip)?);
    chunk.consts.get(index).ok_or(CoreError::ConstantOutOfRange { index, len: chunk.consts.len() })
}

fn global_name(heap: &Heap, constant: Value) -> Result<&str, CoreError> {
    heap.value_as_str(constant).ok_or_else(|| CoreError::corrupted("global name is not a live string"))
}

/* ─────────────────────────── Tests ─────────────────────────── */
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(src: &str) -> (InterpretResult, String, String) {
        let (mut vm, out, err) = Vm::with_captured_output(VmOptions::default());
        let res = vm.interpret(src);
        (res, out.get(), err.get())
    }

    #[test]
    fn negated_grouping() {
        let (res, out, _) = run("print -((1.2 + 3.4) / 5.6);");
        assert_eq!(res, InterpretResult::Ok);
        assert_eq!(out, format!("{}\n", -((1.2_f64 + 3.4) / 5.6)));
    }

    #[test]
    fn strings_compare_by_content() {
        let (res, out, _) = run("print \"ab\" == \"ab\"; print \"ab\" != \"ba\"; print nil == false;");
        assert_eq!(res, InterpretResult::Ok);
        assert_eq!(out, "true\ntrue\nfalse\n");
    }

    #[test]
    fn operand_type_errors() {
        let (res, out, err) = run("print 1;\nprint -true;");
        assert_eq!(res, InterpretResult::RuntimeError);
        assert_eq!(out, "1\n");
        assert_eq!(err, "Operand must be a number.\n[line 2] in script\n");

        let (res, _, err) = run("print 1 < \"x\";");
        assert_eq!(res, InterpretResult::RuntimeError);
        assert_eq!(err, "Operands must be numbers.\n[line 1] in script\n");
    }

    #[test]
    fn undefined_globals() {
        let (res, _, err) = run("print missing;");
        assert_eq!(res, InterpretResult::RuntimeError);
        assert_eq!(err, "Undefined variable 'missing'.\n[line 1] in script\n");

        let (res, _, err) = run("\n\nghost = 1;");
        assert_eq!(res, InterpretResult::RuntimeError);
        assert_eq!(err, "Undefined variable 'ghost'.\n[line 3] in script\n");
    }

    #[test]
    fn set_global_does_not_create() {
        let (mut vm, _, _) = Vm::with_captured_output(VmOptions { persistent_globals: true, ..VmOptions::default() });
        assert_eq!(vm.interpret("x = 1;"), InterpretResult::RuntimeError);
        assert!(vm.global("x").is_none());
        assert_eq!(vm.interpret("var x = 1; var x = 2;"), InterpretResult::Ok);
        assert!(matches!(vm.global("x"), Some(Value::Number(n)) if n == 2.0));
    }

    #[test]
    fn compile_errors_are_reported_and_nothing_runs() {
        let (res, out, err) = run("print 1;\nprint ;");
        assert_eq!(res, InterpretResult::CompileError);
        assert_eq!(out, "");
        assert_eq!(err, "[line 2] Error at ';': Expect expression.\n");
    }

    #[test]
    fn stack_overflow_is_a_runtime_error() {
        let (mut vm, _, err) = Vm::with_captured_output(VmOptions { stack_max: 2, ..VmOptions::default() });
        assert_eq!(vm.interpret("print 1 + (2 + 3);"), InterpretResult::RuntimeError);
        assert_eq!(err.get(), "Stack overflow.\n[line 1] in script\n");
        assert_eq!(vm.stack_len(), 0);
    }

    #[test]
    fn objects_released_after_run() {
        let (mut vm, out, _) = Vm::with_captured_output(VmOptions::default());
        assert_eq!(vm.interpret("var s = \"kept?\"; print s;"), InterpretResult::Ok);
        assert_eq!(out.get(), "kept?\n");
        assert!(vm.heap().is_empty());
        assert_eq!(vm.globals_len(), 0);
    }

    #[test]
    fn persistent_globals_survive_runs() {
        let opts = VmOptions { persistent_globals: true, ..VmOptions::default() };
        let (mut vm, out, _) = Vm::with_captured_output(opts);
        assert_eq!(vm.interpret("var greeting = \"hello\";"), InterpretResult::Ok);
        assert_eq!(vm.interpret("print greeting;"), InterpretResult::Ok);
        assert_eq!(out.get(), "hello\n");
        vm.free_objects();
        assert!(vm.heap().is_empty());
    }

    #[test]
    fn failed_compile_releases_its_strings() {
        let opts = VmOptions { persistent_globals: true, ..VmOptions::default() };
        let (mut vm, out, err) = Vm::with_captured_output(opts);
        assert_eq!(vm.interpret("var greeting = \"hello\";"), InterpretResult::Ok);
        let live = vm.heap().len();
        let bytes = vm.heap().bytes_allocated();
        for _ in 0..3 {
            assert_eq!(vm.interpret("var a = \"leak\"; print ;"), InterpretResult::CompileError);
        }
        assert_eq!(vm.heap().len(), live);
        assert_eq!(vm.heap().bytes_allocated(), bytes);
        assert_eq!(vm.interpret("print greeting;"), InterpretResult::Ok);
        assert_eq!(out.get(), "hello\n");
        assert_eq!(err.get().lines().count(), 3);
    }

    #[test]
    fn hand_built_chunk() {
        let (mut vm, out, _) = Vm::with_captured_output(VmOptions::default());
        let mut chunk = Chunk::new();
        let a = chunk.add_constant(Value::Number(1.5));
        let b = chunk.add_constant(Value::Number(2.0));
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(u8::try_from(a).unwrap(), 1);
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(u8::try_from(b).unwrap(), 1);
        chunk.write_op(OpCode::Multiply, 1);
        chunk.write_op(OpCode::Print, 1);
        chunk.write_op(OpCode::Return, 1);
        assert_eq!(vm.interpret_chunk(&chunk), InterpretResult::Ok);
        assert_eq!(out.get(), "3\n");
        assert_eq!(vm.stack_len(), 0);
    }

    #[test]
    fn invalid_chunk_is_rejected_before_running() {
        let (mut vm, out, err) = Vm::with_captured_output(VmOptions::default());
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Print, 1);
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(9, 1);
        assert_eq!(vm.interpret_chunk(&chunk), InterpretResult::RuntimeError);
        assert_eq!(out.get(), "");
        assert_eq!(
            err.get(),
            "Invalid chunk: constant index 9 out of range (pool size 0)\n[line 0] in script\n"
        );
    }

    #[test]
    fn underflow_from_malformed_bytecode() {
        let (mut vm, _, err) = Vm::with_captured_output(VmOptions::default());
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Add, 4);
        chunk.write_op(OpCode::Return, 4);
        assert_eq!(vm.interpret_chunk(&chunk), InterpretResult::RuntimeError);
        assert_eq!(err.get(), "Stack underflow.\n[line 4] in script\n");
    }
}
