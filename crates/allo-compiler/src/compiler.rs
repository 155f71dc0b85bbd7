//! Single-pass compiler: pulls tokens, parses with precedence climbing and
//! emits bytecode straight into a [`Chunk`].

use allo_core::{disasm::disassemble_chunk, Chunk, Heap, OpCode, Value};
use allo_lexer::{Literal, Token, TokenKind, TokenSource};
use tracing::debug;

use crate::diagnostic::{CompileError, Diagnostic, ErrorLocation};
use crate::rules::{rule, ParseFn, Precedence};
use crate::scope::{Resolution, Scope};
use crate::CompilerOptions;

/// Deepest recursion allowed through nested statements and expressions.
pub const NESTING_MAX: usize = 256;

/// Compiler state for one chunk.
///
/// Borrows the VM heap so that string constants and global names are
/// allocated where the VM will look them up.
pub struct Compiler<'src, 'h, S> {
    tokens: S,
    heap: &'h mut Heap,
    chunk: Chunk,
    current: Token<'src>,
    previous: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    scope: Scope<'src>,
    nesting: usize,
    diagnostics: Vec<Diagnostic>,
    options: CompilerOptions,
}

impl<'src, 'h, S: TokenSource<'src>> Compiler<'src, 'h, S> {
    /// New compiler over a token source.
    pub fn new(tokens: S, heap: &'h mut Heap, options: CompilerOptions) -> Self {
        let placeholder = Token::synthetic(TokenKind::Eof, "", 1);
        Self {
            tokens,
            heap,
            chunk: Chunk::new(),
            current: placeholder,
            previous: placeholder,
            had_error: false,
            panic_mode: false,
            scope: Scope::default(),
            nesting: 0,
            diagnostics: Vec::new(),
            options,
        }
    }

    /// Compiles the whole token stream.
    ///
    /// # Errors
    /// Returns every diagnostic reported when at least one error occurred;
    /// no chunk is produced in that case.
    pub fn compile(mut self) -> Result<Chunk, CompileError> {
        self.advance();
        while !self.matches(TokenKind::Eof) {
            self.declaration();
        }
        self.end_compiler();

        debug!(
            bytes = self.chunk.len(),
            constants = self.chunk.consts.len(),
            errors = self.diagnostics.len(),
            "compiled chunk"
        );

        if self.had_error {
            Err(CompileError { diagnostics: self.diagnostics })
        } else {
            Ok(self.chunk)
        }
    }

    /* ────────── Flux de jetons ────────── */

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.tokens.next_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let message = self.current.lexeme;
            self.error_at_current(message);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
        } else {
            self.error_at_current(message);
        }
    }

    fn check(&self, kind: TokenKind) -> bool { self.current.kind == kind }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    /* ────────── Diagnostics ────────── */

    fn error_at_current(&mut self, message: &str) { self.error_at(self.current, message); }

    fn error(&mut self, message: &str) { self.error_at(self.previous, message); }

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;

        let location = match token.kind {
            TokenKind::Eof => ErrorLocation::AtEnd,
            TokenKind::Error => ErrorLocation::Lexical,
            _ => ErrorLocation::At(token.lexeme.to_owned()),
        };
        let diag = Diagnostic { line: token.line, location, message: message.to_owned() };
        debug!(%diag, "compile error");
        self.diagnostics.push(diag);
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => self.advance(),
            }
        }
    }

    /* ────────── Émission ────────── */

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.chunk.write(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) { self.emit_byte(op.as_byte()); }

    fn emit_op_arg(&mut self, op: OpCode, arg: u8) {
        self.emit_op(op);
        self.emit_byte(arg);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        let index = self.chunk.add_constant(value);
        if let Ok(index) = u8::try_from(index) {
            index
        } else {
            self.error("Too many constants in one chunk.");
            0
        }
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.make_constant(value);
        self.emit_op_arg(OpCode::Constant, index);
    }

    /// Emits a jump with a placeholder offset; returns the operand position.
    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.chunk.len() - 2
    }

    fn patch_jump(&mut self, operand: usize) {
        let distance = self.chunk.len() - operand - 2;
        let Ok(distance) = u16::try_from(distance) else {
            self.error("Too much code to jump over.");
            return;
        };
        let patched = self.chunk.patch_u16(operand, distance);
        debug_assert!(patched, "jump operand outside the chunk");
    }

    fn emit_loop(&mut self, loop_start: usize) {
        self.emit_op(OpCode::Loop);
        let distance = self.chunk.len() - loop_start + 2;
        let distance = u16::try_from(distance).unwrap_or_else(|_| {
            self.error("Loop body too large.");
            u16::MAX
        });
        let [hi, lo] = distance.to_be_bytes();
        self.emit_byte(hi);
        self.emit_byte(lo);
    }

    fn end_compiler(&mut self) {
        self.emit_op(OpCode::Return);
        if self.options.print_code && !self.had_error {
            debug!(target: "allo::code", "\n{}", disassemble_chunk(&self.chunk, &*self.heap, "code"));
        }
    }

    /* ────────── Déclarations & instructions ────────── */

    fn declaration(&mut self) {
        if self.matches(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }
        if self.panic_mode {
            self.synchronize();
        }
    }

    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");
        if self.matches(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.");
        self.define_variable(global);
    }

    fn statement(&mut self) {
        if self.enter_nesting("Statement nested too deeply.") {
            self.statement_body();
            self.nesting -= 1;
        }
    }

    fn statement_body(&mut self) {
        if self.matches(TokenKind::Print) {
            self.print_statement();
        } else if self.matches(TokenKind::If) {
            self.if_statement();
        } else if self.matches(TokenKind::While) {
            self.while_statement();
        } else if self.matches(TokenKind::For) {
            self.for_statement();
        } else if self.matches(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit_op(OpCode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_op(OpCode::Pop);
    }

    fn block(&mut self) {
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.");
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();
        let else_jump = self.emit_jump(OpCode::Jump);

        self.patch_jump(then_jump);
        self.emit_op(OpCode::Pop);
        if self.matches(TokenKind::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.chunk.len();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_op(OpCode::Pop);
    }

    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.");
        if self.matches(TokenKind::Semicolon) {
            // pas d'initialiseur
        } else if self.matches(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.chunk.len();
        let mut exit_jump = None;
        if !self.matches(TokenKind::Semicolon) {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.");
            exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse));
            self.emit_op(OpCode::Pop);
        }

        if !self.matches(TokenKind::RightParen) {
            let body_jump = self.emit_jump(OpCode::Jump);
            let increment_start = self.chunk.len();
            self.expression();
            self.emit_op(OpCode::Pop);
            self.consume(TokenKind::RightParen, "Expect ')' after for clauses.");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_op(OpCode::Pop);
        }
        self.end_scope();
    }

    /* ────────── Portées & variables ────────── */

    fn begin_scope(&mut self) { self.scope.begin(); }

    fn end_scope(&mut self) {
        for _ in 0..self.scope.end() {
            self.emit_op(OpCode::Pop);
        }
    }

    fn identifier_constant(&mut self, name: &str) -> u8 {
        let name = self.heap.copy_string(name);
        self.make_constant(Value::Obj(name))
    }

    fn declare_variable(&mut self) {
        if self.scope.is_global() {
            return;
        }
        let name = self.previous.lexeme;
        if self.scope.declared_here(name) {
            self.error("Already a variable with this name in this scope.");
        }
        if !self.scope.add(name) {
            self.error("Too many local variables in function.");
        }
    }

    fn parse_variable(&mut self, message: &str) -> u8 {
        self.consume(TokenKind::Identifier, message);
        self.declare_variable();
        if !self.scope.is_global() {
            return 0;
        }
        self.identifier_constant(self.previous.lexeme)
    }

    fn define_variable(&mut self, global: u8) {
        if !self.scope.is_global() {
            self.scope.mark_initialized();
            return;
        }
        self.emit_op_arg(OpCode::DefineGlobal, global);
    }

    fn named_variable(&mut self, name: &'src str, can_assign: bool) {
        let (get, set, arg) = match self.scope.resolve(name) {
            Resolution::Local(slot) => (OpCode::GetLocal, OpCode::SetLocal, slot),
            Resolution::Uninitialized(slot) => {
                self.error("Can't read local variable in its own initializer.");
                (OpCode::GetLocal, OpCode::SetLocal, slot)
            }
            Resolution::Global => {
                let index = self.identifier_constant(name);
                (OpCode::GetGlobal, OpCode::SetGlobal, index)
            }
        };

        if can_assign && self.matches(TokenKind::Equal) {
            self.expression();
            self.emit_op_arg(set, arg);
        } else {
            self.emit_op_arg(get, arg);
        }
    }

    /* ────────── Expressions (Pratt) ────────── */

    fn expression(&mut self) { self.parse_precedence(Precedence::Assignment); }

    /// Counts one level of recursion. Past [`NESTING_MAX`] the offending token
    /// is consumed and reported instead, so the parser always makes progress.
    fn enter_nesting(&mut self, message: &str) -> bool {
        if self.nesting >= NESTING_MAX {
            self.advance();
            self.error(message);
            return false;
        }
        self.nesting += 1;
        true
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        if self.enter_nesting("Expression nested too deeply.") {
            self.parse_operators(precedence);
            self.nesting -= 1;
        }
    }

    fn parse_operators(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = rule(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };

        let can_assign = precedence <= Precedence::Assignment;
        self.apply(prefix, can_assign);

        while precedence <= rule(self.current.kind).precedence {
            self.advance();
            if let Some(infix) = rule(self.previous.kind).infix {
                self.apply(infix, can_assign);
            }
        }

        if can_assign && self.matches(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    fn apply(&mut self, f: ParseFn, can_assign: bool) {
        match f {
            ParseFn::Grouping => self.grouping(),
            ParseFn::Unary => self.unary(),
            ParseFn::Binary => self.binary(),
            ParseFn::Number => self.number(),
            ParseFn::String => self.string(),
            ParseFn::Literal => self.literal(),
            ParseFn::Variable => self.named_variable(self.previous.lexeme, can_assign),
            ParseFn::And => self.and(),
            ParseFn::Or => self.or(),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn number(&mut self) {
        let value = match self.previous.literal {
            Some(Literal::Number(n)) => Some(n),
            _ => self.previous.lexeme.parse::<f64>().ok(),
        };
        match value {
            Some(n) => self.emit_constant(Value::Number(n)),
            None => self.error("Invalid number literal."),
        }
    }

    fn string(&mut self) {
        let content = match self.previous.literal {
            Some(Literal::Str(s)) => s,
            _ => self.previous.lexeme.trim_matches('"'),
        };
        let obj = self.heap.copy_string(content);
        self.emit_constant(Value::Obj(obj));
    }

    fn literal(&mut self) {
        match self.previous.kind {
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::True => self.emit_op(OpCode::True),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            _ => {}
        }
    }

    fn unary(&mut self) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match operator {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            TokenKind::Bang => self.emit_op(OpCode::Not),
            _ => {}
        }
    }

    fn binary(&mut self) {
        let operator = self.previous.kind;
        self.parse_precedence(rule(operator).precedence.next());
        let op = match operator {
            TokenKind::Plus => OpCode::Add,
            TokenKind::Minus => OpCode::Subtract,
            TokenKind::Star => OpCode::Multiply,
            TokenKind::Slash => OpCode::Divide,
            TokenKind::EqualEqual => OpCode::Equal,
            TokenKind::BangEqual => OpCode::NotEqual,
            TokenKind::Greater => OpCode::Greater,
            TokenKind::GreaterEqual => OpCode::GreaterEqual,
            TokenKind::Less => OpCode::Less,
            TokenKind::LessEqual => OpCode::LessEqual,
            _ => return,
        };
        self.emit_op(op);
    }

    fn and(&mut self) {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    fn or(&mut self) {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        let end_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(else_jump);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
