//! allo-lexer: analyse lexicale pour Allo
//!
//! Faits saillants :
//! - `Scanner` produit les jetons **à la demande** (trait `TokenSource`), le
//!   compilateur n'a jamais besoin de toute la liste.
//! - commentaires `//`, ident/keywords, nombres `123` / `12.5`, chaînes `"..."`
//!   (multi-lignes, sans échappements)
//! - chaque jeton porte son lexème, son `Span` et sa ligne (1-based)
//! - les erreurs lexicales deviennent des jetons `TokenKind::Error` dont le
//!   lexème est le message ; c'est le compilateur qui les rapporte
//!
//! Exemple éclair :
//! ```
//! use allo_lexer::{Scanner, TokenKind};
//!
//! let kinds: Vec<_> = Scanner::new("var x = 1;").map(|t| t.kind).collect();
//! assert_eq!(kinds.last(), Some(&TokenKind::Eof));
//! ```

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

use core::fmt;

#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use allo_core::{Pos, SourceId, Span};

/* ─────────────────────────── Tokens ─────────────────────────── */

/// Genre de jeton lexical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TokenKind {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `;`
    Semicolon,
    /// `/`
    Slash,
    /// `*`
    Star,
    /// `!`
    Bang,
    /// `!=`
    BangEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// Identifiant.
    Identifier,
    /// Littéral chaîne.
    String,
    /// Littéral nombre.
    Number,
    /// `and`
    And,
    /// `class`
    Class,
    /// `else`
    Else,
    /// `false`
    False,
    /// `for`
    For,
    /// `fun`
    Fun,
    /// `if`
    If,
    /// `nil`
    Nil,
    /// `or`
    Or,
    /// `print`
    Print,
    /// `return`
    Return,
    /// `super`
    Super,
    /// `this`
    This,
    /// `true`
    True,
    /// `var`
    Var,
    /// `while`
    While,
    /// Erreur lexicale (le lexème porte le message).
    Error,
    /// Fin de source.
    Eof,
}

/// Valeur littérale attachée à un jeton.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'a> {
    /// Nombre déjà converti.
    Number(f64),
    /// Contenu d'une chaîne, guillemets retirés.
    Str(&'a str),
}

/// Jeton lexical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    /// Genre.
    pub kind: TokenKind,
    /// Texte source (ou message pour `TokenKind::Error`).
    pub lexeme: &'a str,
    /// Littéral pour `Number` / `String`.
    pub literal: Option<Literal<'a>>,
    /// Localisation en bytes.
    pub span: Span,
    /// Ligne (1-based).
    pub line: u32,
}

impl<'a> Token<'a> {
    /// Jeton synthétique, pratique pour les tests et les sources préfabriquées.
    pub const fn synthetic(kind: TokenKind, lexeme: &'a str, line: u32) -> Self {
        Self { kind, lexeme, literal: None, span: Span::new(SourceId(0), Pos::ZERO, Pos::ZERO), line }
    }
}

/// Erreurs lexicales reconnues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Caractère inattendu.
    UnexpectedChar,
    /// Chaîne non terminée.
    UnterminatedString,
}

impl LexErrorKind {
    /// Message rapporté à l'utilisateur.
    pub const fn message(self) -> &'static str {
        match self {
            Self::UnexpectedChar => "Unexpected character.",
            Self::UnterminatedString => "Unterminated string.",
        }
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.message()) }
}

/* ─────────────────────────── Source de jetons ─────────────────────────── */

/// Flux de jetons tiré par le compilateur.
///
/// La fin est signalée par un jeton `Eof`, répété ensuite indéfiniment.
pub trait TokenSource<'a> {
    /// Jeton suivant.
    fn next_token(&mut self) -> Token<'a>;
}

/// Source préfabriquée (liste de jetons), complétée par `Eof`.
#[derive(Debug, Clone)]
pub struct TokenBuffer<'a> {
    tokens: Vec<Token<'a>>,
    index: usize,
}

impl<'a> TokenBuffer<'a> {
    /// Enveloppe une liste de jetons.
    pub fn new(tokens: Vec<Token<'a>>) -> Self { Self { tokens, index: 0 } }
}

impl<'a> TokenSource<'a> for TokenBuffer<'a> {
    fn next_token(&mut self) -> Token<'a> {
        match self.tokens.get(self.index) {
            Some(tok) => {
                self.index += 1;
                *tok
            }
            None => {
                let line = self.tokens.last().map_or(1, |t| t.line);
                Token::synthetic(TokenKind::Eof, "", line)
            }
        }
    }
}

/* ─────────────────────────── Scanner ─────────────────────────── */

/// Analyseur lexical (itératif, à la demande).
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    /// Début du lexème courant.
    start: usize,
    /// Position courante en bytes.
    off: usize,
    /// Ligne courante (1-based).
    line: u32,
    /// Id de la source.
    source: SourceId,
    /// `Eof` déjà rendu (fin de l'itérateur).
    done: bool,
}

impl<'a> Scanner<'a> {
    /// Crée un scanner sur `src`.
    pub fn new(src: &'a str) -> Self { Self::with_source(src, SourceId(0)) }

    /// Crée un scanner en précisant l'id de source.
    pub const fn with_source(src: &'a str, source: SourceId) -> Self {
        Self { src, bytes: src.as_bytes(), start: 0, off: 0, line: 1, source, done: false }
    }

    /// Prochain jeton. Émet toujours `Eof` en fin de source.
    pub fn scan_token(&mut self) -> Token<'a> {
        self.skip_ws_and_comments();
        self.start = self.off;

        let Some(c) = self.bump() else {
            return self.make(TokenKind::Eof);
        };

        let tok = match c {
            c if is_ident_start(c) => self.identifier(),
            c if c.is_ascii_digit() => self.number(),
            b'"' => self.string(),

            b'(' => self.make(TokenKind::LeftParen),
            b')' => self.make(TokenKind::RightParen),
            b'{' => self.make(TokenKind::LeftBrace),
            b'}' => self.make(TokenKind::RightBrace),
            b';' => self.make(TokenKind::Semicolon),
            b',' => self.make(TokenKind::Comma),
            b'.' => self.make(TokenKind::Dot),
            b'-' => self.make(TokenKind::Minus),
            b'+' => self.make(TokenKind::Plus),
            b'/' => self.make(TokenKind::Slash),
            b'*' => self.make(TokenKind::Star),

            b'!' => self.make_if_eq(TokenKind::BangEqual, TokenKind::Bang),
            b'=' => self.make_if_eq(TokenKind::EqualEqual, TokenKind::Equal),
            b'<' => self.make_if_eq(TokenKind::LessEqual, TokenKind::Less),
            b'>' => self.make_if_eq(TokenKind::GreaterEqual, TokenKind::Greater),

            _ => {
                // avance jusqu'à la fin du caractère UTF-8 fautif
                while !self.src.is_char_boundary(self.off) {
                    self.off += 1;
                }
                self.error(LexErrorKind::UnexpectedChar)
            }
        };

        #[cfg(feature = "trace")]
        log::trace!("scan {:?} {:?} (line {})", tok.kind, tok.lexeme, tok.line);

        tok
    }

    /// Tokenise toute la source (ajoute `Eof` final).
    pub fn tokenize(self) -> Vec<Token<'a>> { self.collect() }

    /* ────────── Primitives internes ────────── */

    #[inline] fn peek(&self) -> Option<u8> { self.bytes.get(self.off).copied() }
    #[inline] fn peek2(&self) -> Option<u8> { self.bytes.get(self.off + 1).copied() }
    #[inline] fn bump(&mut self) -> Option<u8> { let b = self.peek(); if b.is_some() { self.off += 1; } b }
    #[inline] fn eat(&mut self, b: u8) -> bool { if self.peek() == Some(b) { self.off += 1; true } else { false } }

    fn consume_while(&mut self, mut p: impl FnMut(u8) -> bool) {
        while let Some(b) = self.peek() {
            if p(b) { self.off += 1; } else { break; }
        }
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\r' | b'\t') => self.off += 1,
                Some(b'\n') => {
                    self.line += 1;
                    self.off += 1;
                }
                Some(b'/') if self.peek2() == Some(b'/') => self.consume_while(|b| b != b'\n'),
                _ => break,
            }
        }
    }

    fn identifier(&mut self) -> Token<'a> {
        self.consume_while(|b| is_ident_start(b) || b.is_ascii_digit());
        let kind = keyword_of(&self.src[self.start..self.off]).unwrap_or(TokenKind::Identifier);
        self.make(kind)
    }

    fn number(&mut self) -> Token<'a> {
        self.consume_while(|b| b.is_ascii_digit());
        if self.peek() == Some(b'.') && self.peek2().is_some_and(|b| b.is_ascii_digit()) {
            self.off += 1;
            self.consume_while(|b| b.is_ascii_digit());
        }
        let mut tok = self.make(TokenKind::Number);
        tok.literal = tok.lexeme.parse::<f64>().ok().map(Literal::Number);
        tok
    }

    fn string(&mut self) -> Token<'a> {
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\n') => self.line += 1,
                Some(_) => {}
                None => return self.error(LexErrorKind::UnterminatedString),
            }
        }
        // la ligne d'une chaîne multi-lignes est celle de sa fin
        let mut tok = self.make(TokenKind::String);
        tok.literal = Some(Literal::Str(&self.src[self.start + 1..self.off - 1]));
        tok
    }

    fn make_if_eq(&mut self, two: TokenKind, one: TokenKind) -> Token<'a> {
        let kind = if self.eat(b'=') { two } else { one };
        self.make(kind)
    }

    fn make(&self, kind: TokenKind) -> Token<'a> {
        Token {
            kind,
            lexeme: &self.src[self.start..self.off],
            literal: None,
            span: self.span_from(self.start),
            line: self.line,
        }
    }

    fn error(&self, kind: LexErrorKind) -> Token<'a> {
        Token {
            kind: TokenKind::Error,
            lexeme: kind.message(),
            literal: None,
            span: self.span_from(self.start),
            line: self.line,
        }
    }

    #[inline] fn span_from(&self, start: usize) -> Span {
        Span::new(self.source, Pos(to_u32(start)), Pos(to_u32(self.off)))
    }
}

impl<'a> TokenSource<'a> for Scanner<'a> {
    fn next_token(&mut self) -> Token<'a> { self.scan_token() }
}

/// Itère jusqu'au `Eof` inclus.
impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.done {
            return None;
        }
        let tok = self.scan_token();
        self.done = tok.kind == TokenKind::Eof;
        Some(tok)
    }
}

/* ─────────────────────────── Utilitaires ─────────────────────────── */

#[inline]
const fn is_ident_start(b: u8) -> bool { b == b'_' || b.is_ascii_alphabetic() }

#[inline]
fn to_u32(off: usize) -> u32 { u32::try_from(off).unwrap_or(u32::MAX) }

fn keyword_of(s: &str) -> Option<TokenKind> {
    Some(match s {
        "and" => TokenKind::And,
        "class" => TokenKind::Class,
        "else" => TokenKind::Else,
        "false" => TokenKind::False,
        "for" => TokenKind::For,
        "fun" => TokenKind::Fun,
        "if" => TokenKind::If,
        "nil" => TokenKind::Nil,
        "or" => TokenKind::Or,
        "print" => TokenKind::Print,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "this" => TokenKind::This,
        "true" => TokenKind::True,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        _ => return None,
    })
}

/* ─────────────────────────── Tests ─────────────────────────── */
