//! Pratt table: precedence levels and the parse rule of each token kind.

use allo_lexer::TokenKind;

/// Binding power, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Not an operator.
    None,
    /// `=`
    Assignment,
    /// `or`
    Or,
    /// `and`
    And,
    /// `==` `!=`
    Equality,
    /// `<` `>` `<=` `>=`
    Comparison,
    /// `+` `-`
    Term,
    /// `*` `/`
    Factor,
    /// `!` `-`
    Unary,
    /// `.` `()`
    Call,
    /// Literals, names, groupings.
    Primary,
}

impl Precedence {
    /// One level tighter. Binary operators parse their right operand at this
    /// level, which makes them left-associative.
    pub const fn next(self) -> Self {
        match self {
            Self::None => Self::Assignment,
            Self::Assignment => Self::Or,
            Self::Or => Self::And,
            Self::And => Self::Equality,
            Self::Equality => Self::Comparison,
            Self::Comparison => Self::Term,
            Self::Term => Self::Factor,
            Self::Factor => Self::Unary,
            Self::Unary => Self::Call,
            Self::Call | Self::Primary => Self::Primary,
        }
    }
}

/// Parse actions, dispatched by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFn {
    Grouping,
    Unary,
    Binary,
    Number,
    String,
    Literal,
    Variable,
    And,
    Or,
}

/// Prefix action, infix action and infix precedence of a token kind.
#[derive(Debug, Clone, Copy)]
pub struct ParseRule {
    pub prefix: Option<ParseFn>,
    pub infix: Option<ParseFn>,
    pub precedence: Precedence,
}

const fn r(prefix: Option<ParseFn>, infix: Option<ParseFn>, precedence: Precedence) -> ParseRule {
    ParseRule { prefix, infix, precedence }
}

pub const fn rule(kind: TokenKind) -> ParseRule {
    use ParseFn as F;
    use Precedence as P;
    use TokenKind as T;

    match kind {
        T::LeftParen => r(Some(F::Grouping), None, P::None),
        T::Minus => r(Some(F::Unary), Some(F::Binary), P::Term),
        T::Plus => r(None, Some(F::Binary), P::Term),
        T::Slash | T::Star => r(None, Some(F::Binary), P::Factor),
        T::Bang => r(Some(F::Unary), None, P::None),
        T::BangEqual | T::EqualEqual => r(None, Some(F::Binary), P::Equality),
        T::Greater | T::GreaterEqual | T::Less | T::LessEqual => r(None, Some(F::Binary), P::Comparison),
        T::Identifier => r(Some(F::Variable), None, P::None),
        T::String => r(Some(F::String), None, P::None),
        T::Number => r(Some(F::Number), None, P::None),
        T::And => r(None, Some(F::And), P::And),
        T::Or => r(None, Some(F::Or), P::Or),
        T::False | T::True | T::Nil => r(Some(F::Literal), None, P::None),
        _ => r(None, None, P::None),
    }
}
