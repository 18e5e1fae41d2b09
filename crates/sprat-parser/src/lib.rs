//! sprat-parser — parseur du langage Sprat
//!
//! Branches :
//! - `sprat-lexer` pour la tokenisation
//! - `sprat-ast` pour l'arbre cible
//!
//! Grammaire (du moins au plus liant, chaque niveau gauche-associatif) :
//! ```text
//! program    := statement*
//! statement  := equality ";"  |  "print" equality ";"
//! equality   := additive ("==" additive)*
//! additive   := term (("+" | "-") term)*
//! term       := literal (("*" | "/") literal)*
//! literal    := INT | "true" | "false" | STRING
//! ```
//!
//! Les lexèmes entiers sont convertis en i64 ici ; un `peek` au-delà de la
//! fin rend `None`, que chaque site d'appel traite explicitement en erreur.

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

/* ─────────────────────────── Imports / alloc ─────────────────────────── */

#[cfg(not(feature = "std"))]
extern crate alloc;

use core::fmt;

#[cfg(feature = "std")]
use std::{string::String, string::ToString, vec::Vec};

#[cfg(not(feature = "std"))]
use alloc::{string::String, string::ToString, vec::Vec};

use sprat_ast::{BinOp, Stmt};
use sprat_core::Value;
use sprat_lexer::{Token, TokenKind};

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreur de parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Jeton présent mais du mauvais genre.
    UnexpectedToken {
        /// Ce que la grammaire attendait à cet endroit.
        expected: &'static str,
        /// Le jeton trouvé.
        found: Token,
    },
    /// Fin des jetons atteinte alors qu'il en fallait un.
    UnexpectedEof {
        /// Ce que la grammaire attendait à cet endroit.
        expected: &'static str,
    },
    /// Lexème entier inconvertible en i64.
    InvalidInt {
        /// Le lexème fautif.
        lexeme: String,
    },
    /// Mot-clé hors de `print`/`true`/`false`.
    UnknownKeyword {
        /// Le mot fautif.
        word: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, found } => {
                write!(f, "attendu: {expected}, trouvé: `{}`", found.lexeme)
            }
            ParseError::UnexpectedEof { expected } => {
                write!(f, "attendu: {expected}, trouvé: fin d'entrée")
            }
            ParseError::InvalidInt { lexeme } => {
                write!(f, "littéral entier invalide: `{lexeme}`")
            }
            ParseError::UnknownKeyword { word } => {
                write!(f, "mot-clé inconnu: `{word}`")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

type PResult<T> = core::result::Result<T, ParseError>;

/* ─────────────────────────── Parser ─────────────────────────── */

/// Parse la séquence complète de jetons en instructions.
pub fn parse(tokens: &[Token]) -> Result<Vec<Stmt>, ParseError> {
    Parser::new(tokens).parse_program()
}

/// Parseur à curseur sur une tranche de jetons.
pub struct Parser<'a> {
    tokens: &'a [Token],
    curr: usize,
}

impl<'a> Parser<'a> {
    /// Crée un parseur au début de la tranche.
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, curr: 0 }
    }

    /// Parse un programme complet (une instruction par `;`).
    pub fn parse_program(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    /* ─────────── Instructions ─────────── */

    fn parse_statement(&mut self) -> PResult<Stmt> {
        let stmt = if self.is_keyword("print") {
            self.bump();
            Stmt::print(self.parse_equality()?)
        } else {
            self.parse_equality()?
        };
        self.expect(TokenKind::Semi, "`;`")?;
        Ok(stmt)
    }

    /* ─────────── Expressions ─────────── */

    fn parse_equality(&mut self) -> PResult<Stmt> {
        let mut expr = self.parse_additive()?;
        while self.check(TokenKind::EqEq) {
            self.bump();
            let right = self.parse_additive()?;
            expr = Stmt::binary(BinOp::Eq, expr, right);
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> PResult<Stmt> {
        let mut expr = self.parse_term()?;
        loop {
            let op = match self.peek().map(|t| t.kind) {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_term()?;
            expr = Stmt::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> PResult<Stmt> {
        let mut expr = self.parse_literal()?;
        loop {
            let op = match self.peek().map(|t| t.kind) {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                _ => break,
            };
            self.bump();
            let right = self.parse_literal()?;
            expr = Stmt::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_literal(&mut self) -> PResult<Stmt> {
        let t = self.read("littéral")?;
        match t.kind {
            TokenKind::Int => {
                let n: i64 = t
                    .lexeme
                    .parse()
                    .map_err(|_| ParseError::InvalidInt { lexeme: t.lexeme.clone() })?;
                Ok(Stmt::Literal(Value::Int(n)))
            }
            TokenKind::Keyword => match t.lexeme.as_str() {
                "true" => Ok(Stmt::Literal(Value::Bool(true))),
                "false" => Ok(Stmt::Literal(Value::Bool(false))),
                word => Err(ParseError::UnknownKeyword { word: word.to_string() }),
            },
            TokenKind::Str => Ok(Stmt::Literal(Value::Str(t.lexeme.clone()))),
            _ => Err(ParseError::UnexpectedToken { expected: "littéral", found: t.clone() }),
        }
    }

    /* ─────────── Utilitaires ─────────── */

    #[inline]
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.curr)
    }

    #[inline]
    fn bump(&mut self) -> Option<&'a Token> {
        let t = self.peek();
        if t.is_some() {
            self.curr += 1;
        }
        t
    }

    #[inline]
    fn check(&self, kind: TokenKind) -> bool {
        matches!(self.peek(), Some(t) if t.kind == kind)
    }

    #[inline]
    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(t) if t.kind == TokenKind::Keyword && t.lexeme == word)
    }

    fn read(&mut self, expected: &'static str) -> PResult<&'a Token> {
        self.bump().ok_or(ParseError::UnexpectedEof { expected })
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> PResult<&'a Token> {
        let t = self.read(expected)?;
        if t.kind == kind {
            Ok(t)
        } else {
            Err(ParseError::UnexpectedToken { expected, found: t.clone() })
        }
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
