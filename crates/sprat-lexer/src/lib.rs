//! sprat-lexer — analyse lexicale pour Sprat
//!
//! Balayage gauche→droite d'un buffer d'octets bruts (la grammaire est
//! ASCII-only, pas de décodage Unicode). Règles, par priorité :
//! - octets sous `'!'` (blancs/contrôle) ignorés
//! - `0..9` : run maximal de chiffres → littéral entier (la conversion
//!   numérique appartient au parseur)
//! - `* + / - =` : opérateurs, `==` se replie en un seul jeton
//! - `;` : terminateur d'instruction
//! - `a..z` : run maximal de minuscules → mot-clé (reclassé par le parseur)
//! - `#` : commentaire jusqu'à la fin de ligne
//! - `"…"` : chaîne verbatim, sans échappements
//!
//! Tout autre octet est une `LexError`. Sans état entre deux appels.

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

/* ─────────────────────────── Imports / alloc ─────────────────────────── */

#[cfg(not(feature = "std"))]
extern crate alloc;

use core::fmt;

#[cfg(feature = "std")]
use std::{string::String, vec::Vec};

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Tokens ─────────────────────────── */

/// Genre de jeton lexical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TokenKind {
    /// Littéral entier (lexème = le run de chiffres, non converti).
    Int,
    /// `;`
    Semi,
    /// `*`
    Star,
    /// `+`
    Plus,
    /// `/`
    Slash,
    /// `-`
    Minus,
    /// Mot en minuscules (`print`, `true`, `false`, …) — aucune validation ici.
    Keyword,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// Littéral chaîne (lexème = contenu entre guillemets, verbatim).
    Str,
}

/// Jeton : paire immuable (genre, lexème).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Token {
    /// Genre du jeton.
    pub kind: TokenKind,
    /// Sous-chaîne source exacte (ou contenu pour les chaînes).
    pub lexeme: String,
}

impl Token {
    fn new(kind: TokenKind, lexeme: impl Into<String>) -> Self {
        Self { kind, lexeme: lexeme.into() }
    }
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreur lexicale.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LexError {
    /// Octet qui n'ouvre aucun jeton.
    UnexpectedByte {
        /// L'octet fautif.
        byte: u8,
    },
    /// Fin d'entrée atteinte avant le `"` fermant.
    UnterminatedString,
    /// Contenu de chaîne non UTF-8.
    InvalidUtf8,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnexpectedByte { byte } => {
                write!(f, "unexpected character: {:?}", *byte as char)
            }
            LexError::UnterminatedString => write!(f, "unterminated string literal"),
            LexError::InvalidUtf8 => write!(f, "string literal is not valid utf-8"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LexError {}

/* ─────────────────────────── Lexer ─────────────────────────── */

/// Tokenise tout le buffer.
pub fn tokenize(src: &[u8]) -> Result<Vec<Token>, LexError> {
    Lexer::new(src).tokenize()
}

/// Analyseur lexical (itératif).
pub struct Lexer<'a> {
    bytes: &'a [u8],
    /// Position courante en bytes.
    off: usize,
}

impl<'a> Lexer<'a> {
    /// Crée un lexer sur un buffer d'octets.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, off: 0 }
    }

    /// Tokenise toute la source.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut out = Vec::new();
        while let Some(b) = self.peek() {
            match b {
                // blancs et contrôle, silencieusement ignorés
                _ if b < b'!' => {
                    self.bump();
                }
                b'0'..=b'9' => out.push(self.lex_number()),
                b'*' | b'+' | b'/' | b'-' | b'=' => out.push(self.lex_operator()),
                b';' => {
                    self.bump();
                    out.push(Token::new(TokenKind::Semi, ";"));
                }
                b'a'..=b'z' => out.push(self.lex_keyword()),
                b'#' => self.skip_comment(),
                b'"' => out.push(self.lex_string()?),
                other => return Err(LexError::UnexpectedByte { byte: other }),
            }
        }
        Ok(out)
    }

    /* ────────── Primitives internes ────────── */

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.off).copied()
    }

    #[inline]
    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.off += 1;
        }
        b
    }

    fn consume_while(&mut self, mut p: impl FnMut(u8) -> bool) -> &'a [u8] {
        let start = self.off;
        while let Some(b) = self.peek() {
            if p(b) {
                self.off += 1;
            } else {
                break;
            }
        }
        &self.bytes[start..self.off]
    }

    /* ────────── Règles ────────── */

    fn lex_number(&mut self) -> Token {
        let run = self.consume_while(|b| b.is_ascii_digit());
        let lexeme = core::str::from_utf8(run).unwrap(); // safe: ASCII pur
        Token::new(TokenKind::Int, lexeme)
    }

    fn lex_operator(&mut self) -> Token {
        match self.bump() {
            Some(b'*') => Token::new(TokenKind::Star, "*"),
            Some(b'+') => Token::new(TokenKind::Plus, "+"),
            Some(b'/') => Token::new(TokenKind::Slash, "/"),
            Some(b'-') => Token::new(TokenKind::Minus, "-"),
            // seul '=' peut rester : un second '=' se replie en `==`
            _ => {
                if self.peek() == Some(b'=') {
                    self.bump();
                    Token::new(TokenKind::EqEq, "==")
                } else {
                    Token::new(TokenKind::Eq, "=")
                }
            }
        }
    }

    fn lex_keyword(&mut self) -> Token {
        let run = self.consume_while(|b| b.is_ascii_lowercase());
        let lexeme = core::str::from_utf8(run).unwrap(); // safe: ASCII pur
        Token::new(TokenKind::Keyword, lexeme)
    }

    fn skip_comment(&mut self) {
        while let Some(b) = self.bump() {
            if b == b'\n' {
                break;
            }
        }
    }

    fn lex_string(&mut self) -> Result<Token, LexError> {
        self.bump(); // guillemet ouvrant
        let start = self.off;
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(_) => {}
                None => return Err(LexError::UnterminatedString),
            }
        }
        let content = &self.bytes[start..self.off - 1];
        let lexeme = core::str::from_utf8(content).map_err(|_| LexError::InvalidUtf8)?;
        Ok(Token::new(TokenKind::Str, lexeme))
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toks(src: &str) -> Vec<Token> {
        tokenize(src.as_bytes()).unwrap()
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        toks(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn numbers() {
        let v = toks("4 478 1 2 3");
        assert_eq!(v[0], Token::new(TokenKind::Int, "4"));
        assert_eq!(v[1], Token::new(TokenKind::Int, "478"));
        assert_eq!(
            v[2..].iter().map(|t| t.lexeme.as_str()).collect::<Vec<_>>(),
            ["1", "2", "3"]
        );
    }

    #[test]
    fn operators_and_semi() {
        use TokenKind::*;
        assert_eq!(kinds("* + / - = == ;"), [Star, Plus, Slash, Minus, Eq, EqEq, Semi]);
    }

    #[test]
    fn double_equals_is_one_token() {
        let v = toks("4==4");
        assert_eq!(
            v,
            [
                Token::new(TokenKind::Int, "4"),
                Token::new(TokenKind::EqEq, "=="),
                Token::new(TokenKind::Int, "4"),
            ]
        );
    }

    #[test]
    fn keywords_are_raw_words() {
        let v = toks("print true false blah");
        assert!(v.iter().all(|t| t.kind == TokenKind::Keyword));
        assert_eq!(
            v.iter().map(|t| t.lexeme.as_str()).collect::<Vec<_>>(),
            ["print", "true", "false", "blah"]
        );
    }

    #[test]
    fn whitespace_and_control_skipped() {
        assert_eq!(kinds(" \t\r\n\x01 7 "), [TokenKind::Int]);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        let v = toks("1 # deux trois ; * \n2 # fin de fichier");
        assert_eq!(
            v,
            [Token::new(TokenKind::Int, "1"), Token::new(TokenKind::Int, "2")]
        );
    }

    #[test]
    fn strings_are_verbatim() {
        let v = toks(r#""hello world" "a # b""#);
        assert_eq!(v[0], Token::new(TokenKind::Str, "hello world"));
        // pas de traitement du `#` dans une chaîne
        assert_eq!(v[1], Token::new(TokenKind::Str, "a # b"));
    }

    #[test]
    fn empty_string_ok() {
        assert_eq!(toks(r#""""#), [Token::new(TokenKind::Str, "")]);
    }

    #[test]
    fn unterminated_string_is_fatal() {
        assert_eq!(tokenize(br#"print "x"#), Err(LexError::UnterminatedString));
    }

    #[test]
    fn unknown_byte_is_reported() {
        assert_eq!(tokenize(b"4 @ 2"), Err(LexError::UnexpectedByte { byte: b'@' }));
        // les majuscules n'ouvrent aucun jeton
        assert_eq!(tokenize(b"Print"), Err(LexError::UnexpectedByte { byte: b'P' }));
    }

    #[test]
    fn statement_shapes() {
        use TokenKind::*;
        assert_eq!(kinds("print 6+7*9;"), [Keyword, Int, Plus, Int, Star, Int, Semi]);
        assert_eq!(kinds("print true==false;"), [Keyword, Keyword, EqEq, Keyword, Semi]);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_panics(src in proptest::collection::vec(any::<u8>(), 0..512)) {
                let _ = tokenize(&src);
            }

            #[test]
            fn digit_runs_lex_to_one_int(n in any::<u64>()) {
                let src = n.to_string();
                let v = tokenize(src.as_bytes()).unwrap();
                prop_assert_eq!(v, vec![Token::new(TokenKind::Int, src)]);
            }
        }
    }
}
