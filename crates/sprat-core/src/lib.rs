//! sprat-core — primitives partagées du pipeline Sprat (no_std-ready)
//!
//! Fournit :
//! - `Value` : la représentation commune des valeurs (littéraux au parsing,
//!   cellules de pile à l'exécution) + rendu textuel
//! - `Op` (opcodes) et `ValueTag` (tags de littéraux inline) avec leurs
//!   valeurs d'octet exactes
//! - IO mémoire (little-endian) : `ByteWriter`, `ByteReader`
//! - `disasm` : listing textuel d'un flux de bytecode
//! - Erreurs `CoreError` + alias `CoreResult<T>`
//!
//! Features :
//! - `std` (par défaut) : impl `std::error::Error` & tests
//! - `serde` : derive (dé)sérialisation sur les structures utiles

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

/* ─────────────────────────── Imports ─────────────────────────── */

use core::fmt;

#[cfg(feature = "std")]
use std::{string::String, vec::Vec};

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Résultat commun ─────────────────────────── */

/// Alias résultat commun au core.
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/* ─────────────────────────── Valeurs ─────────────────────────── */

/// Valeur Sprat : payload d'un littéral au parsing, cellule de pile à
/// l'exécution. L'égalité est structurelle (variante + payload) ; comparer
/// deux variantes différentes vaut `false`, jamais une erreur.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// Entier signé 64 bits.
    Int(i64),
    /// Booléen (encodé sur le fil par deux tags distincts, `True`/`False`).
    Bool(bool),
    /// Texte possédé.
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

/* ─────────────────────────── Opcodes & tags ─────────────────────────── */

/// Opcodes du bytecode Sprat. Un octet chacun ; les valeurs sont le format
/// externe, ne pas les renuméroter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Op {
    /// Pousse un littéral (suivi d'un `ValueTag` + payload éventuel).
    Push = 0x00,
    /// Addition (entiers) ou concaténation (textes).
    Add = 0x01,
    /// Multiplication entière.
    Mul = 0x02,
    /// Dépile et écrit le rendu textuel + `\n` sur la sortie.
    Print = 0x03,
    /// Division entière.
    Div = 0x04,
    /// Soustraction entière.
    Sub = 0x05,
    /// Égalité structurelle, pousse un booléen.
    Eq = 0x06,
}

impl Op {
    /// Décode un octet en opcode.
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(Op::Push),
            0x01 => Some(Op::Add),
            0x02 => Some(Op::Mul),
            0x03 => Some(Op::Print),
            0x04 => Some(Op::Div),
            0x05 => Some(Op::Sub),
            0x06 => Some(Op::Eq),
            _ => None,
        }
    }
}

/// Tag de type d'un littéral inline derrière `Op::Push`. Même contrainte :
/// les valeurs sont le format externe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum ValueTag {
    /// i64 little-endian sur 8 octets.
    Int = 0x00,
    /// `true`, aucun payload.
    True = 0x01,
    /// `false`, aucun payload.
    False = 0x02,
    /// Octets bruts terminés par un nul (pas de nul interne représentable).
    Str = 0x03,
}

impl ValueTag {
    /// Décode un octet en tag.
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(ValueTag::Int),
            0x01 => Some(ValueTag::True),
            0x02 => Some(ValueTag::False),
            0x03 => Some(ValueTag::Str),
            _ => None,
        }
    }
}

/* ─────────────────────────── Byte Writer (LE) ─────────────────────────── */

/// Buffer d'écriture (croît automatiquement).
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Crée un writer vide.
    pub fn new() -> Self { Self { buf: Vec::new() } }
    /// Accès en lecture au contenu.
    pub fn as_slice(&self) -> &[u8] { &self.buf }
    /// Récupère le buffer (consomme).
    pub fn into_vec(self) -> Vec<u8> { self.buf }
    /// Ajoute des octets bruts.
    pub fn write_bytes(&mut self, bytes: &[u8]) { self.buf.extend_from_slice(bytes); }
    /// Écrit un octet.
    pub fn write_u8(&mut self, v: u8) { self.buf.push(v); }
    /// Écrit un opcode.
    pub fn write_op(&mut self, op: Op) { self.buf.push(op as u8); }
    /// Écrit un tag de littéral.
    pub fn write_tag(&mut self, tag: ValueTag) { self.buf.push(tag as u8); }
    /// Écrit un i64 little-endian.
    pub fn write_i64_le(&mut self, v: i64) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    /// Écrit des octets suivis du terminateur nul.
    pub fn write_cstr(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.buf.push(0);
    }
}

/* ─────────────────────────── Byte Reader (LE) ─────────────────────────── */

/// Lecteur séquentiel sur un slice d'octets (helpers LE).
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    off: usize,
}

impl<'a> ByteReader<'a> {
    /// Construit un lecteur.
    pub fn new(data: &'a [u8]) -> Self { Self { data, off: 0 } }
    /// Offset courant.
    pub fn offset(&self) -> usize { self.off }
    /// Taille restante.
    pub fn remaining(&self) -> usize { self.data.len().saturating_sub(self.off) }
    /// Vrai si tout a été consommé.
    pub fn at_end(&self) -> bool { self.remaining() == 0 }

    /// Lit `n` octets (ou erreur si EOF).
    pub fn read_bytes(&mut self, n: usize) -> CoreResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CoreError::UnexpectedEof { needed: n as u64, at: self.off as u64 });
        }
        let start = self.off;
        self.off += n;
        Ok(&self.data[start..self.off])
    }

    /// Lit un octet.
    pub fn read_u8(&mut self) -> CoreResult<u8> {
        let b = self.read_bytes(1)?;
        Ok(b[0])
    }

    /// Lit un i64 LE.
    pub fn read_i64_le(&mut self) -> CoreResult<i64> {
        let b = self.read_bytes(8)?;
        Ok(i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    /// Lit les octets jusqu'au terminateur nul (exclu, consommé).
    pub fn read_cstr(&mut self) -> CoreResult<&'a [u8]> {
        let start = self.off;
        loop {
            let b = self.read_u8()?;
            if b == 0 {
                return Ok(&self.data[start..self.off - 1]);
            }
        }
    }
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreurs de bas niveau communes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoreError {
    /// Fin de buffer inattendue.
    UnexpectedEof {
        /// Nombre d'octets manquants.
        needed: u64,
        /// Offset où l'erreur s'est produite.
        at: u64,
    },
    /// Octet d'opcode inconnu.
    InvalidOpcode {
        /// Valeur brute de l'octet.
        raw: u8,
    },
    /// Octet de tag de littéral inconnu.
    InvalidTag {
        /// Valeur brute de l'octet.
        raw: u8,
    },
    /// UTF-8 invalide.
    InvalidUtf8,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::UnexpectedEof { needed, at } => {
                write!(f, "unexpected EOF: need {needed} bytes at {at}")
            }
            CoreError::InvalidOpcode { raw } => write!(f, "invalid opcode byte: 0x{raw:02X}"),
            CoreError::InvalidTag { raw } => write!(f, "invalid value tag byte: 0x{raw:02X}"),
            CoreError::InvalidUtf8 => write!(f, "invalid utf-8"),
        }
    }
}

/// Implémente `std::error::Error` uniquement avec la feature `std`.
#[cfg(feature = "std")]
impl std::error::Error for CoreError {}

/* ─────────────────────────── Désassembleur ─────────────────────────── */

/// Listing textuel d'un flux de bytecode, une ligne par instruction.
pub mod disasm {
    use super::{ByteReader, CoreError, CoreResult, Op, String, ValueTag};
    use core::fmt::Write;

    #[cfg(not(feature = "std"))]
    use alloc::format;
    #[cfg(feature = "std")]
    use std::format;

    /// Désassemble `code` : `0000: Push ;; 7`, `0010: Print`, …
    /// L'offset affiché est celui de l'octet d'opcode.
    pub fn disassemble(code: &[u8]) -> CoreResult<String> {
        let mut r = ByteReader::new(code);
        let mut out = String::new();

        while !r.at_end() {
            let pc = r.offset();
            let b = r.read_u8()?;
            let op = Op::from_byte(b).ok_or(CoreError::InvalidOpcode { raw: b })?;
            match op {
                Op::Push => {
                    let _ = writeln!(out, "{pc:04}: Push ;; {}", read_literal(&mut r)?);
                }
                _ => {
                    let _ = writeln!(out, "{pc:04}: {op:?}");
                }
            }
        }

        Ok(out)
    }

    fn read_literal(r: &mut ByteReader<'_>) -> CoreResult<String> {
        let t = r.read_u8()?;
        let tag = ValueTag::from_byte(t).ok_or(CoreError::InvalidTag { raw: t })?;
        Ok(match tag {
            ValueTag::Int => format!("{}", r.read_i64_le()?),
            ValueTag::True => "true".into(),
            ValueTag::False => "false".into(),
            ValueTag::Str => {
                let bytes = r.read_cstr()?;
                let s = core::str::from_utf8(bytes).map_err(|_| CoreError::InvalidUtf8)?;
                format!("{s:?}")
            }
        })
    }
}

/* ─────────────────────────── Prélude (reexports utiles) ─────────────────────────── */

/// Prélude pratique pour importer les types/funcs clés du crate.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{ByteReader, ByteWriter, CoreError, CoreResult, Op, Value, ValueTag};
}

/* ─────────────────────────── Tests ─────────────────────────── */
