//! sprat-compiler — émission du bytecode Sprat
//!
//! - Entrée : `&[sprat_ast::Stmt]`
//! - Sortie : flux d'octets plat (voir `sprat_core::Op`/`ValueTag`)
//!
//! Parcours post-ordre, une instruction à la fois, concaténées dans
//! l'ordre de la séquence : les opérandes d'un nœud binaire sont émis
//! gauche puis droite, l'opcode consommateur en dernier.

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

/* ─────────────────────────── Imports / alloc ─────────────────────────── */

#[cfg(not(feature = "std"))]
extern crate alloc;

use core::fmt;

#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use sprat_ast::{BinOp, Stmt};
use sprat_core::{ByteWriter, Op, Value, ValueTag};

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreur de compilation.
///
/// L'appariement exhaustif sur `Stmt` rend la « forme inconnue » de
/// l'étage impossible à représenter ; le contrat faillible reste, pour le
/// seul cas réellement inencodable du format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Littéral chaîne contenant un octet nul : le format terminé par nul
    /// ne peut pas le transporter.
    NulInString,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::NulInString => {
                write!(f, "string literal contains a nul byte")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CompileError {}

type CompileResult<T> = core::result::Result<T, CompileError>;

/* ─────────────────────────── Émission ─────────────────────────── */

/// Compile une séquence d'instructions en bytecode.
pub fn compile(stmts: &[Stmt]) -> CompileResult<Vec<u8>> {
    let mut w = ByteWriter::new();
    for stmt in stmts {
        emit_stmt(&mut w, stmt)?;
    }
    Ok(w.into_vec())
}

fn emit_stmt(w: &mut ByteWriter, stmt: &Stmt) -> CompileResult<()> {
    match stmt {
        Stmt::Literal(value) => emit_literal(w, value),
        Stmt::Binary { op, left, right } => {
            emit_stmt(w, left)?;
            emit_stmt(w, right)?;
            w.write_op(match op {
                BinOp::Add => Op::Add,
                BinOp::Sub => Op::Sub,
                BinOp::Mul => Op::Mul,
                BinOp::Div => Op::Div,
                BinOp::Eq => Op::Eq,
            });
            Ok(())
        }
        Stmt::Print(inner) => {
            emit_stmt(w, inner)?;
            w.write_op(Op::Print);
            Ok(())
        }
    }
}

fn emit_literal(w: &mut ByteWriter, value: &Value) -> CompileResult<()> {
    w.write_op(Op::Push);
    match value {
        Value::Int(n) => {
            w.write_tag(ValueTag::Int);
            w.write_i64_le(*n);
        }
        Value::Bool(true) => w.write_tag(ValueTag::True),
        Value::Bool(false) => w.write_tag(ValueTag::False),
        Value::Str(s) => {
            if s.as_bytes().contains(&0) {
                return Err(CompileError::NulInString);
            }
            w.write_tag(ValueTag::Str);
            w.write_cstr(s.as_bytes());
        }
    }
    Ok(())
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int(n: i64) -> Stmt {
        Stmt::Literal(Value::Int(n))
    }

    #[test]
    fn int_literal_is_push_tag_le64() {
        let code = compile(&[int(7)]).unwrap();
        assert_eq!(code, [0x00, 0x00, 7, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn negative_int_is_twos_complement() {
        let code = compile(&[int(-1)]).unwrap();
        assert_eq!(code, [0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn bools_have_no_payload() {
        assert_eq!(compile(&[Stmt::Literal(Value::Bool(true))]).unwrap(), [0x00, 0x01]);
        assert_eq!(compile(&[Stmt::Literal(Value::Bool(false))]).unwrap(), [0x00, 0x02]);
    }

    #[test]
    fn strings_are_nul_terminated() {
        let code = compile(&[Stmt::Literal(Value::Str("ab".into()))]).unwrap();
        assert_eq!(code, [0x00, 0x03, b'a', b'b', 0x00]);
    }

    #[test]
    fn nul_in_string_is_rejected() {
        let stmt = Stmt::Literal(Value::Str("a\0b".into()));
        assert_eq!(compile(&[stmt]), Err(CompileError::NulInString));
    }

    #[test]
    fn binary_emits_postorder() {
        // 7*8 => push 7, push 8, mult
        let code = compile(&[Stmt::binary(BinOp::Mul, int(7), int(8))]).unwrap();
        assert_eq!(
            code,
            [
                0x00, 0x00, 7, 0, 0, 0, 0, 0, 0, 0, // push 7
                0x00, 0x00, 8, 0, 0, 0, 0, 0, 0, 0, // push 8
                0x02, // mult
            ]
        );
    }

    #[test]
    fn print_wraps_inner_then_opcode() {
        let code = compile(&[Stmt::print(int(4))]).unwrap();
        assert_eq!(code, [0x00, 0x00, 4, 0, 0, 0, 0, 0, 0, 0, 0x03]);
    }

    #[test]
    fn every_operator_has_its_opcode() {
        for (op, byte) in [
            (BinOp::Add, 0x01),
            (BinOp::Mul, 0x02),
            (BinOp::Div, 0x04),
            (BinOp::Sub, 0x05),
            (BinOp::Eq, 0x06),
        ] {
            let code = compile(&[Stmt::binary(op, int(1), int(2))]).unwrap();
            assert_eq!(*code.last().unwrap(), byte);
        }
    }

    #[test]
    fn statements_concatenate_in_order() {
        let code = compile(&[Stmt::print(int(1)), Stmt::print(int(2))]).unwrap();
        assert_eq!(
            code,
            [
                0x00, 0x00, 1, 0, 0, 0, 0, 0, 0, 0, 0x03, // print 1
                0x00, 0x00, 2, 0, 0, 0, 0, 0, 0, 0, 0x03, // print 2
            ]
        );
    }
}
