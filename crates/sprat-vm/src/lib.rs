//! sprat-vm — machine à pile pour le bytecode Sprat
//!
//! Machine à états : pointeur d'instruction dans le flux + pile
//! d'opérandes. État initial : ip 0, pile vide ; état terminal : ip en fin
//! de flux, pile abandonnée (son contenu final n'est pas validé vide).
//!
//! Chaque invocation construit une instance indépendante — aucun état
//! global d'interprète. La seule E/S est l'écriture de `Print` vers le
//! sink fourni par l'appelant.
//!
//! ⚠️ Ce crate **n'exécute que** du bytecode ; la chaîne source → bytecode
//! vit dans `sprat-lexer`/`-parser`/`-compiler`.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]
#![cfg_attr(not(debug_assertions), warn(missing_docs))]

use std::io::{self, Write};

use thiserror::Error;

use sprat_core::{ByteReader, CoreError, Op, Value, ValueTag};

/* ------------------------------ Erreurs ------------------------------ */

/// Erreurs d'exécution. Toutes terminales pour le run en cours,
/// récupérables pour l'hôte.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Octet lu en position d'opcode sans décodage possible.
    #[error("could not decode opcode byte 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Octet de tag de littéral inconnu derrière `Push`.
    #[error("could not decode value tag byte 0x{0:02X}")]
    InvalidTag(u8),

    /// Flux tronqué au milieu d'un payload de littéral.
    #[error("bytecode ends mid-instruction")]
    Truncated,

    /// Payload de chaîne non UTF-8.
    #[error("string payload is not valid utf-8")]
    InvalidUtf8,

    /// Opérandes du mauvais type pour l'opcode.
    #[error("type mismatch: cannot apply `{op}` to {lhs} and {rhs}")]
    TypeMismatch {
        /// Opcode concerné.
        op: &'static str,
        /// Type de l'opérande gauche.
        lhs: &'static str,
        /// Type de l'opérande droite.
        rhs: &'static str,
    },

    /// Diviseur nul.
    #[error("divide by zero")]
    DivisionByZero,

    /// Dépilage sur pile vide (bytecode construit à la main).
    #[error("operand stack underflow")]
    StackUnderflow,

    /// Échec d'écriture sur le sink de sortie.
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl From<CoreError> for RuntimeError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::UnexpectedEof { .. } => RuntimeError::Truncated,
            CoreError::InvalidOpcode { raw } => RuntimeError::UnknownOpcode(raw),
            CoreError::InvalidTag { raw } => RuntimeError::InvalidTag(raw),
            CoreError::InvalidUtf8 => RuntimeError::InvalidUtf8,
        }
    }
}

/// Résultat de la VM.
pub type VmResult<T> = std::result::Result<T, RuntimeError>;

/* ------------------------------ VM ------------------------------ */

/// Exécute un flux de bytecode sur une instance fraîche, sortie vers `sink`.
pub fn run(bytecode: &[u8], sink: &mut dyn Write) -> VmResult<()> {
    Vm::new(bytecode).run(sink)
}

/// Interpréteur : curseur sur le bytecode + pile d'opérandes possédée.
pub struct Vm<'a> {
    code: ByteReader<'a>,
    stack: Vec<Value>,
}

impl<'a> Vm<'a> {
    /// Crée une instance à ip 0, pile vide.
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self { code: ByteReader::new(bytecode), stack: Vec::new() }
    }

    /// Boucle de dispatch : tourne jusqu'à la fin du flux ou la première
    /// erreur (arrêt immédiat, pas de reprise partielle).
    pub fn run(&mut self, sink: &mut dyn Write) -> VmResult<()> {
        while !self.code.at_end() {
            let b = self.code.read_u8()?;
            let op = Op::from_byte(b).ok_or(RuntimeError::UnknownOpcode(b))?;
            match op {
                Op::Push => self.push_literal()?,
                Op::Add => self.add()?,
                Op::Mul => self.int_op("mul", |l, r| Ok(l.wrapping_mul(r)))?,
                Op::Sub => self.int_op("sub", |l, r| Ok(l.wrapping_sub(r)))?,
                Op::Div => self.int_op("div", |l, r| {
                    if r == 0 {
                        Err(RuntimeError::DivisionByZero)
                    } else {
                        Ok(l.wrapping_div(r))
                    }
                })?,
                Op::Eq => self.eq()?,
                Op::Print => self.print(sink)?,
            }
        }
        Ok(())
    }

    /* --------------------------- Opcodes --------------------------- */

    fn push_literal(&mut self) -> VmResult<()> {
        let t = self.code.read_u8()?;
        let tag = ValueTag::from_byte(t).ok_or(RuntimeError::InvalidTag(t))?;
        let value = match tag {
            ValueTag::Int => Value::Int(self.code.read_i64_le()?),
            ValueTag::True => Value::Bool(true),
            ValueTag::False => Value::Bool(false),
            ValueTag::Str => {
                let bytes = self.code.read_cstr()?;
                let s = std::str::from_utf8(bytes).map_err(|_| RuntimeError::InvalidUtf8)?;
                Value::Str(s.to_owned())
            }
        };
        self.stack.push(value);
        Ok(())
    }

    /// `Add` choisit sa stratégie selon la variante de l'opérande droite
    /// (sommet de pile) : somme entière, ou concaténation avec l'opérande
    /// droite en préfixe (`"a"+"b"` rend `ba`).
    fn add(&mut self) -> VmResult<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        let result = match (&left, &right) {
            (Value::Int(l), Value::Int(r)) => Value::Int(l.wrapping_add(*r)),
            (Value::Str(l), Value::Str(r)) => {
                let mut s = r.clone();
                s.push_str(l);
                Value::Str(s)
            }
            _ => return Err(mismatch("add", &left, &right)),
        };
        self.stack.push(result);
        Ok(())
    }

    fn int_op(
        &mut self,
        name: &'static str,
        apply: impl FnOnce(i64, i64) -> VmResult<i64>,
    ) -> VmResult<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        match (&left, &right) {
            (Value::Int(l), Value::Int(r)) => {
                self.stack.push(Value::Int(apply(*l, *r)?));
                Ok(())
            }
            _ => Err(mismatch(name, &left, &right)),
        }
    }

    fn eq(&mut self) -> VmResult<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.stack.push(Value::Bool(left == right));
        Ok(())
    }

    fn print(&mut self, sink: &mut dyn Write) -> VmResult<()> {
        let value = self.pop()?;
        writeln!(sink, "{value}")?;
        Ok(())
    }

    #[inline]
    fn pop(&mut self) -> VmResult<Value> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }
}

fn mismatch(op: &'static str, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch { op, lhs: kind(left), rhs: kind(right) }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Int(_) => "int",
        Value::Bool(_) => "bool",
        Value::Str(_) => "string",
    }
}

/* --------------------------------- Tests --------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sprat_core::ByteWriter;

    fn push_int(w: &mut ByteWriter, n: i64) {
        w.write_op(Op::Push);
        w.write_tag(ValueTag::Int);
        w.write_i64_le(n);
    }

    fn push_str(w: &mut ByteWriter, s: &str) {
        w.write_op(Op::Push);
        w.write_tag(ValueTag::Str);
        w.write_cstr(s.as_bytes());
    }

    fn push_bool(w: &mut ByteWriter, b: bool) {
        w.write_op(Op::Push);
        w.write_tag(if b { ValueTag::True } else { ValueTag::False });
    }

    fn run_ok(code: &[u8]) -> String {
        let mut out = Vec::new();
        run(code, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn run_err(code: &[u8]) -> (String, RuntimeError) {
        let mut out = Vec::new();
        let err = run(code, &mut out).unwrap_err();
        (String::from_utf8(out).unwrap(), err)
    }

    #[test]
    fn print_a_product() {
        let mut w = ByteWriter::new();
        push_int(&mut w, 7);
        push_int(&mut w, 8);
        w.write_op(Op::Mul);
        w.write_op(Op::Print);
        assert_eq!(run_ok(w.as_slice()), "56\n");
    }

    #[test]
    fn add_and_sub_use_stack_order() {
        // 10 - 4 : gauche poussée d'abord, droite dépilée d'abord
        let mut w = ByteWriter::new();
        push_int(&mut w, 10);
        push_int(&mut w, 4);
        w.write_op(Op::Sub);
        w.write_op(Op::Print);
        assert_eq!(run_ok(w.as_slice()), "6\n");

        let mut w = ByteWriter::new();
        push_int(&mut w, 6);
        push_int(&mut w, 7);
        w.write_op(Op::Add);
        w.write_op(Op::Print);
        assert_eq!(run_ok(w.as_slice()), "13\n");
    }

    #[test]
    fn division_truncates() {
        let mut w = ByteWriter::new();
        push_int(&mut w, 9);
        push_int(&mut w, 2);
        w.write_op(Op::Div);
        w.write_op(Op::Print);
        assert_eq!(run_ok(w.as_slice()), "4\n");
    }

    #[test]
    fn divide_by_zero_is_an_error_with_no_output() {
        let mut w = ByteWriter::new();
        push_int(&mut w, 1);
        push_int(&mut w, 0);
        w.write_op(Op::Div);
        w.write_op(Op::Print);
        let (out, err) = run_err(w.as_slice());
        assert!(matches!(err, RuntimeError::DivisionByZero));
        assert_eq!(out, "");
    }

    #[test]
    fn string_add_puts_right_operand_first() {
        // "a" + "b" rend "ba" : l'opérande droite sert de préfixe
        let mut w = ByteWriter::new();
        push_str(&mut w, "a");
        push_str(&mut w, "b");
        w.write_op(Op::Add);
        w.write_op(Op::Print);
        assert_eq!(run_ok(w.as_slice()), "ba\n");
    }

    #[test]
    fn eq_is_structural_across_variants() {
        let mut w = ByteWriter::new();
        push_int(&mut w, 4);
        push_int(&mut w, 4);
        w.write_op(Op::Eq);
        w.write_op(Op::Print);
        assert_eq!(run_ok(w.as_slice()), "true\n");

        let mut w = ByteWriter::new();
        push_bool(&mut w, true);
        push_bool(&mut w, false);
        w.write_op(Op::Eq);
        w.write_op(Op::Print);
        assert_eq!(run_ok(w.as_slice()), "false\n");

        // inter-variantes : jamais une erreur, juste false
        let mut w = ByteWriter::new();
        push_int(&mut w, 1);
        push_str(&mut w, "1");
        w.write_op(Op::Eq);
        w.write_op(Op::Print);
        assert_eq!(run_ok(w.as_slice()), "false\n");
    }

    #[test]
    fn print_renders_each_variant() {
        let mut w = ByteWriter::new();
        push_int(&mut w, -12);
        w.write_op(Op::Print);
        push_bool(&mut w, true);
        w.write_op(Op::Print);
        push_str(&mut w, "chat");
        w.write_op(Op::Print);
        assert_eq!(run_ok(w.as_slice()), "-12\ntrue\nchat\n");
    }

    #[test]
    fn type_mismatches_are_errors() {
        // bool + int
        let mut w = ByteWriter::new();
        push_bool(&mut w, true);
        push_int(&mut w, 1);
        w.write_op(Op::Add);
        let (_, err) = run_err(w.as_slice());
        assert!(matches!(err, RuntimeError::TypeMismatch { op: "add", .. }));

        // int * string
        let mut w = ByteWriter::new();
        push_int(&mut w, 2);
        push_str(&mut w, "x");
        w.write_op(Op::Mul);
        let (_, err) = run_err(w.as_slice());
        assert!(matches!(err, RuntimeError::TypeMismatch { op: "mul", .. }));

        // string + int : la variante droite (sommet) choisit la stratégie
        let mut w = ByteWriter::new();
        push_str(&mut w, "x");
        push_int(&mut w, 2);
        w.write_op(Op::Add);
        let (_, err) = run_err(w.as_slice());
        assert!(matches!(err, RuntimeError::TypeMismatch { op: "add", .. }));
    }

    #[test]
    fn unknown_opcode_halts_immediately() {
        let mut w = ByteWriter::new();
        push_int(&mut w, 1);
        w.write_op(Op::Print);
        w.write_u8(0x42);
        w.write_op(Op::Print); // jamais atteint
        let (out, err) = run_err(w.as_slice());
        assert!(matches!(err, RuntimeError::UnknownOpcode(0x42)));
        assert_eq!(out, "1\n");
    }

    #[test]
    fn invalid_tag_is_an_error() {
        let (_, err) = run_err(&[Op::Push as u8, 0x09]);
        assert!(matches!(err, RuntimeError::InvalidTag(0x09)));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        // Push Int suivi de 3 octets sur les 8 attendus
        let (_, err) = run_err(&[0x00, 0x00, 1, 2, 3]);
        assert!(matches!(err, RuntimeError::Truncated));
        // chaîne sans terminateur nul
        let (_, err) = run_err(&[0x00, 0x03, b'a', b'b']);
        assert!(matches!(err, RuntimeError::Truncated));
    }

    #[test]
    fn underflow_on_hand_built_bytecode() {
        let (_, err) = run_err(&[Op::Add as u8]);
        assert!(matches!(err, RuntimeError::StackUnderflow));
    }

    #[test]
    fn wrapping_arithmetic_never_panics() {
        let mut w = ByteWriter::new();
        push_int(&mut w, i64::MAX);
        push_int(&mut w, 1);
        w.write_op(Op::Add);
        w.write_op(Op::Print);
        assert_eq!(run_ok(w.as_slice()), format!("{}\n", i64::MIN));

        let mut w = ByteWriter::new();
        push_int(&mut w, i64::MIN);
        push_int(&mut w, -1);
        w.write_op(Op::Div);
        w.write_op(Op::Print);
        assert_eq!(run_ok(w.as_slice()), format!("{}\n", i64::MIN));
    }

    #[test]
    fn reruns_are_deterministic() {
        let mut w = ByteWriter::new();
        push_int(&mut w, 6);
        push_int(&mut w, 7);
        w.write_op(Op::Mul);
        w.write_op(Op::Print);
        push_str(&mut w, "fin");
        w.write_op(Op::Print);
        let first = run_ok(w.as_slice());
        let second = run_ok(w.as_slice());
        assert_eq!(first, second);
        assert_eq!(first, "42\nfin\n");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn pushed_ints_print_as_decimal(n in any::<i64>()) {
                let mut w = ByteWriter::new();
                push_int(&mut w, n);
                w.write_op(Op::Print);
                prop_assert_eq!(run_ok(w.as_slice()), format!("{n}\n"));
            }

            #[test]
            fn arbitrary_bytes_never_panic(code in proptest::collection::vec(any::<u8>(), 0..256)) {
                let mut out = Vec::new();
                let _ = run(&code, &mut out);
            }
        }
    }
}
