//! sprat-ast — arbre d'instructions du langage Sprat
//!
//! Ce crate définit les structures produites par le parseur et consommées
//! (en lecture seule) par le compilateur. Chaque instruction top-level est
//! un arbre : les nœuds possèdent exclusivement leurs enfants (`Box`),
//! pas de partage, pas de cycles.
//!
//! # Features
//! - `std` (par défaut)
//! - `serde` : (dé)sérialisation de l'arbre
//!
//! # Exemple
//! ```rust
//! use sprat_ast::{BinOp, Stmt};
//! use sprat_core::Value;
//!
//! let six_plus_sept = Stmt::binary(
//!     BinOp::Add,
//!     Stmt::Literal(Value::Int(6)),
//!     Stmt::Literal(Value::Int(7)),
//! );
//! ```

#![deny(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

/* ─── alloc uniquement en no_std ─── */
#[cfg(not(feature = "std"))]
extern crate alloc;

/* ─── Imports conditionnels ─── */
#[cfg(feature = "std")]
use std::boxed::Box;

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use sprat_core::Value;

/// Opérateur binaire. Sans état.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinOp {
    /// Addition (entiers) ou concaténation (textes).
    Add,
    /// Soustraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Égalité structurelle.
    Eq,
}

/// Une instruction (ou sous-expression : la distinction est positionnelle).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Stmt {
    /// Feuille : constante.
    Literal(Value),
    /// Opérateur appliqué à deux sous-arbres possédés.
    Binary {
        /// Opérateur appliqué.
        op: BinOp,
        /// Opérande gauche.
        left: Box<Stmt>,
        /// Opérande droite.
        right: Box<Stmt>,
    },
    /// Enveloppe dont le résultat évalué est émis sur la sortie.
    Print(Box<Stmt>),
}

impl Stmt {
    /// Construit un nœud binaire (boxe les enfants).
    pub fn binary(op: BinOp, left: Stmt, right: Stmt) -> Self {
        Stmt::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    /// Construit un nœud print (boxe l'enfant).
    pub fn print(inner: Stmt) -> Self {
        Stmt::Print(Box::new(inner))
    }
}
