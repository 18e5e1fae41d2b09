//! sprat-cli — bibliothèque interne du binaire `sprat`
//!
//! But : fournir une API propre et testable pour le CLI sans mélanger la
//! logique d'E/S et le parsing d'arguments (laisse ça à `main.rs`).
//!
//! Points clés :
//! - `run_bytes` : le point d'entrée du pipeline — tokenise → parse →
//!   compile → exécute, et remonte la première erreur rencontrée
//! - `repl` : boucle ligne à ligne qui signale l'erreur puis continue
//! - `disasm_bytes` : source → listing textuel du bytecode
//! - Traces (`feature = "trace"`) et couleurs (`feature = "color"`)
//!   optionnelles

#![deny(unused_must_use)]
#![forbid(unsafe_code)]

use std::{
    fs,
    io::{self, BufRead, BufWriter, Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use thiserror::Error;

use sprat_compiler::CompileError;
use sprat_lexer::LexError;
use sprat_parser::ParseError;
use sprat_vm::RuntimeError;

/* ───────────────────────────── Erreur pipeline ───────────────────────────── */

/// Première erreur rencontrée par le pipeline, étage par étage. Chaque
/// étage rend son erreur à l'appelant ; aucune n'est fatale au processus.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Erreur du tokenizer.
    #[error("lex: {0}")]
    Lex(#[from] LexError),
    /// Erreur du parseur.
    #[error("parse: {0}")]
    Parse(#[from] ParseError),
    /// Erreur du compilateur.
    #[error("compile: {0}")]
    Compile(#[from] CompileError),
    /// Erreur de la VM.
    #[error("runtime: {0}")]
    Runtime(#[from] RuntimeError),
}

/* ───────────────────────────── Pipeline ───────────────────────────── */

/// Compile une source en bytecode (tokenise → parse → compile).
pub fn compile_bytes(src: &[u8]) -> Result<Vec<u8>, PipelineError> {
    let tokens = sprat_lexer::tokenize(src)?;
    #[cfg(feature = "trace")]
    log::debug!("{} jetons", tokens.len());

    let stmts = sprat_parser::parse(&tokens)?;
    #[cfg(feature = "trace")]
    log::debug!("{} instructions", stmts.len());

    let code = sprat_compiler::compile(&stmts)?;
    #[cfg(feature = "trace")]
    log::debug!("{} octets de bytecode", code.len());

    Ok(code)
}

/// Point d'entrée du pipeline : exécute une source complète, sortie vers
/// `sink`. La sortie déjà écrite avant une erreur reste acquise.
pub fn run_bytes(src: &[u8], sink: &mut dyn Write) -> Result<(), PipelineError> {
    let code = compile_bytes(src)?;
    sprat_vm::run(&code, sink)?;
    Ok(())
}

/// Source → listing désassemblé du bytecode compilé.
pub fn disasm_bytes(src: &[u8]) -> Result<String> {
    let code = compile_bytes(src)?;
    sprat_core::disasm::disassemble(&code).context("désassemblage du bytecode")
}

/* ───────────────────────────── Entrées ───────────────────────────── */

/// Entrée texte (source) : fichier ou `-` (=stdin).
#[derive(Clone, Debug)]
pub enum Input {
    /// Chemin d'un fichier source.
    Path(PathBuf),
    /// Lecture complète de stdin.
    Stdin,
}

impl Default for Input {
    fn default() -> Self {
        Self::Stdin
    }
}

/// Lit l'entrée en entier.
pub fn read_input(input: &Input) -> Result<Vec<u8>> {
    match input {
        Input::Path(path) => {
            fs::read(path).with_context(|| format!("lecture de {}", path.display()))
        }
        Input::Stdin => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf).context("lecture de stdin")?;
            Ok(buf)
        }
    }
}

/// Exécute une entrée vers stdout (bufferisé).
pub fn run_input(input: &Input) -> Result<()> {
    let src = read_input(input)?;
    let stdout = io::stdout().lock();
    let mut sink = BufWriter::new(stdout);
    run_bytes(&src, &mut sink)?;
    sink.flush().context("vidage de stdout")?;
    Ok(())
}

/* ───────────────────────────── REPL ───────────────────────────── */

/// Boucle ligne à ligne : affiche le prompt, exécute la ligne, signale
/// l'éventuelle erreur et continue ; EOF termine proprement.
pub fn repl(prompt: &str) -> Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("{prompt}");
        io::stdout().flush().context("vidage du prompt")?;

        line.clear();
        let n = stdin.lock().read_line(&mut line).context("lecture de stdin")?;
        if n == 0 {
            // EOF : fin de session
            println!();
            return Ok(());
        }

        let stdout = io::stdout().lock();
        let mut sink = BufWriter::new(stdout);
        match run_bytes(line.as_bytes(), &mut sink) {
            Ok(()) => sink.flush().context("vidage de stdout")?,
            Err(e) => {
                sink.flush().context("vidage de stdout")?;
                report_error(&e);
            }
        }
    }
}

/* ───────────────────────── Présentation des erreurs ───────────────────────── */

/// Affiche une erreur sur stderr (colorée si la feature `color` est là).
pub fn report_error(err: &PipelineError) {
    #[cfg(feature = "color")]
    {
        use owo_colors::OwoColorize;
        eprintln!("{} {err}", "error:".red().bold());
    }
    #[cfg(not(feature = "color"))]
    eprintln!("error: {err}");
}

/* ───────────────────────────── Initialisation ───────────────────────────── */

/// Initialise le logger selon la feature `trace`.
pub fn init_logger() {
    #[cfg(feature = "trace")]
    {
        let _ = env_logger::Builder::from_default_env().try_init();
    }
}

/* ───────────────────────────── Tests ───────────────────────────── */
