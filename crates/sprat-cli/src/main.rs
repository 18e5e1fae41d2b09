//! `sprat` — CLI principal de Sprat
//!
//! Bienvenue dans le binaire ! Ici on fait uniquement : parsing
//! d'arguments, initialisation (logger, couleur), et délégation à
//! `sprat_cli` (lib).

#![forbid(unsafe_code)]

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use sprat_cli as cli;

/* ──────────────────────────── CLI (clap) ──────────────────────────── */

#[derive(Debug, Parser)]
#[command(name = "sprat", version, about = "Sprat CLI — exécuter, inspecter le bytecode, REPL", long_about = None)]
struct Opt {
    /// Augmente la verbosité (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Mode silencieux (casse la verbosité)
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,

    /// Force la couleur (si la feature `color` est compilée)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Sous-commandes
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Exécuter un fichier source (ou - pour stdin)
    Run {
        /// Fichier source (ou - pour stdin)
        input: Option<PathBuf>,
    },

    /// Lancer le REPL ligne à ligne
    Repl {
        /// Prompt du REPL
        #[arg(long, default_value = ">>> ")]
        prompt: String,
    },

    /// Compiler une source et afficher le bytecode désassemblé
    Disasm {
        /// Fichier source (ou - pour stdin)
        input: Option<PathBuf>,
    },
}

/* ──────────────────────────── Entrée ──────────────────────────── */

fn input_from_opt(p: &Option<PathBuf>) -> cli::Input {
    match p {
        Some(path) if path.as_os_str() == "-" => cli::Input::Stdin,
        Some(path) => cli::Input::Path(path.clone()),
        None => cli::Input::Stdin,
    }
}

/* ──────────────────────────── Logger / Verbosité ──────────────────────────── */

fn init_telemetry(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    std::env::set_var(
        "RUST_LOG",
        std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()),
    );
    cli::init_logger();
}

fn init_color(choice: ColorChoice) {
    // `owo-colors` détecte tout seul le TTY ; on force via les env vars.
    match choice {
        ColorChoice::Auto => {}
        ColorChoice::Always => {
            std::env::set_var("CLICOLOR_FORCE", "1");
            std::env::remove_var("NO_COLOR");
        }
        ColorChoice::Never => {
            std::env::set_var("NO_COLOR", "1");
            std::env::remove_var("CLICOLOR_FORCE");
        }
    }
}

/* ──────────────────────────── main ──────────────────────────── */

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> Result<()> {
    let opt = Opt::parse();

    init_color(opt.color);
    init_telemetry(opt.verbose, opt.quiet);

    match opt.cmd {
        Command::Run { input } => cli::run_input(&input_from_opt(&input)),
        Command::Repl { prompt } => cli::repl(&prompt),
        Command::Disasm { input } => {
            let src = cli::read_input(&input_from_opt(&input))?;
            print!("{}", cli::disasm_bytes(&src)?);
            Ok(())
        }
    }
}
