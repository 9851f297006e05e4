//! CLI de design d'amorces

use amorce_core::PrimerError;
use amorce_storage::StorageError;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod commands;
mod display;

use commands::{check, design};

#[derive(Parser)]
#[command(name = "amorce")]
#[command(about = "Design d'amorces Sanger, qPCR et ARNm", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Niveau de verbosité (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Cherche des paires d'amorces pour une requête
    Design {
        /// Méthode: sanger, qpcr ou mrna
        method: String,

        /// Requête: "NM_000546.6:c.215C>G", "NM_000546.6::4" ou "NM_000546.6::5::7"
        query: String,

        /// Fichier de paramètres (JSON, TOML ou YAML)
        #[arg(short, long, default_value = "amorce.toml")]
        settings: PathBuf,

        /// Plage de taille d'amplicon imposée, ex. 400-700
        #[arg(short, long)]
        amplicon: Option<String>,

        /// Sortie JSON au lieu du tableau
        #[arg(long)]
        json: bool,

        /// Écrire la sortie dans un fichier
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Vérifie et charge les ressources déclarées dans les paramètres
    Check {
        /// Fichier de paramètres (JSON, TOML ou YAML)
        #[arg(short, long, default_value = "amorce.toml")]
        settings: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    amorce_core::try_init_logging(level);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", style("Erreur:").red().bold());
            // 2: requête à corriger, 1: données ou environnement
            if is_user_error(&err) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Design {
            method,
            query,
            settings,
            amplicon,
            json,
            output,
        } => {
            design::run(&method, &query, settings, amplicon.as_deref(), json, output)?;
        }
        Commands::Check { settings } => {
            check::run(settings)?;
        }
    }

    Ok(())
}

/// Vrai si une cause de l'erreur est une saisie invalide
fn is_user_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(e) = cause.downcast_ref::<PrimerError>() {
            return e.is_user_error();
        }
        matches!(cause.downcast_ref::<StorageError>(), Some(StorageError::Core(e)) if e.is_user_error())
    })
}

/// Crée une barre de progression spinner
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(msg.to_string());
    pb
}
