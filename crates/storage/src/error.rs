//! Gestion des erreurs pour le module de stockage

use amorce_core::PrimerError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Core(#[from] PrimerError),

    #[error("Erreur FASTA dans {}: {message}", .path.display())]
    Fasta { path: PathBuf, message: String },

    #[error("Erreur VCF {}: {message}", .path.display())]
    Vcf { path: PathBuf, message: String },

    #[error("Erreur HTSlib: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),

    #[error("Catalogue de transcrits invalide: {0}")]
    Catalog(String),

    #[error("Table de noms de chromosomes invalide, ligne {line}: {content}")]
    ChromNames { line: usize, content: String },

    #[error("Erreur CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Erreur de configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Erreur IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erreur de sérialisation: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
