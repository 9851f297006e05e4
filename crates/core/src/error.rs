//! Types d'erreurs pour la bibliothèque de design d'amorces

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrimerError {
    #[error("Syntaxe de requête invalide: {0}")]
    Parse(String),

    #[error("Nombre de composants invalide pour {method}: attendu {expected}, obtenu {found} (exemple: {example})")]
    Arity {
        method: String,
        expected: usize,
        found: usize,
        example: &'static str,
    },

    #[error("Méthode de design non supportée: {0}")]
    UnsupportedMethod(String),

    #[error("Coordonnées introuvables: {0}")]
    CoordinateLookup(String),

    #[error("Ressource manquante: {}", .0.display())]
    ResourceMissing(PathBuf),

    #[error("Base IUPAC invalide: {0}")]
    InvalidBase(char),

    #[error("Chromosome inconnu: {0}")]
    UnknownChromosome(String),

    #[error("Fenêtre invalide {chrom}:{start}-{end}")]
    InvalidWindow { chrom: String, start: u64, end: u64 },

    #[error("Source de variants {name} illisible: {message}")]
    VariantQuery { name: String, message: String },

    #[error("Erreur IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erreur de sérialisation: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrimerError {
    /// Vrai si l'erreur provient d'une saisie utilisateur à corriger
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            PrimerError::Parse(_) | PrimerError::Arity { .. } | PrimerError::UnsupportedMethod(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PrimerError>;
