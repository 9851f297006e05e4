//! Contraintes de design et méthodes supportées

use crate::error::PrimerError;
use crate::thermo::{OligoProfile, ThermoConditions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Méthode de design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Confirmation d'un variant ponctuel par séquençage
    Sanger,
    /// Quantification d'un exon
    Qpcr,
    /// Spécificité ARNm sur une paire d'exons
    Mrna,
}

impl Method {
    /// Nombre de composants attendus dans la requête (séparés par `::`)
    pub fn arity(self) -> usize {
        match self {
            Method::Sanger => 1,
            Method::Qpcr => 2,
            Method::Mrna => 3,
        }
    }

    /// Exemple de requête valide, affiché dans les erreurs d'arité
    pub fn example(self) -> &'static str {
        match self {
            Method::Sanger => "NM_000546.6:c.215C>G",
            Method::Qpcr => "NM_000546.6::4",
            Method::Mrna => "NM_000546.6::5::7",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Sanger => "sanger",
            Method::Qpcr => "qpcr",
            Method::Mrna => "mrna",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = PrimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sanger" | "pcr" => Ok(Method::Sanger),
            "qpcr" => Ok(Method::Qpcr),
            "mrna" => Ok(Method::Mrna),
            _ => Err(PrimerError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Paramètres de la recherche hors-cible
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffTargetConfig {
    /// Taille des graines (k-mers indexés)
    pub word_size: usize,
    pub max_evalue: f64,
    /// Au-delà, l'amorce est considérée comme non spécifique
    pub max_hits: usize,
    /// Nombre maximal d'amplicons génomiques acceptés pour une paire
    pub max_amplicons: usize,
    /// Bases 3' devant s'apparier exactement pour qu'un hit compte
    pub min_3prime_matches: usize,
    /// Longueur maximale d'un amplicon génomique
    pub max_amplicon_len: u64,
}

impl Default for OffTargetConfig {
    fn default() -> Self {
        Self {
            word_size: 13,
            max_evalue: 5.0,
            max_hits: 10_000,
            max_amplicons: 1,
            min_3prime_matches: 15,
            max_amplicon_len: 4000,
        }
    }
}

/// Poids des écarts dans la pénalité
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyWeights {
    pub size: f64,
    pub tm: f64,
    pub gc: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            size: 1.0,
            tm: 1.0,
            gc: 0.5,
        }
    }
}

/// Contraintes immuables d'une requête
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub size_min: usize,
    pub size_opt: usize,
    pub size_max: usize,
    pub tm_min: f64,
    pub tm_opt: f64,
    pub tm_max: f64,
    pub gc_min: f64,
    pub gc_max: f64,
    pub homopolymer_max_len: usize,
    pub three_prime_max_gc: usize,
    /// -ΔG maximal des cinq dernières bases (kcal/mol)
    pub three_prime_stability: f64,
    pub ambiguous_max: usize,
    /// Longueurs d'amplicon acceptées, bornes incluses
    pub amplicon_range: (usize, usize),
    /// Écart minimal entre la fin de l'amorce sens et le début de l'amorce anti-sens
    pub min_insert: usize,
    pub thermo: ThermoConditions,
    /// Budget de paires examinées par le validateur
    pub max_candidates: usize,
    pub off_target: OffTargetConfig,
    pub result_count: usize,
    pub weights: PenaltyWeights,
    /// Taille des lots produits par le moteur et validés ensemble
    pub batch_size: usize,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            size_min: 18,
            size_opt: 20,
            size_max: 27,
            tm_min: 57.0,
            tm_opt: 60.0,
            tm_max: 63.0,
            gc_min: 20.0,
            gc_max: 80.0,
            homopolymer_max_len: 4,
            three_prime_max_gc: 4,
            three_prime_stability: 100.0,
            ambiguous_max: 0,
            amplicon_range: (350, 600),
            min_insert: 0,
            thermo: ThermoConditions::default(),
            max_candidates: 100,
            off_target: OffTargetConfig::default(),
            result_count: 10,
            weights: PenaltyWeights::default(),
            batch_size: 10,
        }
    }
}

impl Constraints {
    /// Vrai si les bornes sont ordonnées; sinon aucune amorce ne peut exister
    pub fn is_consistent(&self) -> bool {
        self.size_min <= self.size_opt
            && self.size_opt <= self.size_max
            && self.tm_min <= self.tm_opt
            && self.tm_opt <= self.tm_max
            && self.gc_min <= self.gc_max
            && self.amplicon_range.0 <= self.amplicon_range.1
    }

    /// Vérifie un profil d'oligo contre les bornes thermodynamiques et structurelles
    pub fn accepts(&self, profile: &OligoProfile) -> bool {
        profile.tm >= self.tm_min
            && profile.tm <= self.tm_max
            && profile.gc_percent >= self.gc_min
            && profile.gc_percent <= self.gc_max
            && profile.homopolymer_len <= self.homopolymer_max_len
            && profile.three_prime_gc <= self.three_prime_max_gc
            && profile.three_prime_stability <= self.three_prime_stability
            && profile.ambiguous <= self.ambiguous_max
    }

    /// Pénalité d'un oligo: somme pondérée des carrés des écarts normalisés.
    /// Nulle à l'optimum.
    pub fn penalty(&self, len: usize, profile: &OligoProfile) -> f64 {
        let size = normalized_deviation(
            len as f64,
            self.size_min as f64,
            self.size_opt as f64,
            self.size_max as f64,
        );
        let tm = normalized_deviation(profile.tm, self.tm_min, self.tm_opt, self.tm_max);
        let gc_opt = (self.gc_min + self.gc_max) / 2.0;
        let gc = normalized_deviation(profile.gc_percent, self.gc_min, gc_opt, self.gc_max);

        self.weights.size * size * size + self.weights.tm * tm * tm + self.weights.gc * gc * gc
    }

    pub fn amplicon_in_range(&self, len: usize) -> bool {
        len >= self.amplicon_range.0 && len <= self.amplicon_range.1
    }
}

fn normalized_deviation(value: f64, min: f64, opt: f64, max: f64) -> f64 {
    let half = if value < opt { opt - min } else { max - opt };
    if half <= 0.0 {
        return if value == opt { 0.0 } else { 1.0 };
    }
    (value - opt) / half
}
