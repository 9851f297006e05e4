//! Score thermodynamique et structurel des oligos
//!
//! Température de fusion par plus proches voisins (SantaLucia 1998) avec la
//! correction saline de Primer3 (équivalent sodium de von Ahsen 2001),
//! contenu GC, homopolymères et stabilité de l'extrémité 3'.

use crate::sequence::IupacBase;
use serde::{Deserialize, Serialize};

/// Constante des gaz parfaits (cal/K/mol)
const GAS_CONSTANT: f64 = 1.9872;
const KELVIN: f64 = 273.15;
/// Nombre de bases examinées à l'extrémité 3'
pub const THREE_PRIME_WINDOW: usize = 5;

/// Conditions de la réaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermoConditions {
    /// Sel monovalent (mM)
    pub salt_monovalent: f64,
    /// Sel divalent, Mg2+ (mM)
    pub salt_divalent: f64,
    /// dNTPs (mM)
    pub dntp_conc: f64,
    /// Concentration d'oligo (nM)
    pub dna_conc: f64,
}

impl Default for ThermoConditions {
    fn default() -> Self {
        Self {
            salt_monovalent: 50.0,
            salt_divalent: 1.5,
            dntp_conc: 0.6,
            dna_conc: 50.0,
        }
    }
}

impl ThermoConditions {
    /// Équivalent sodium (mM), les dNTPs chélatant le magnésium
    pub fn sodium_equivalent(&self) -> f64 {
        let free_mg = (self.salt_divalent - self.dntp_conc).max(0.0);
        self.salt_monovalent + 120.0 * free_mg.sqrt()
    }
}

#[derive(Debug, Clone, Copy)]
struct NearestNeighbor {
    dh: f64,
    ds: f64,
}

// SantaLucia 1998, paramètres unifiés (kcal/mol, cal/K/mol)
fn nn_params(a: IupacBase, b: IupacBase) -> Option<NearestNeighbor> {
    use IupacBase::*;
    let (dh, ds) = match (a, b) {
        (A, A) | (T, T) => (-7.9, -22.2),
        (A, T) => (-7.2, -20.4),
        (T, A) => (-7.2, -21.3),
        (C, A) | (T, G) => (-8.5, -22.7),
        (G, T) | (A, C) => (-8.4, -22.4),
        (C, T) | (A, G) => (-7.8, -21.0),
        (G, A) | (T, C) => (-8.2, -22.2),
        (C, G) => (-10.6, -27.2),
        (G, C) => (-9.8, -24.4),
        (C, C) | (G, G) => (-8.0, -19.9),
        _ => return None,
    };
    Some(NearestNeighbor { dh, ds })
}

fn terminal_initiation(base: IupacBase) -> NearestNeighbor {
    if base.is_gc() {
        NearestNeighbor { dh: 0.1, ds: -2.8 }
    } else {
        NearestNeighbor { dh: 2.3, ds: 4.1 }
    }
}

fn is_self_complementary(seq: &[IupacBase]) -> bool {
    seq.iter()
        .zip(seq.iter().rev())
        .all(|(a, b)| a.is_standard() && *a == b.complement())
}

/// Température de fusion (°C); `None` si la séquence contient la sentinelle
/// de masquage ou moins de deux bases.
pub fn melting_temperature(seq: &[IupacBase], conditions: &ThermoConditions) -> Option<f64> {
    if seq.len() < 2 || seq.iter().any(|b| b.is_mask()) {
        return None;
    }

    let first = terminal_initiation(seq[0]);
    let last = terminal_initiation(seq[seq.len() - 1]);
    let mut dh = first.dh + last.dh;
    let mut ds = first.ds + last.ds;

    // Les dinucléotides ambigus ne contribuent pas
    for pair in seq.windows(2) {
        if let Some(p) = nn_params(pair[0], pair[1]) {
            dh += p.dh;
            ds += p.ds;
        }
    }

    let self_comp = is_self_complementary(seq);
    if self_comp {
        ds += -1.4;
    }

    let na_eq = conditions.sodium_equivalent() / 1000.0;
    ds += 0.368 * (seq.len() as f64 - 1.0) * na_eq.ln();

    let ct = conditions.dna_conc * 1e-9;
    let ct_term = if self_comp { ct } else { ct / 4.0 };
    Some(1000.0 * dh / (ds + GAS_CONSTANT * ct_term.ln()) - KELVIN)
}

/// Contenu GC en pourcentage (0-100)
pub fn gc_percent(seq: &[IupacBase]) -> f64 {
    if seq.is_empty() {
        return 0.0;
    }
    let gc = seq.iter().filter(|b| b.is_gc()).count();
    100.0 * gc as f64 / seq.len() as f64
}

/// Trouve la longueur maximale d'homopolymer dans une séquence
pub fn max_homopolymer(seq: &[IupacBase]) -> usize {
    if seq.is_empty() {
        return 0;
    }

    let mut max_run = 1;
    let mut current_run = 1;

    for window in seq.windows(2) {
        if window[0] == window[1] {
            current_run += 1;
            max_run = max_run.max(current_run);
        } else {
            current_run = 1;
        }
    }

    max_run
}

/// Nombre de G/C parmi les cinq dernières bases (extrémité 3')
pub fn three_prime_gc(seq: &[IupacBase]) -> usize {
    let start = seq.len().saturating_sub(THREE_PRIME_WINDOW);
    seq[start..].iter().filter(|b| b.is_gc()).count()
}

/// Stabilité de l'extrémité 3': -ΔG37 (kcal/mol) des cinq dernières bases
pub fn three_prime_stability(seq: &[IupacBase]) -> f64 {
    let start = seq.len().saturating_sub(THREE_PRIME_WINDOW);
    let t = 37.0 + KELVIN;
    -seq[start..]
        .windows(2)
        .filter_map(|pair| nn_params(pair[0], pair[1]))
        .map(|p| p.dh - t * p.ds / 1000.0)
        .sum::<f64>()
}

/// Profil complet d'un oligo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OligoProfile {
    pub tm: f64,
    pub gc_percent: f64,
    pub homopolymer_len: usize,
    pub three_prime_gc: usize,
    pub three_prime_stability: f64,
    /// Bases ambiguës (hors sentinelle)
    pub ambiguous: usize,
}

/// Calculateur de profils pour des conditions de réaction fixées
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermoScorer {
    conditions: ThermoConditions,
}

impl ThermoScorer {
    pub fn new(conditions: ThermoConditions) -> Self {
        Self { conditions }
    }

    /// Profil d'un oligo. Une sentinelle de masquage rend le profil
    /// indisponible: un oligo couvrant une position masquée n'est jamais valide.
    pub fn profile(&self, seq: &[IupacBase]) -> Option<OligoProfile> {
        if seq.iter().any(|b| b.is_mask()) {
            return None;
        }
        let tm = melting_temperature(seq, &self.conditions)?;
        Some(OligoProfile {
            tm,
            gc_percent: gc_percent(seq),
            homopolymer_len: max_homopolymer(seq),
            three_prime_gc: three_prime_gc(seq),
            three_prime_stability: three_prime_stability(seq),
            ambiguous: seq.iter().filter(|b| !b.is_standard()).count(),
        })
    }
}
