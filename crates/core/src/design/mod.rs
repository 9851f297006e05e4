//! Moteur de génération des amorces candidates
//!
//! Chaque sous-séquence de longueur admissible donne une amorce sens et,
//! par complément inverse, une amorce anti-sens. Les paires sont émises
//! par lots, dans l'ordre croissant de pénalité, sans matérialiser
//! l'espace complet des combinaisons.

pub mod template;

pub use template::{DesignTemplate, PlacementRules};

use crate::constraints::Constraints;
use crate::sequence::{bases_to_string, reverse_complement, IupacBase, Strand};
use crate::thermo::ThermoScorer;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

/// Amorce candidate. L'identité est `(sequence, window_start, window_end, strand)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimerCandidate {
    /// Séquence 5' -> 3'
    pub sequence: String,
    pub strand: Strand,
    /// Empreinte `[window_start, window_end)` sur la séquence de design
    pub window_start: usize,
    pub window_end: usize,
    pub tm: f64,
    pub gc_percent: f64,
    pub homopolymer_len: usize,
    pub three_prime_gc: usize,
    pub three_prime_stability: f64,
    pub penalty: f64,
}

impl PrimerCandidate {
    pub fn len(&self) -> usize {
        self.window_end - self.window_start
    }

    pub fn is_empty(&self) -> bool {
        self.window_end <= self.window_start
    }

    fn identity(&self) -> (&str, usize, usize, Strand) {
        (&self.sequence, self.window_start, self.window_end, self.strand)
    }
}

impl PartialEq for PrimerCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for PrimerCandidate {}

impl Hash for PrimerCandidate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// Paire d'amorces; deux paires sont égales si leurs deux amorces le sont
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimerPair {
    pub forward: PrimerCandidate,
    pub reverse: PrimerCandidate,
    pub amplicon_len: usize,
    pub pair_penalty: f64,
}

impl PrimerPair {
    pub fn new(forward: PrimerCandidate, reverse: PrimerCandidate, amplicon_len: usize) -> Self {
        let pair_penalty = forward.penalty + reverse.penalty;
        Self {
            forward,
            reverse,
            amplicon_len,
            pair_penalty,
        }
    }
}

impl PartialEq for PrimerPair {
    fn eq(&self, other: &Self) -> bool {
        self.forward == other.forward && self.reverse == other.reverse
    }
}

impl Eq for PrimerPair {}

impl Hash for PrimerPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.forward.hash(state);
        self.reverse.hash(state);
    }
}

/// Évalue toutes les sous-séquences admissibles. Les deux listes sont
/// triées par `(pénalité, début, fin)`.
pub fn score_candidates(
    sequence: &[IupacBase],
    constraints: &Constraints,
) -> (Vec<PrimerCandidate>, Vec<PrimerCandidate>) {
    let scorer = ThermoScorer::new(constraints.thermo);
    let n = sequence.len();

    let per_start: Vec<(Vec<PrimerCandidate>, Vec<PrimerCandidate>)> = (0..n)
        .into_par_iter()
        .map(|start| {
            let mut forward = Vec::new();
            let mut reverse = Vec::new();
            for len in constraints.size_min..=constraints.size_max {
                let end = start + len;
                if end > n {
                    break;
                }
                let fragment = &sequence[start..end];
                // Toute extension contiendra aussi la sentinelle
                if fragment.iter().any(|b| b.is_mask()) {
                    break;
                }

                if let Some(profile) = scorer.profile(fragment) {
                    if constraints.accepts(&profile) {
                        forward.push(PrimerCandidate {
                            sequence: bases_to_string(fragment),
                            strand: Strand::Plus,
                            window_start: start,
                            window_end: end,
                            tm: profile.tm,
                            gc_percent: profile.gc_percent,
                            homopolymer_len: profile.homopolymer_len,
                            three_prime_gc: profile.three_prime_gc,
                            three_prime_stability: profile.three_prime_stability,
                            penalty: constraints.penalty(len, &profile),
                        });
                    }
                }

                let rc = reverse_complement(fragment);
                if let Some(profile) = scorer.profile(&rc) {
                    if constraints.accepts(&profile) {
                        reverse.push(PrimerCandidate {
                            sequence: bases_to_string(&rc),
                            strand: Strand::Minus,
                            window_start: start,
                            window_end: end,
                            tm: profile.tm,
                            gc_percent: profile.gc_percent,
                            homopolymer_len: profile.homopolymer_len,
                            three_prime_gc: profile.three_prime_gc,
                            three_prime_stability: profile.three_prime_stability,
                            penalty: constraints.penalty(len, &profile),
                        });
                    }
                }
            }
            (forward, reverse)
        })
        .collect();

    let (forward, reverse): (Vec<_>, Vec<_>) = per_start.into_iter().unzip();
    let mut forward: Vec<PrimerCandidate> = forward.into_iter().flatten().collect();
    let mut reverse: Vec<PrimerCandidate> = reverse.into_iter().flatten().collect();
    forward.sort_by(candidate_order);
    reverse.sort_by(candidate_order);
    (forward, reverse)
}

fn candidate_order(a: &PrimerCandidate, b: &PrimerCandidate) -> Ordering {
    a.penalty
        .total_cmp(&b.penalty)
        .then(a.window_start.cmp(&b.window_start))
        .then(a.window_end.cmp(&b.window_end))
}

/// Curseur d'une amorce sens dans la liste triée des amorces anti-sens
#[derive(Debug, Clone, Copy)]
struct Frontier {
    penalty: f64,
    forward: usize,
    reverse: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    // Inversé: le tas binaire rend la plus petite pénalité
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .penalty
            .total_cmp(&self.penalty)
            .then(other.forward.cmp(&self.forward))
            .then(other.reverse.cmp(&self.reverse))
    }
}

/// Générateur paresseux de lots de paires, par pénalité croissante
pub struct CandidateEngine {
    forward: Vec<PrimerCandidate>,
    reverse: Vec<PrimerCandidate>,
    constraints: Constraints,
    rules: PlacementRules,
    excluded: HashSet<PrimerPair>,
    frontier: BinaryHeap<Frontier>,
    started: bool,
}

impl CandidateEngine {
    /// Prépare le moteur sur une séquence (éventuellement masquée)
    pub fn new(
        sequence: &[IupacBase],
        constraints: &Constraints,
        rules: PlacementRules,
        excluded: HashSet<PrimerPair>,
    ) -> Self {
        if !constraints.is_consistent() {
            warn!("Contraintes incohérentes, aucune amorce ne peut être produite");
        }
        let (forward, reverse) = if constraints.is_consistent() {
            score_candidates(sequence, constraints)
        } else {
            (Vec::new(), Vec::new())
        };
        debug!(
            "{} amorces sens, {} amorces anti-sens valides",
            forward.len(),
            reverse.len()
        );

        Self {
            forward,
            reverse,
            constraints: constraints.clone(),
            rules,
            excluded,
            frontier: BinaryHeap::new(),
            started: false,
        }
    }

    /// Repart du début de l'ordre de pénalité
    pub fn restart(&mut self) {
        self.frontier.clear();
        self.started = false;
    }

    fn next_compatible(&self, forward: usize, from: usize) -> Option<Frontier> {
        let f = &self.forward[forward];
        self.reverse[from..]
            .iter()
            .position(|r| self.rules.admits(f, r, &self.constraints).is_some())
            .map(|offset| Frontier {
                penalty: f.penalty + self.reverse[from + offset].penalty,
                forward,
                reverse: from + offset,
            })
    }

    fn start(&mut self) {
        let seeds: Vec<Frontier> = (0..self.forward.len())
            .into_par_iter()
            .filter_map(|i| self.next_compatible(i, 0))
            .collect();
        self.frontier = seeds.into_iter().collect();
        self.started = true;
    }

    /// Lot suivant de `batch_size` paires au plus; `None` une fois épuisé
    pub fn next_batch(&mut self) -> Option<Vec<PrimerPair>> {
        if !self.started {
            self.start();
        }

        let batch_size = self.constraints.batch_size.max(1);
        let mut batch = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            let Some(entry) = self.frontier.pop() else {
                break;
            };
            if let Some(next) = self.next_compatible(entry.forward, entry.reverse + 1) {
                self.frontier.push(next);
            }

            let forward = &self.forward[entry.forward];
            let reverse = &self.reverse[entry.reverse];
            let Some(amplicon_len) = self.rules.admits(forward, reverse, &self.constraints) else {
                continue;
            };
            let pair = PrimerPair::new(forward.clone(), reverse.clone(), amplicon_len);
            if self.excluded.contains(&pair) {
                continue;
            }
            batch.push(pair);
        }

        (!batch.is_empty()).then_some(batch)
    }
}

impl Iterator for CandidateEngine {
    type Item = Vec<PrimerPair>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch()
    }
}
