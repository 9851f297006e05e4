//! Validation hors-cible (PCR in silico)
//!
//! Chaque amorce distincte d'un lot est recherchée dans tout le génome.
//! Les hits sens et anti-sens des deux amorces sont combinés en amplicons
//! génomiques; une paire n'est retenue que si elle en produit au moins un
//! et au plus `max_amplicons`.

pub mod seed_index;

pub use seed_index::SeedIndex;

use crate::constraints::OffTargetConfig;
use crate::design::PrimerPair;
use crate::sequence::{parse_bases, IupacBase, Strand};
use lru::LruCache;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Locus génomique où une amorce s'hybride
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentHit {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    /// Brin de la référence auquel la séquence de l'amorce est identique
    pub strand: Strand,
    pub mismatches: usize,
    pub evalue: f64,
}

impl AlignmentHit {
    fn locus(&self) -> (&str, u64, u64, Strand) {
        (&self.chrom, self.start, self.end, self.strand)
    }
}

/// Résultat de la recherche d'une amorce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "hits", rename_all = "snake_case")]
pub enum HitSearch {
    Hits(Vec<AlignmentHit>),
    /// Plafond `max_hits` dépassé par les hits ou par une graine 3': l'amorce échoue
    TooMany(usize),
}

impl HitSearch {
    pub fn hits(&self) -> &[AlignmentHit] {
        match self {
            HitSearch::Hits(hits) => hits,
            HitSearch::TooMany(_) => &[],
        }
    }
}

/// Moteur d'alignement graine-extension consulté par le validateur
pub trait HitFinder: Send + Sync {
    fn find_hits(&self, primer: &[IupacBase], config: &OffTargetConfig) -> HitSearch;
}

/// Produit génomique d'une paire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomicAmplicon {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    /// Hit orienté vers l'aval (brin plus)
    pub forward_hit: AlignmentHit,
    /// Hit orienté vers l'amont (brin moins)
    pub reverse_hit: AlignmentHit,
}

impl GenomicAmplicon {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Paire acceptée et ses amplicons génomiques
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedPair {
    pub pair: PrimerPair,
    pub amplicons: Vec<GenomicAmplicon>,
}

/// Combine les hits des deux amorces, chacune pouvant jouer l'un ou l'autre rôle
pub fn genomic_amplicons(
    forward_hits: &[AlignmentHit],
    reverse_hits: &[AlignmentHit],
    max_len: u64,
) -> Vec<GenomicAmplicon> {
    let mut hits: Vec<&AlignmentHit> = forward_hits.iter().chain(reverse_hits).collect();
    hits.sort_by(|a, b| a.locus().cmp(&b.locus()));
    hits.dedup_by(|a, b| a.locus() == b.locus());

    let (plus, minus): (Vec<&AlignmentHit>, Vec<&AlignmentHit>) =
        hits.into_iter().partition(|h| h.strand == Strand::Plus);

    let mut amplicons = Vec::new();
    for p in &plus {
        for q in minus.iter().filter(|q| q.chrom == p.chrom && q.start >= p.start) {
            if q.end > p.end && q.end - p.start <= max_len {
                amplicons.push(GenomicAmplicon {
                    chrom: p.chrom.clone(),
                    start: p.start,
                    end: q.end,
                    forward_hit: (*p).clone(),
                    reverse_hit: (*q).clone(),
                });
            }
        }
    }
    amplicons
}

/// Cache LRU des recherches par séquence d'amorce
pub struct HitCache {
    cache: Mutex<LruCache<String, Arc<HitSearch>>>,
}

impl HitCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn insert(&self, key: String, value: Arc<HitSearch>) {
        self.cache.lock().put(key, value);
    }

    pub fn get(&self, key: &str) -> Option<Arc<HitSearch>> {
        self.cache.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

/// Résultat de la validation d'un lot
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub accepted: Vec<ValidatedPair>,
    /// Hits des amorces des paires acceptées
    pub alignments: BTreeMap<String, Vec<AlignmentHit>>,
}

/// Validateur hors-cible
pub struct OffTargetValidator {
    finder: Arc<dyn HitFinder>,
    config: OffTargetConfig,
    cache: HitCache,
}

impl OffTargetValidator {
    pub fn new(finder: Arc<dyn HitFinder>, config: OffTargetConfig) -> Self {
        Self {
            finder,
            config,
            cache: HitCache::new(1024),
        }
    }

    pub fn config(&self) -> &OffTargetConfig {
        &self.config
    }

    pub fn cache(&self) -> &HitCache {
        &self.cache
    }

    fn search(&self, primer: &str) -> Arc<HitSearch> {
        if let Some(found) = self.cache.get(primer) {
            return found;
        }
        let result = match parse_bases(primer) {
            Ok(bases) => self.finder.find_hits(&bases, &self.config),
            Err(_) => HitSearch::Hits(Vec::new()),
        };
        let result = Arc::new(result);
        self.cache.insert(primer.to_string(), result.clone());
        result
    }

    /// Valide un lot; `designed_span` donne l'étendue génomique prévue d'une
    /// paire, qui relève la borne de longueur des amplicons génomiques.
    pub fn validate<F>(&self, batch: &[PrimerPair], designed_span: F) -> BatchOutcome
    where
        F: Fn(&PrimerPair) -> u64,
    {
        let distinct: BTreeSet<&str> = batch
            .iter()
            .flat_map(|p| [p.forward.sequence.as_str(), p.reverse.sequence.as_str()])
            .collect();
        let searches: HashMap<&str, Arc<HitSearch>> = distinct
            .into_par_iter()
            .map(|seq| (seq, self.search(seq)))
            .collect();

        let mut outcome = BatchOutcome::default();
        for pair in batch {
            let forward = &searches[pair.forward.sequence.as_str()];
            let reverse = &searches[pair.reverse.sequence.as_str()];

            let (HitSearch::Hits(fwd_hits), HitSearch::Hits(rev_hits)) = (&**forward, &**reverse)
            else {
                debug!(
                    "Paire {}/{} rejetée: amorce non spécifique",
                    pair.forward.sequence, pair.reverse.sequence
                );
                continue;
            };

            let bound = self.config.max_amplicon_len.max(designed_span(pair));
            let amplicons = genomic_amplicons(fwd_hits, rev_hits, bound);
            if amplicons.is_empty() || amplicons.len() > self.config.max_amplicons {
                debug!(
                    "Paire {}/{} rejetée: {} amplicons génomiques",
                    pair.forward.sequence,
                    pair.reverse.sequence,
                    amplicons.len()
                );
                continue;
            }

            outcome
                .alignments
                .insert(pair.forward.sequence.clone(), fwd_hits.clone());
            outcome
                .alignments
                .insert(pair.reverse.sequence.clone(), rev_hits.clone());
            outcome.accepted.push(ValidatedPair {
                pair: pair.clone(),
                amplicons,
            });
        }
        outcome
    }
}
