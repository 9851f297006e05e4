//! Recherche par graines et extension sans gap sur le génome de référence
//!
//! L'index est un tableau trié d'entrées `(k-mer << bits) | position`, sur
//! 8 octets chacune. Seule une position sur `stride` est indexée, avec
//! `stride = min_3prime_matches - word_size + 1`: la queue 3' exacte
//! exigée de tout hit contient toujours une graine indexée.

use crate::constraints::OffTargetConfig;
use crate::offtarget::{AlignmentHit, HitFinder, HitSearch};
use crate::providers::ReferenceGenome;
use crate::sequence::{reverse_complement, IupacBase, Strand};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Paramètres de Karlin-Altschul pour un score +1/-3 (blastn-short)
const LAMBDA: f64 = 1.374;
const KAPPA: f64 = 0.711;
const MATCH_SCORE: i64 = 1;
const MISMATCH_SCORE: i64 = -3;
const MAX_WORD_SIZE: usize = 31;

fn encode(base: IupacBase) -> Option<u64> {
    match base {
        IupacBase::A => Some(0),
        IupacBase::C => Some(1),
        IupacBase::G => Some(2),
        IupacBase::T => Some(3),
        _ => None,
    }
}

fn encode_word(word: &[IupacBase]) -> Option<u64> {
    word.iter()
        .try_fold(0u64, |acc, &b| encode(b).map(|code| (acc << 2) | code))
}

/// Pas d'échantillonnage garantissant une graine dans la queue 3' exacte
fn sampling_stride(word_size: usize, min_3prime_matches: usize) -> usize {
    (min_3prime_matches + 1).saturating_sub(word_size).max(1)
}

/// Index échantillonné des k-mers de tout le génome
pub struct SeedIndex {
    genome: Arc<dyn ReferenceGenome>,
    chroms: Vec<String>,
    /// Décalage global du début de chaque chromosome
    chrom_starts: Vec<u64>,
    word_size: usize,
    stride: usize,
    position_bits: u32,
    position_mask: u64,
    entries: Vec<u64>,
    search_space: u64,
}

impl SeedIndex {
    /// Indexe les k-mers sans base ambiguë dont la position est multiple
    /// du pas d'échantillonnage
    pub fn build(genome: Arc<dyn ReferenceGenome>, config: &OffTargetConfig) -> Self {
        let chromosomes = genome.chromosomes();
        let search_space: u64 = chromosomes.iter().map(|(_, len)| *len).sum();

        // Le k-mer et la position doivent tenir ensemble sur 64 bits
        let position_bits = (u64::BITS - search_space.leading_zeros()).max(1);
        let max_word = (((u64::BITS - position_bits) / 2) as usize).clamp(1, MAX_WORD_SIZE);
        let word_size = config.word_size.clamp(1, max_word);
        if word_size != config.word_size {
            warn!("Taille de graine ramenée de {} à {}", config.word_size, word_size);
        }
        let stride = sampling_stride(word_size, config.min_3prime_matches);
        let position_mask = u64::MAX >> (u64::BITS - position_bits);

        let mut chrom_starts = Vec::with_capacity(chromosomes.len());
        let mut origin = 0u64;
        for (_, len) in &chromosomes {
            chrom_starts.push(origin);
            origin += len;
        }
        let chroms: Vec<String> = chromosomes.into_iter().map(|(n, _)| n).collect();

        let kmer_mask = (1u64 << (2 * word_size)) - 1;
        let mut entries: Vec<u64> = chroms
            .par_iter()
            .zip(chrom_starts.par_iter())
            .flat_map_iter(|(name, &origin)| {
                let Some(seq) = genome.raw(name) else {
                    return Vec::new();
                };
                let mut local = Vec::with_capacity(seq.len() / stride + 1);
                let mut code = 0u64;
                let mut valid = 0usize;
                for (i, &base) in seq.iter().enumerate() {
                    match encode(base) {
                        Some(c) => {
                            code = ((code << 2) | c) & kmer_mask;
                            valid += 1;
                        }
                        None => valid = 0,
                    }
                    if valid >= word_size {
                        let start = i + 1 - word_size;
                        if start % stride == 0 {
                            local.push((code << position_bits) | (origin + start as u64));
                        }
                    }
                }
                local
            })
            .collect();
        entries.par_sort_unstable();

        info!(
            "Index de graines: {} entrées (k = {}, pas {}), {} pb, {} Mo",
            entries.len(),
            word_size,
            stride,
            search_space,
            entries.len() * std::mem::size_of::<u64>() / (1 << 20)
        );

        Self {
            genome,
            chroms,
            chrom_starts,
            word_size,
            stride,
            position_bits,
            position_mask,
            entries,
            search_space,
        }
    }

    /// E-value d'un score de segment local
    fn evalue(&self, query_len: usize, score: i64) -> f64 {
        KAPPA * query_len as f64 * self.search_space as f64 * (-LAMBDA * score as f64).exp()
    }

    /// Entrées indexées d'un k-mer
    fn occurrences(&self, code: u64) -> &[u64] {
        let bits = self.position_bits;
        let lo = self.entries.partition_point(|&e| e >> bits < code);
        let len = self.entries[lo..].partition_point(|&e| e >> bits == code);
        &self.entries[lo..lo + len]
    }

    /// Chromosome et position relative d'une position globale
    fn locate(&self, global: u64) -> (usize, u64) {
        let ci = self.chrom_starts.partition_point(|&s| s <= global) - 1;
        (ci, global - self.chrom_starts[ci])
    }

    /// Compare l'amorce au segment du brin plus, lu dans l'orientation de
    /// l'amorce pour un hit sur le brin moins
    fn extend(
        &self,
        primer: &[IupacBase],
        segment: &[IupacBase],
        strand: Strand,
        config: &OffTargetConfig,
    ) -> Option<(usize, f64)> {
        let m = primer.len();
        let matches = |j: usize| {
            let target = match strand {
                Strand::Plus => segment[j],
                Strand::Minus => segment[m - 1 - j].complement(),
            };
            primer[j].is_standard() && primer[j] == target
        };

        let tail = config.min_3prime_matches.min(m);
        if !(m - tail..m).all(&matches) {
            return None;
        }

        let mut best = 0i64;
        let mut running = 0i64;
        let mut mismatches = 0usize;
        for j in 0..m {
            let score = if matches(j) {
                MATCH_SCORE
            } else {
                mismatches += 1;
                MISMATCH_SCORE
            };
            running = (running + score).max(0);
            best = best.max(running);
        }

        let evalue = self.evalue(m, best);
        (evalue <= config.max_evalue).then_some((mismatches, evalue))
    }
}

impl HitFinder for SeedIndex {
    fn find_hits(&self, primer: &[IupacBase], config: &OffTargetConfig) -> HitSearch {
        let k = self.word_size;
        let m = primer.len();
        let mut hits = Vec::new();
        if m < k {
            return HitSearch::Hits(hits);
        }
        let tail = config.min_3prime_matches.min(m);
        let tail_seeds = tail + 1 >= k + self.stride;

        for strand in [Strand::Plus, Strand::Minus] {
            let query = match strand {
                Strand::Plus => primer.to_vec(),
                Strand::Minus => reverse_complement(primer),
            };
            // La queue 3' de l'amorce est en fin de requête sur le brin plus,
            // en début sur le brin moins
            let offsets = match (tail_seeds, strand) {
                (true, Strand::Plus) => m - tail..=m - k,
                (true, Strand::Minus) => 0..=tail - k,
                (false, _) => 0..=m - k,
            };
            let mut diagonals: HashSet<(usize, u64)> = HashSet::new();

            for offset in offsets {
                let Some(code) = encode_word(&query[offset..offset + k]) else {
                    continue;
                };
                let occurrences = self.occurrences(code);
                if tail_seeds && occurrences.len() > config.max_hits {
                    debug!(
                        "Amorce non spécifique: graine 3' présente {} fois",
                        occurrences.len()
                    );
                    return HitSearch::TooMany(occurrences.len());
                }

                for &entry in occurrences {
                    let (ci, pos) = self.locate(entry & self.position_mask);
                    let Some(start) = pos.checked_sub(offset as u64) else {
                        continue;
                    };
                    if !diagonals.insert((ci, start)) {
                        continue;
                    }
                    let chrom = &self.chroms[ci];
                    let Some(seq) = self.genome.raw(chrom) else {
                        continue;
                    };
                    let end = start + m as u64;
                    if end > seq.len() as u64 {
                        continue;
                    }
                    let segment = &seq[start as usize..end as usize];

                    if let Some((mismatches, evalue)) = self.extend(primer, segment, strand, config) {
                        hits.push(AlignmentHit {
                            chrom: chrom.clone(),
                            start,
                            end,
                            strand,
                            mismatches,
                            evalue,
                        });
                        if hits.len() > config.max_hits {
                            debug!("Amorce non spécifique: plus de {} hits", config.max_hits);
                            return HitSearch::TooMany(hits.len());
                        }
                    }
                }
            }
        }

        hits.sort_by(|a, b| (&a.chrom, a.start, a.strand).cmp(&(&b.chrom, b.start, b.strand)));
        HitSearch::Hits(hits)
    }
}
