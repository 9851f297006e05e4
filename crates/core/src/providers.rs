//! Collaborateurs externes du pipeline et leurs implémentations en mémoire

use crate::error::{PrimerError, Result};
use crate::hgvs::{TranscriptId, TranscriptVariant};
use crate::notice::Notice;
use crate::sequence::{reverse_complement, GenomicSpan, IupacBase, Strand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Traduction des coordonnées transcrit -> génome
pub trait CoordinateProvider: Send + Sync {
    /// Intervalle génomique d'un variant décrit en `c.`
    fn variant_span(&self, variant: &TranscriptVariant) -> Result<GenomicSpan>;

    /// Intervalle génomique d'un exon (numéroté à partir de 1)
    fn exon_span(&self, transcript: &TranscriptId, exon_index: usize) -> Result<GenomicSpan>;
}

/// Base d'annotation des gènes et exons
pub trait AnnotationStore: Send + Sync {
    /// Exons dans l'ordre du transcrit
    fn exons_of(&self, transcript: &TranscriptId) -> Result<Vec<GenomicSpan>>;

    /// Version courante d'un transcrit, avec un avertissement en cas de substitution
    fn resolve_current_version(
        &self,
        transcript: &TranscriptId,
    ) -> Result<(TranscriptId, Option<Notice>)>;

    fn gene_of(&self, _transcript: &TranscriptId) -> Option<String> {
        None
    }
}

/// Génome de référence
pub trait ReferenceGenome: Send + Sync {
    /// Sous-séquence `[start, end)`, complément inverse sur le brin moins
    fn substring(&self, chrom: &str, start: u64, end: u64, strand: Strand) -> Result<Vec<IupacBase>>;

    /// Noms et longueurs des séquences, dans l'ordre du fichier
    fn chromosomes(&self) -> Vec<(String, u64)>;

    /// Séquence complète du brin plus
    fn raw(&self, chrom: &str) -> Option<&[IupacBase]>;
}

/// Variant de population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub chrom: String,
    /// Position 0-based de la première base de l'allèle de référence
    pub position: u64,
    pub reference: String,
    pub alternate: String,
    pub frequency: f64,
    /// Identifiant de la base (rsID), s'il existe
    pub id: Option<String>,
}

impl VariantRecord {
    /// Fin génomique (exclusive) de l'allèle de référence
    pub fn end(&self) -> u64 {
        self.position + self.reference.len().max(1) as u64
    }

    pub fn overlaps(&self, chrom: &str, start: u64, end: u64) -> bool {
        self.chrom == chrom && self.position < end && start < self.end()
    }
}

/// Base de fréquences de variants
pub trait VariantSource: Send + Sync {
    fn name(&self) -> &str;

    /// Variants chevauchant `[start, end)`
    fn overlapping(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<VariantRecord>>;
}

/// Génome chargé en mémoire
#[derive(Debug, Clone, Default)]
pub struct InMemoryGenome {
    names: Vec<String>,
    sequences: HashMap<String, Vec<IupacBase>>,
}

impl InMemoryGenome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_chromosome(&mut self, name: impl Into<String>, sequence: Vec<IupacBase>) {
        let name = name.into();
        if self.sequences.insert(name.clone(), sequence).is_none() {
            self.names.push(name);
        }
    }

    /// Longueur totale du génome
    pub fn total_len(&self) -> u64 {
        self.sequences.values().map(|s| s.len() as u64).sum()
    }
}

impl ReferenceGenome for InMemoryGenome {
    fn substring(&self, chrom: &str, start: u64, end: u64, strand: Strand) -> Result<Vec<IupacBase>> {
        let seq = self
            .sequences
            .get(chrom)
            .ok_or_else(|| PrimerError::UnknownChromosome(chrom.to_string()))?;
        if start >= end || end > seq.len() as u64 {
            return Err(PrimerError::InvalidWindow {
                chrom: chrom.to_string(),
                start,
                end,
            });
        }
        let slice = &seq[start as usize..end as usize];
        Ok(match strand {
            Strand::Plus => slice.to_vec(),
            Strand::Minus => reverse_complement(slice),
        })
    }

    fn chromosomes(&self) -> Vec<(String, u64)> {
        self.names
            .iter()
            .map(|n| (n.clone(), self.sequences[n].len() as u64))
            .collect()
    }

    fn raw(&self, chrom: &str) -> Option<&[IupacBase]> {
        self.sequences.get(chrom).map(Vec::as_slice)
    }
}

/// Source de variants en mémoire
#[derive(Debug, Clone, Default)]
pub struct InMemoryVariantSource {
    name: String,
    records: Vec<VariantRecord>,
}

impl InMemoryVariantSource {
    pub fn new(name: impl Into<String>, mut records: Vec<VariantRecord>) -> Self {
        records.sort_by(|a, b| (&a.chrom, a.position).cmp(&(&b.chrom, b.position)));
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl VariantSource for InMemoryVariantSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn overlapping(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<VariantRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.overlaps(chrom, start, end))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{bases_to_string, parse_bases};

    #[test]
    fn test_genome_substring_strands() {
        let mut genome = InMemoryGenome::new();
        genome.add_chromosome("chr1", parse_bases("AACCGGTTAC").unwrap());

        let plus = genome.substring("chr1", 2, 6, Strand::Plus).unwrap();
        assert_eq!(bases_to_string(&plus), "CCGG");
        let minus = genome.substring("chr1", 0, 4, Strand::Minus).unwrap();
        assert_eq!(bases_to_string(&minus), "GGTT");

        assert!(matches!(
            genome.substring("chr2", 0, 4, Strand::Plus),
            Err(PrimerError::UnknownChromosome(_))
        ));
        assert!(genome.substring("chr1", 5, 20, Strand::Plus).is_err());
        assert_eq!(genome.chromosomes(), vec![("chr1".to_string(), 10)]);
    }

    #[test]
    fn test_variant_source_overlap() {
        let record = |pos: u64, reference: &str| VariantRecord {
            chrom: "chr1".to_string(),
            position: pos,
            reference: reference.to_string(),
            alternate: "A".to_string(),
            frequency: 0.1,
            id: None,
        };
        let source = InMemoryVariantSource::new("dbSNP", vec![record(50, "ACGT"), record(10, "G")]);

        let hits = source.overlapping("chr1", 52, 60).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].end(), 54);
        assert!(source.overlapping("chr1", 11, 50).unwrap().is_empty());
        assert!(source.overlapping("chr2", 0, 100).unwrap().is_empty());
    }
}
