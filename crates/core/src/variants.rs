//! Annotation des variants de population et masquage des positions

use crate::error::Result;
use crate::providers::{VariantRecord, VariantSource};
use crate::sequence::{GenomicWindow, PositionMask};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Seuils de masquage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariantFilter {
    pub frequency_threshold: f64,
    pub min_source_count: usize,
    /// Au-delà, l'allèle de référence n'est pas masqué
    pub max_ref_len: usize,
}

impl Default for VariantFilter {
    fn default() -> Self {
        Self {
            frequency_threshold: 0.0,
            min_source_count: 2,
            max_ref_len: 10,
        }
    }
}

/// Allèle retenu, avec les sources qui le rapportent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedVariant {
    pub record: VariantRecord,
    pub sources: Vec<String>,
    /// Faux pour les indels trop longs, laissés aux contrôles d'amplicon
    pub masked: bool,
}

impl AnnotatedVariant {
    pub fn overlaps(&self, chrom: &str, start: u64, end: u64) -> bool {
        self.record.overlaps(chrom, start, end)
    }
}

/// Résultat de l'annotation d'une fenêtre
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantAnnotation {
    pub mask: PositionMask,
    pub variants: Vec<AnnotatedVariant>,
}

/// Interroge chaque source sur la fenêtre et masque les positions
/// rapportées par assez de sources avec une fréquence suffisante.
///
/// Les sources sont comptées par site, tous allèles confondus: G>A dans
/// une base et G>T dans une autre font deux sources pour la position.
pub fn annotate(
    window: &GenomicWindow,
    sources: &[&dyn VariantSource],
    filter: &VariantFilter,
) -> Result<VariantAnnotation> {
    let span = window.span();
    // Avec une seule source configurée, elle suffit
    let required = filter.min_source_count.min(sources.len()).max(1);

    let mut by_allele: BTreeMap<(u64, String, String), AnnotatedVariant> = BTreeMap::new();
    let mut site_sources: BTreeMap<u64, BTreeSet<String>> = BTreeMap::new();
    for source in sources {
        let records = source.overlapping(&span.chrom, span.start, span.end)?;
        debug!("{}: {} variants dans la fenêtre", source.name(), records.len());

        for record in records
            .into_iter()
            .filter(|r| r.frequency >= filter.frequency_threshold)
        {
            site_sources
                .entry(record.position)
                .or_default()
                .insert(source.name().to_string());

            let key = (record.position, record.reference.clone(), record.alternate.clone());
            let entry = by_allele.entry(key).or_insert_with(|| AnnotatedVariant {
                record: record.clone(),
                sources: Vec::new(),
                masked: false,
            });
            if !entry.sources.iter().any(|s| s == source.name()) {
                entry.sources.push(source.name().to_string());
            }
            entry.record.frequency = entry.record.frequency.max(record.frequency);
        }
    }

    let mut mask = PositionMask::new();
    let mut variants = Vec::new();
    for ((position, _, _), mut variant) in by_allele {
        if site_sources.get(&position).map_or(0, BTreeSet::len) < required {
            continue;
        }
        if variant.record.reference.len() <= filter.max_ref_len {
            if let Some(range) = window.relative_range(variant.record.position, variant.record.end()) {
                mask.insert_range(range);
                variant.masked = true;
            }
        }
        variants.push(variant);
    }

    info!(
        "{} variants retenus, {} positions masquées",
        variants.len(),
        mask.len()
    );

    Ok(VariantAnnotation { mask, variants })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::InMemoryVariantSource;
    use crate::sequence::{parse_bases, Strand};

    fn record(pos: u64, reference: &str, frequency: f64) -> VariantRecord {
        allele(pos, reference, "A", frequency)
    }

    fn allele(pos: u64, reference: &str, alternate: &str, frequency: f64) -> VariantRecord {
        VariantRecord {
            chrom: "chr1".to_string(),
            position: pos,
            reference: reference.to_string(),
            alternate: alternate.to_string(),
            frequency,
            id: None,
        }
    }

    fn window() -> GenomicWindow {
        GenomicWindow::new("chr1", Strand::Plus, 100, parse_bases(&"ACGT".repeat(25)).unwrap())
            .unwrap()
    }

    #[test]
    fn test_position_requires_enough_sources() {
        let a = InMemoryVariantSource::new("dbSNP", vec![record(110, "G", 0.2), record(120, "C", 0.3)]);
        let b = InMemoryVariantSource::new("gnomAD", vec![record(110, "G", 0.25)]);
        let filter = VariantFilter::default();

        let result = annotate(&window(), &[&a, &b], &filter).unwrap();
        assert_eq!(result.mask.iter().collect::<Vec<_>>(), vec![10]);
        assert_eq!(result.variants.len(), 1);
        assert_eq!(result.variants[0].sources, vec!["dbSNP", "gnomAD"]);
    }

    #[test]
    fn test_sources_count_per_site_across_alleles() {
        let a = InMemoryVariantSource::new("dbSNP", vec![allele(110, "G", "A", 0.3)]);
        let b = InMemoryVariantSource::new("gnomAD", vec![allele(110, "G", "T", 0.3)]);

        let result = annotate(&window(), &[&a, &b], &VariantFilter::default()).unwrap();
        assert_eq!(result.mask.iter().collect::<Vec<_>>(), vec![10]);

        // Chaque allèle reste décrit avec sa propre source
        let alleles: Vec<(&str, &[String])> = result
            .variants
            .iter()
            .map(|v| (v.record.alternate.as_str(), v.sources.as_slice()))
            .collect();
        assert_eq!(
            alleles,
            vec![("A", &["dbSNP".to_string()][..]), ("T", &["gnomAD".to_string()][..])]
        );
        assert!(result.variants.iter().all(|v| v.masked));
    }

    #[test]
    fn test_rare_allele_does_not_count_for_its_site() {
        let a = InMemoryVariantSource::new("dbSNP", vec![allele(110, "G", "A", 0.3)]);
        let b = InMemoryVariantSource::new("gnomAD", vec![allele(110, "G", "T", 0.001)]);
        let filter = VariantFilter {
            frequency_threshold: 0.01,
            ..VariantFilter::default()
        };

        let result = annotate(&window(), &[&a, &b], &filter).unwrap();
        assert!(result.mask.is_empty());
        assert!(result.variants.is_empty());
    }

    #[test]
    fn test_single_source_is_sufficient_alone() {
        let a = InMemoryVariantSource::new("dbSNP", vec![record(110, "G", 0.2)]);
        let result = annotate(&window(), &[&a], &VariantFilter::default()).unwrap();
        assert!(result.mask.contains(10));
    }

    #[test]
    fn test_frequency_threshold_and_long_indels() {
        let a = InMemoryVariantSource::new(
            "dbSNP",
            vec![record(110, "G", 0.001), record(130, "ACGTACGTACGTA", 0.4), record(150, "GCA", 0.4)],
        );
        let filter = VariantFilter {
            frequency_threshold: 0.01,
            min_source_count: 1,
            max_ref_len: 10,
        };
        let result = annotate(&window(), &[&a], &filter).unwrap();

        assert!(!result.mask.contains(10));
        assert!(!result.mask.contains(30));
        assert_eq!(result.mask.ranges(), vec![50..53]);
        // L'indel long est conservé comme métadonnée sans être masqué
        assert_eq!(result.variants.len(), 2);
        assert!(!result.variants[0].masked);
        assert!(result.variants[1].masked);
    }

    #[test]
    fn test_overlapping_spans_merge() {
        let a = InMemoryVariantSource::new("dbSNP", vec![record(140, "GCAT", 0.1), record(142, "AT", 0.1)]);
        let result = annotate(&window(), &[&a], &VariantFilter::default()).unwrap();
        assert_eq!(result.mask.ranges(), vec![40..44]);
    }
}
