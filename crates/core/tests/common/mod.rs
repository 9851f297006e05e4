//! Génome synthétique partagé par les tests d'intégration

#![allow(dead_code)]

use amorce_core::{
    Exon, InMemoryGenome, InMemoryVariantSource, IupacBase, PrimerDesigner, Settings, Strand,
    TranscriptCatalog, TranscriptId, TranscriptModel, VariantRecord,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Exons du transcrit NM_000546.6 sur chr1 (brin plus), dans l'ordre du transcrit
pub const PLUS_EXONS: [(u64, u64); 8] = [
    (5000, 5200),
    (7000, 7200),
    (9000, 9200),
    (11000, 11300),
    (13000, 13250),
    (15000, 15200),
    (17000, 17250),
    (19000, 19200),
];

/// Exons de NM_000002.1 sur chr2 (brin moins), dans l'ordre du transcrit
pub const MINUS_EXONS: [(u64, u64); 3] = [(12000, 12300), (9000, 9300), (6000, 6300)];

/// Position génomique de NM_000546.6:c.215 (index 314 du transcrit, exon 2)
pub const SANGER_POSITION: u64 = 7114;

/// Région de chr1 recopiée sur chr2 pour rendre l'exon 4 non spécifique
pub const DUPLICATED: (u64, u64) = (10_800, 11_500);
pub const DUPLICATE_AT: u64 = 25_000;

pub fn random_bases(rng: &mut ChaCha8Rng, len: usize) -> Vec<IupacBase> {
    let alphabet = [IupacBase::A, IupacBase::C, IupacBase::G, IupacBase::T];
    (0..len).map(|_| alphabet[rng.gen_range(0..4)]).collect()
}

pub fn genome() -> InMemoryGenome {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let chr1 = random_bases(&mut rng, 24_000);
    let mut chr2 = random_bases(&mut rng, 30_000);

    let (start, end) = (DUPLICATED.0 as usize, DUPLICATED.1 as usize);
    let at = DUPLICATE_AT as usize;
    chr2[at..at + (end - start)].copy_from_slice(&chr1[start..end]);

    let mut genome = InMemoryGenome::new();
    genome.add_chromosome("chr1", chr1);
    genome.add_chromosome("chr2", chr2);
    genome
}

fn exons(spans: &[(u64, u64)]) -> Vec<Exon> {
    spans.iter().map(|&(start, end)| Exon { start, end }).collect()
}

pub fn catalog() -> TranscriptCatalog {
    let tp53 = TranscriptModel {
        id: TranscriptId::new("NM_000546", Some(6)),
        gene: "TP53".to_string(),
        chrom: "chr1".to_string(),
        strand: Strand::Plus,
        exons: exons(&PLUS_EXONS),
        cds_start: 100,
        cds_end: 1700,
    };
    let minus = TranscriptModel {
        id: TranscriptId::new("NM_000002", Some(1)),
        gene: "GENE2".to_string(),
        chrom: "chr2".to_string(),
        strand: Strand::Minus,
        exons: exons(&MINUS_EXONS),
        cds_start: 50,
        cds_end: 800,
    };
    vec![tp53, minus].into_iter().collect()
}

pub fn designer() -> PrimerDesigner {
    designer_with(Settings::default())
}

pub fn designer_with(settings: Settings) -> PrimerDesigner {
    let catalog = Arc::new(catalog());
    PrimerDesigner::new(settings, Arc::new(genome()), catalog.clone(), catalog)
}

/// Deux sources rapportant un SNP fréquent à `position` sur chr1
pub fn snp_sources(position: u64) -> (Arc<InMemoryVariantSource>, Arc<InMemoryVariantSource>) {
    let record = VariantRecord {
        chrom: "chr1".to_string(),
        position,
        reference: "A".to_string(),
        alternate: "G".to_string(),
        frequency: 0.3,
        id: Some("rs0001".to_string()),
    };
    (
        Arc::new(InMemoryVariantSource::new("dbSNP", vec![record.clone()])),
        Arc::new(InMemoryVariantSource::new("gnomAD", vec![record])),
    )
}
