//! Tests d'intégration du pipeline de design sur un génome synthétique

mod common;

use amorce_core::{
    Constraints, Method, Notice, PrimerError, ReportedPair, Settings, Strand,
};
use common::*;

fn locus_positions(pair: &ReportedPair) -> [(u64, u64); 2] {
    [
        (pair.forward_locus.start, pair.forward_locus.end),
        (pair.reverse_locus.start, pair.reverse_locus.end),
    ]
}

#[test]
fn test_sanger_variant_design() {
    let designer = designer();
    let report = designer
        .design_primers(Method::Sanger, "NM_000546.6:c.215C>G")
        .unwrap();

    assert_eq!(report.window.chrom, "chr1");
    assert_eq!((report.target.start, report.target.end), (SANGER_POSITION, SANGER_POSITION + 1));
    assert!(!report.pairs.is_empty());
    assert!(report.pairs.len() <= 10);
    assert!(report.stats.examined <= 100);
    assert!(report.notices.is_empty());

    let masked = (SANGER_POSITION - report.window.start) as usize;
    for reported in &report.pairs {
        let pair = &reported.pair;
        assert!(!(pair.forward.window_start..pair.forward.window_end).contains(&masked));
        assert!(!(pair.reverse.window_start..pair.reverse.window_end).contains(&masked));
        assert!((350..=600).contains(&pair.amplicon_len));

        // La zone de burn-in reste entre les amorces
        assert!(reported.forward_locus.end <= SANGER_POSITION - 30);
        assert!(reported.reverse_locus.start >= SANGER_POSITION + 31);
        assert_eq!(reported.forward_locus.strand, Strand::Plus);
        assert_eq!(reported.reverse_locus.strand, Strand::Minus);

        assert_eq!(reported.amplicons.len(), 1);
        let amplicon = &reported.amplicons[0];
        assert_eq!(amplicon.start, reported.forward_locus.start);
        assert_eq!(amplicon.end, reported.reverse_locus.end);
        assert_eq!(amplicon.len() as usize, pair.amplicon_len);
    }

    for w in report.pairs.windows(2) {
        assert!(w[0].pair.pair_penalty <= w[1].pair.pair_penalty);
    }
}

#[test]
fn test_sanger_on_minus_strand_transcript() {
    let designer = designer();
    let report = designer
        .design_primers(Method::Sanger, "NM_000002.1:c.100A>G")
        .unwrap();

    assert_eq!(report.window.strand, Strand::Minus);
    assert_eq!(report.target.start, 12_150);
    assert!(!report.pairs.is_empty());
    for reported in &report.pairs {
        // En orientation transcrit, l'amorce sens est en aval sur le génome
        assert_eq!(reported.forward_locus.strand, Strand::Minus);
        assert!(reported.forward_locus.start >= 12_151 + 30);
        assert!(reported.reverse_locus.end <= 12_150 - 30);
        assert_eq!(reported.amplicons.len(), 1);
    }
}

#[test]
fn test_population_variants_are_masked_and_reattached() {
    let snp = SANGER_POSITION - 150;
    let mut designer = designer();
    let (a, b) = snp_sources(snp);
    designer.add_variant_source(a);
    designer.add_variant_source(b);

    let report = designer
        .design_primers(Method::Sanger, "NM_000546.6:c.215C>G")
        .unwrap();
    assert_eq!(report.stats.masked_positions, 2);
    assert!(!report.pairs.is_empty());

    for reported in &report.pairs {
        let covers = locus_positions(reported)
            .iter()
            .any(|&(start, end)| (start..end).contains(&snp));
        assert_eq!(covers, !reported.variants.is_empty());
    }
}

#[test]
fn test_qpcr_exon_design() {
    let designer = designer();
    let report = designer.design_primers(Method::Qpcr, "NM_000546.6::3").unwrap();

    let (exon_start, exon_end) = PLUS_EXONS[2];
    assert_eq!((report.window.start, report.window.end), (exon_start - 50, exon_end + 50));
    assert!(!report.pairs.is_empty());
    for reported in &report.pairs {
        assert!((80..=150).contains(&reported.pair.amplicon_len));
        assert!(reported.forward_locus.start < exon_end);
        assert!(reported.reverse_locus.end > exon_start);
    }
}

#[test]
fn test_qpcr_budget_stops_on_duplicated_exon() {
    let designer = designer();
    let report = designer.design_primers(Method::Qpcr, "NM_000546.6::4").unwrap();

    // Chaque paire amplifie aussi la copie sur chr2: tout est rejeté
    assert!(report.pairs.len() < 10);
    assert!(report.pairs.is_empty());
    assert!(report.stats.examined <= 100);
    assert_eq!(report.stats.examined, report.stats.merged.min(100));
}

#[test]
fn test_mrna_exon_pair_design() {
    let designer = designer();
    let report = designer
        .design_primers(Method::Mrna, "NM_000546.6::5::7")
        .unwrap();

    let exon5 = PLUS_EXONS[4];
    let exon6 = PLUS_EXONS[5];
    let exon7 = PLUS_EXONS[6];
    assert_eq!((report.window.start, report.window.end), (exon5.0, exon7.1));
    assert!(!report.pairs.is_empty());
    // Tout ce qui n'est pas exon 5 ou exon 7 est masqué
    let window_len = exon7.1 - exon5.0;
    let open = (exon5.1 - exon5.0) + (exon7.1 - exon7.0);
    assert_eq!(report.stats.masked_positions as u64, window_len - open);

    let inside = |(start, end): (u64, u64), exon: (u64, u64)| start >= exon.0 && end <= exon.1;
    for reported in &report.pairs {
        assert!((80..=600).contains(&reported.pair.amplicon_len));
        let fwd = (reported.forward_locus.start, reported.forward_locus.end);
        let rev = (reported.reverse_locus.start, reported.reverse_locus.end);

        if reported.forward_locus.spans_junction {
            assert!(fwd.0 >= exon5.0 && fwd.0 < exon5.1 && fwd.1 > exon7.0);
        } else {
            assert!(inside(fwd, exon5));
        }
        if reported.reverse_locus.spans_junction {
            assert!(rev.0 < exon5.1 && rev.1 > exon7.0 && rev.1 <= exon7.1);
        } else {
            assert!(inside(rev, exon7));
        }

        for (start, end) in [fwd, rev] {
            let crossing = start < exon6.1 && exon6.0 < end;
            assert!(!crossing || reported.forward_locus.spans_junction || reported.reverse_locus.spans_junction);
        }
    }
}

#[test]
fn test_stale_transcript_version_is_substituted() {
    let designer = designer();
    let report = designer
        .design_primers(Method::Sanger, "NM_000546.5:c.215C>G")
        .unwrap();

    assert_eq!(report.transcript.version, Some(6));
    assert!(report.notices.contains(&Notice::TranscriptSubstituted {
        requested: "NM_000546.5".to_string(),
        resolved: "NM_000546.6".to_string(),
    }));
    assert_eq!(report.query, "NM_000546.6:c.215C>G");
    assert!(!report.pairs.is_empty());
}

#[test]
fn test_impossible_constraints_give_empty_result() {
    let designer = designer();
    let constraints = Constraints {
        size_min: 27,
        size_max: 18,
        ..Constraints::default()
    };
    let report = designer
        .design_with(Method::Sanger, "NM_000546.6:c.215C>G", &constraints)
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(report.stats.examined, 0);
}

#[test]
fn test_query_errors_are_reported_before_lookup() {
    let designer = designer();
    assert!(matches!(
        designer.design_primers(Method::Sanger, "NM_000546.6:c.215C>>G"),
        Err(PrimerError::Parse(_))
    ));
    assert!(matches!(
        designer.design_primers(Method::Mrna, "NM_000546.6::5"),
        Err(PrimerError::Arity { .. })
    ));
    assert!(matches!(
        designer.design_primers(Method::Qpcr, "NM_000546.6::12"),
        Err(PrimerError::CoordinateLookup(_))
    ));
    assert!(matches!(
        designer.design_primers(Method::Qpcr, "NM_999999.1::2"),
        Err(PrimerError::CoordinateLookup(_))
    ));
}

#[test]
fn test_result_count_is_configurable() {
    let settings = Settings {
        n_return: 3,
        ..Settings::default()
    };
    let designer = designer_with(settings);
    let report = designer
        .design_primers(Method::Sanger, "NM_000546.6:c.215C>G")
        .unwrap();
    assert!(report.pairs.len() <= 3);
    assert!(!report.pairs.is_empty());
}
