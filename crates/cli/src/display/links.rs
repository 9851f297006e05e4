//! Liens vers la PCR in silico UCSC et le navigateur gnomAD

use amorce_core::ReportedPair;
use amorce_storage::ChromNames;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairLinks {
    pub in_silico_pcr: String,
    pub gnomad_region: String,
}

/// PCR in silico sur le génome complet, tolérance de 15 bases en 3'
pub fn ucsc_pcr_link(assembly: &str, forward: &str, reverse: &str, max_size: u64) -> String {
    format!(
        "https://genome.ucsc.edu/cgi-bin/hgPcr?org=Human&db={assembly}&wp_target=genome\
         &wp_f={forward}&wp_r={reverse}&Submit=submit&wp_size={max_size}\
         &wp_perfect=15&wp_good=15&boolshad.wp_flipReverse=0"
    )
}

/// Région gnomAD en coordonnées 1-based fermées
pub fn gnomad_region_link(assembly: &str, chrom: &str, start: u64, end: u64) -> String {
    let dataset = if assembly == "hg38" { "gnomad_r3" } else { "gnomad_r2_1" };
    let chrom = chrom.strip_prefix("chr").unwrap_or(chrom);
    format!(
        "https://gnomad.broadinstitute.org/region/{chrom}-{}-{end}?dataset={dataset}",
        start + 1
    )
}

pub fn pair_links(assembly: &str, names: &ChromNames, max_size: u64, pair: &ReportedPair) -> PairLinks {
    let start = pair.forward_locus.start.min(pair.reverse_locus.start);
    let end = pair.forward_locus.end.max(pair.reverse_locus.end);
    PairLinks {
        in_silico_pcr: ucsc_pcr_link(
            assembly,
            &pair.pair.forward.sequence,
            &pair.pair.reverse.sequence,
            max_size,
        ),
        gnomad_region: gnomad_region_link(assembly, names.display(&pair.forward_locus.chrom), start, end),
    }
}
