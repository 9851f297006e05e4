//! Rendu texte d'un rapport de design

use amorce_core::{DesignReport, PrimerLocus, ReportedPair};
use amorce_storage::ChromNames;
use console::style;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::links::PairLinks;

#[derive(Tabled)]
struct PairRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Sens")]
    forward: String,
    #[tabled(rename = "Anti-sens")]
    reverse: String,
    #[tabled(rename = "Tm (°C)")]
    tm: String,
    #[tabled(rename = "GC%")]
    gc: String,
    #[tabled(rename = "Amplicon")]
    amplicon: usize,
    #[tabled(rename = "Pénalité")]
    penalty: String,
    #[tabled(rename = "Position")]
    locus: String,
    #[tabled(rename = "Variants")]
    variants: String,
}

fn locus(names: &ChromNames, locus: &PrimerLocus) -> String {
    let junction = if locus.spans_junction { " (jonction)" } else { "" };
    format!(
        "{}:{}-{}{}{junction}",
        names.display(&locus.chrom),
        locus.start + 1,
        locus.end,
        locus.strand
    )
}

fn row(rank: usize, names: &ChromNames, pair: &ReportedPair) -> PairRow {
    let (f, r) = (&pair.pair.forward, &pair.pair.reverse);
    let variants = pair
        .variants
        .iter()
        .map(|v| v.record.id.clone().unwrap_or_else(|| format!("{}>{}", v.record.reference, v.record.alternate)))
        .collect::<Vec<_>>();

    PairRow {
        rank,
        forward: f.sequence.clone(),
        reverse: r.sequence.clone(),
        tm: format!("{:.1} / {:.1}", f.tm, r.tm),
        gc: format!("{:.0} / {:.0}", f.gc_percent, r.gc_percent),
        amplicon: pair.pair.amplicon_len,
        penalty: format!("{:.3}", pair.pair.pair_penalty),
        locus: format!("{}\n{}", locus(names, &pair.forward_locus), locus(names, &pair.reverse_locus)),
        variants: if variants.is_empty() { "-".to_string() } else { variants.join(", ") },
    }
}

/// Tableau des paires, suivi des liens de chaque paire
pub fn render(report: &DesignReport, names: &ChromNames, links: &[PairLinks]) -> String {
    let mut out = String::new();
    let gene = report.gene.as_deref().unwrap_or("?");
    out.push_str(&format!(
        "{} {} ({}, {})\n",
        style("Requête").bold(),
        report.query,
        gene,
        report.method
    ));
    out.push_str(&format!(
        "Fenêtre {}:{}-{} ({}), cible {}-{}\n",
        names.display(&report.window.chrom),
        report.window.start + 1,
        report.window.end,
        report.window.strand,
        report.target.start + 1,
        report.target.end
    ));

    for notice in &report.notices {
        out.push_str(&format!("{} {}\n", style("⚠").yellow(), style(notice).yellow()));
    }

    let stats = &report.stats;
    out.push_str(&format!(
        "{}/{} paires valides ({} masquée, {} aveugle, {} positions masquées)\n\n",
        stats.accepted, stats.examined, stats.masked_pass, stats.blind_pass, stats.masked_positions
    ));

    if report.is_empty() {
        out.push_str(&format!("{}\n", style("Aucune paire d'amorces ne satisfait les contraintes").red()));
        return out;
    }

    let rows: Vec<PairRow> = report
        .pairs
        .iter()
        .enumerate()
        .map(|(i, pair)| row(i + 1, names, pair))
        .collect();
    out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
    out.push('\n');

    for (i, link) in links.iter().enumerate() {
        out.push_str(&format!("\n{} {}\n", style(format!("#{}", i + 1)).bold(), link.in_silico_pcr));
        out.push_str(&format!("   {}\n", link.gnomad_region));
    }
    out
}
