//! Commande de design

use crate::create_spinner;
use crate::display::{links, table};
use amorce_core::{DesignReport, Method};
use amorce_storage::{load_settings, Resources};
use anyhow::{bail, Context, Result};
use console::style;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a DesignReport,
    links: &'a [links::PairLinks],
}

/// `400-700` -> (400, 700)
pub fn parse_amplicon_range(text: &str) -> Result<(usize, usize)> {
    let (min, max) = text
        .split_once('-')
        .with_context(|| format!("plage d'amplicon invalide '{text}', attendu MIN-MAX"))?;
    let min: usize = min.trim().parse().with_context(|| format!("borne invalide '{min}'"))?;
    let max: usize = max.trim().parse().with_context(|| format!("borne invalide '{max}'"))?;
    if min == 0 || min > max {
        bail!("plage d'amplicon vide: {min}-{max}");
    }
    Ok((min, max))
}

pub fn run(
    method: &str,
    query: &str,
    settings_path: PathBuf,
    amplicon: Option<&str>,
    json: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let method: Method = method.parse()?;
    let amplicon = amplicon.map(parse_amplicon_range).transpose()?;

    let settings = load_settings(&settings_path)
        .with_context(|| format!("lecture de {}", settings_path.display()))?;

    let spinner = create_spinner("Chargement des ressources...");
    let resources = Resources::load(settings)?;
    spinner.set_message("Indexation du génome...");
    let designer = resources.designer();
    spinner.finish_with_message("Ressources prêtes");

    let (constraints, notice) = resources.settings.constraints(method, amplicon);

    let spinner = create_spinner(&format!("Design {method} pour {query}..."));
    let mut report = designer.design_with(method, query, &constraints)?;
    report.notices.extend(notice);
    spinner.finish_with_message(format!("{} paires retenues", report.pairs.len()));

    let max_size = resources
        .settings
        .primers
        .max_amplicon_len
        .max(constraints.amplicon_range.1 as u64);
    let pair_links: Vec<links::PairLinks> = report
        .pairs
        .iter()
        .map(|pair| links::pair_links(&resources.settings.version, &resources.chrom_names, max_size, pair))
        .collect();

    let rendered = if json {
        serde_json::to_string_pretty(&JsonOutput {
            report: &report,
            links: &pair_links,
        })?
    } else {
        table::render(&report, &resources.chrom_names, &pair_links)
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            println!("{} Résultats écrits dans {}", style("✓").green(), path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
