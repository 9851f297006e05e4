//! Commande de vérification des ressources

use crate::create_spinner;
use amorce_core::ReferenceGenome;
use amorce_storage::{load_settings, Resources};
use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};

fn status(label: &str, path: &Path) -> bool {
    let exists = path.exists();
    let mark = if exists { style("✓").green() } else { style("✗").red() };
    println!("  {mark} {label:<14} {}", path.display());
    exists
}

pub fn run(settings_path: PathBuf) -> Result<()> {
    let settings = load_settings(&settings_path)
        .with_context(|| format!("lecture de {}", settings_path.display()))?;

    println!("{} {} ({})", style("Ressources").bold(), settings_path.display(), settings.version);
    let data = &settings.data;
    let mut all_present = status("référence", &data.reference);
    all_present &= status("annotation", &data.annotation);
    all_present &= status("coordonnées", &data.coordinates);
    for (name, path) in &data.variation {
        all_present &= status(name, path);
    }
    if let Some(path) = &data.chrom_names {
        all_present &= status("noms", path);
    }
    if !all_present {
        // Même erreur que lors d'un design
        settings.check_resources()?;
    }

    let spinner = create_spinner("Chargement...");
    let resources = Resources::load(settings)?;
    spinner.finish_and_clear();

    let chromosomes = resources.genome.chromosomes();
    println!(
        "{} {} séquences de référence ({} pb), {} transcrits, {} sources de variants",
        style("✓").green(),
        chromosomes.len(),
        resources.genome.total_len(),
        resources.coordinates.len(),
        resources.variant_sources.len()
    );
    for source in &resources.variant_sources {
        println!(
            "    {}: {} contigs indexés",
            amorce_core::VariantSource::name(source.as_ref()),
            source.contigs().len()
        );
    }
    Ok(())
}
