//! Paramètres de déploiement et dérivation des contraintes par requête

use crate::constraints::{Constraints, Method, OffTargetConfig, PenaltyWeights};
use crate::error::{PrimerError, Result};
use crate::notice::Notice;
use crate::thermo::ThermoConditions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Chemins des ressources de données
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    /// Génome de référence (FASTA, éventuellement gzippé)
    pub reference: PathBuf,
    /// Catalogue de transcrits (exons, CDS)
    pub annotation: PathBuf,
    /// Table de coordonnées transcrit -> génome
    pub coordinates: PathBuf,
    /// Sources de variants, nom -> VCF
    pub variation: BTreeMap<String, PathBuf>,
    /// Table de noms de chromosomes (facultative)
    pub chrom_names: Option<PathBuf>,
}

/// Filtre des variants de population
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnvFilter {
    /// Nombre minimal de sources rapportant la position
    pub min_databases: usize,
    /// Longueur maximale de l'allèle de référence pour masquer
    pub max_snv_len: usize,
    /// Fréquence allélique minimale
    pub min_frequency: f64,
}

impl Default for SnvFilter {
    fn default() -> Self {
        Self {
            min_databases: 2,
            max_snv_len: 10,
            min_frequency: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimerSettings {
    pub check_max_num_candidates: usize,
    pub min_3prime_matches: usize,
    pub max_amplicon_len: u64,
    pub max_amplicon_n: usize,
}

impl Default for PrimerSettings {
    fn default() -> Self {
        Self {
            check_max_num_candidates: 100,
            min_3prime_matches: 15,
            max_amplicon_len: 4000,
            max_amplicon_n: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffTargetSettings {
    pub word_size: usize,
    pub max_evalue: f64,
    pub max_hits: usize,
}

impl Default for OffTargetSettings {
    fn default() -> Self {
        Self {
            word_size: 13,
            max_evalue: 5.0,
            max_hits: 10_000,
        }
    }
}

/// Paramètres complets de l'application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Assemblage de référence (hg38, hg19)
    pub version: String,
    pub data: DataPaths,
    pub snv_filter: SnvFilter,
    pub primers: PrimerSettings,
    pub offtarget: OffTargetSettings,
    pub n_return: usize,
    /// Marge de lecture non exploitable en début de séquençage
    pub burnin_sanger: u64,
    /// Marge autour de l'exon ciblé en qPCR
    pub binding_site: u64,
    pub size_min: usize,
    pub size_opt: usize,
    pub size_max: usize,
    pub size_range_pcr: (usize, usize),
    pub size_range_qpcr: (usize, usize),
    pub size_range_mrna: (usize, usize),
    pub tm_min: f64,
    pub tm_opt: f64,
    pub tm_max: f64,
    pub gc_min: f64,
    pub gc_max: f64,
    pub ns_max: usize,
    pub homopolymer_max_len: usize,
    pub three_prime_max_gc: usize,
    pub three_prime_stability: f64,
    pub salt_monovalent: f64,
    pub salt_divalent: f64,
    pub conc_dntp: f64,
    pub conc_dna: f64,
}

impl Default for Settings {
    fn default() -> Self {
        let thermo = ThermoConditions::default();
        Self {
            version: "hg38".to_string(),
            data: DataPaths::default(),
            snv_filter: SnvFilter::default(),
            primers: PrimerSettings::default(),
            offtarget: OffTargetSettings::default(),
            n_return: 10,
            burnin_sanger: 30,
            binding_site: 50,
            size_min: 18,
            size_opt: 20,
            size_max: 27,
            size_range_pcr: (350, 600),
            size_range_qpcr: (80, 150),
            size_range_mrna: (80, 600),
            tm_min: 57.0,
            tm_opt: 60.0,
            tm_max: 63.0,
            gc_min: 20.0,
            gc_max: 80.0,
            ns_max: 0,
            homopolymer_max_len: 4,
            three_prime_max_gc: 4,
            three_prime_stability: 100.0,
            salt_monovalent: thermo.salt_monovalent,
            salt_divalent: thermo.salt_divalent,
            conc_dntp: thermo.dntp_conc,
            conc_dna: thermo.dna_conc,
        }
    }
}

impl Settings {
    /// Plage d'amplicon recommandée pour une méthode
    pub fn amplicon_range(&self, method: Method) -> (usize, usize) {
        match method {
            Method::Sanger => self.size_range_pcr,
            Method::Qpcr => self.size_range_qpcr,
            Method::Mrna => self.size_range_mrna,
        }
    }

    /// Contraintes immuables d'une requête. Une plage d'amplicon imposée
    /// remplace celle de la méthode; si elle en sort, un avertissement est rendu.
    pub fn constraints(
        &self,
        method: Method,
        amplicon_override: Option<(usize, usize)>,
    ) -> (Constraints, Option<Notice>) {
        let recommended = self.amplicon_range(method);
        let (amplicon_range, notice) = match amplicon_override {
            Some(requested) => {
                let outside = requested.0 < recommended.0 || requested.1 > recommended.1;
                let notice = outside.then_some(Notice::AmpliconRangeOverride {
                    method,
                    requested,
                    recommended,
                });
                (requested, notice)
            }
            None => (recommended, None),
        };

        let constraints = Constraints {
            size_min: self.size_min,
            size_opt: self.size_opt,
            size_max: self.size_max,
            tm_min: self.tm_min,
            tm_opt: self.tm_opt,
            tm_max: self.tm_max,
            gc_min: self.gc_min,
            gc_max: self.gc_max,
            homopolymer_max_len: self.homopolymer_max_len,
            three_prime_max_gc: self.three_prime_max_gc,
            three_prime_stability: self.three_prime_stability,
            ambiguous_max: self.ns_max,
            amplicon_range,
            min_insert: 0,
            thermo: ThermoConditions {
                salt_monovalent: self.salt_monovalent,
                salt_divalent: self.salt_divalent,
                dntp_conc: self.conc_dntp,
                dna_conc: self.conc_dna,
            },
            max_candidates: self.primers.check_max_num_candidates,
            off_target: self.off_target_config(),
            result_count: self.n_return,
            weights: PenaltyWeights::default(),
            batch_size: 10,
        };

        (constraints, notice)
    }

    /// Paramètres hors-cible, répartis entre `[primers]` et `[offtarget]`
    pub fn off_target_config(&self) -> OffTargetConfig {
        OffTargetConfig {
            word_size: self.offtarget.word_size,
            max_evalue: self.offtarget.max_evalue,
            max_hits: self.offtarget.max_hits,
            max_amplicons: self.primers.max_amplicon_n,
            min_3prime_matches: self.primers.min_3prime_matches,
            max_amplicon_len: self.primers.max_amplicon_len,
        }
    }

    /// Vérifie la présence de toutes les ressources avant de servir une requête
    pub fn check_resources(&self) -> Result<()> {
        let required = [
            &self.data.reference,
            &self.data.annotation,
            &self.data.coordinates,
        ];
        for path in required
            .into_iter()
            .chain(self.data.variation.values())
            .chain(self.data.chrom_names.iter())
        {
            if !path.exists() {
                return Err(PrimerError::ResourceMissing(path.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constraints_per_method() {
        let settings = Settings::default();
        let (sanger, notice) = settings.constraints(Method::Sanger, None);
        assert_eq!(sanger.amplicon_range, (350, 600));
        assert!(notice.is_none());
        assert_eq!(sanger.off_target.max_amplicons, 1);
        assert_eq!(sanger.result_count, 10);

        let (qpcr, _) = settings.constraints(Method::Qpcr, None);
        assert_eq!(qpcr.amplicon_range, (80, 150));
    }

    #[test]
    fn test_amplicon_override_outside_range_emits_notice() {
        let settings = Settings::default();
        let (c, notice) = settings.constraints(Method::Qpcr, Some((60, 200)));
        assert_eq!(c.amplicon_range, (60, 200));
        assert!(matches!(notice, Some(Notice::AmpliconRangeOverride { .. })));

        let (_, notice) = settings.constraints(Method::Qpcr, Some((90, 140)));
        assert!(notice.is_none());
    }

    #[test]
    fn test_missing_resource_is_reported() {
        let mut settings = Settings::default();
        settings.data.reference = PathBuf::from("/nonexistent/genome.fna");
        match settings.check_resources() {
            Err(PrimerError::ResourceMissing(path)) => {
                assert_eq!(path, PathBuf::from("/nonexistent/genome.fna"))
            }
            other => panic!("résultat inattendu: {other:?}"),
        }
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"version": "hg19", "n_return": 5}"#).unwrap();
        assert_eq!(settings.version, "hg19");
        assert_eq!(settings.n_return, 5);
        assert_eq!(settings.size_opt, 20);
        assert_eq!(settings.snv_filter.min_databases, 2);
    }
}
