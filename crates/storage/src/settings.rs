//! Chargement des paramètres et des ressources de données

use std::path::Path;
use std::sync::Arc;

use amorce_core::{PrimerDesigner, Settings, TranscriptCatalog};
use tracing::info;

use crate::{load_catalog, load_genome, ChromNames, FastaGenome, Result, VcfVariantSource};

/// Lit un fichier de paramètres (JSON, TOML ou YAML selon l'extension),
/// surchargé par les variables `AMORCE__SECTION__CLE`. Les clés absentes
/// gardent leur valeur par défaut; les noms de sources de variants sont
/// mis en minuscules par `config`.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix("AMORCE").separator("__"))
        .build()?;
    Ok(settings.try_deserialize::<Settings>()?)
}

/// Ressources partagées par toutes les requêtes
pub struct Resources {
    pub settings: Settings,
    pub genome: Arc<FastaGenome>,
    pub coordinates: Arc<TranscriptCatalog>,
    pub annotation: Arc<TranscriptCatalog>,
    pub variant_sources: Vec<Arc<VcfVariantSource>>,
    pub chrom_names: ChromNames,
}

impl Resources {
    /// Vérifie tous les chemins avant de charger quoi que ce soit
    pub fn load(settings: Settings) -> Result<Self> {
        settings.check_resources()?;
        let data = &settings.data;

        let genome = Arc::new(load_genome(&data.reference)?);
        let coordinates = Arc::new(load_catalog(&data.coordinates)?);
        let annotation = if data.annotation == data.coordinates {
            coordinates.clone()
        } else {
            Arc::new(load_catalog(&data.annotation)?)
        };

        let variant_sources = data
            .variation
            .iter()
            .map(|(name, path)| VcfVariantSource::open(name.clone(), path).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        let chrom_names = match &data.chrom_names {
            Some(path) => ChromNames::load(path)?,
            None => ChromNames::new(),
        };

        info!(
            "Ressources {} chargées: {} transcrits, {} sources de variants",
            settings.version,
            coordinates.len(),
            variant_sources.len()
        );
        Ok(Self {
            settings,
            genome,
            coordinates,
            annotation,
            variant_sources,
            chrom_names,
        })
    }

    /// Construit le concepteur (indexation du génome comprise)
    pub fn designer(&self) -> PrimerDesigner {
        let mut designer = PrimerDesigner::new(
            self.settings.clone(),
            self.genome.clone(),
            self.coordinates.clone(),
            self.annotation.clone(),
        );
        for source in &self.variant_sources {
            designer.add_variant_source(source.clone());
        }
        designer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amorce_core::{Method, PrimerError};
    use crate::StorageError;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use rust_htslib::bcf::index;
    use rust_htslib::bgzf;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_dataset(dir: &Path) -> Settings {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let chr: String = (0..4000).map(|_| ['A', 'C', 'G', 'T'][rng.gen_range(0..4)]).collect();
        std::fs::write(dir.join("ref.fa"), format!(">NC_000001.11\n{chr}\n")).unwrap();
        std::fs::write(
            dir.join("catalog.json"),
            r#"{"transcripts": {"NM_000001.2": {
                "gene": "GENE1", "contig": "NC_000001.11", "strand": "+",
                "exons": [[500, 700], [1500, 1700], [2500, 2800]],
                "cds_start": 50, "cds_end": 600}}}"#,
        )
        .unwrap();
        let vcf = dir.join("dbsnp.vcf.gz");
        let mut writer = bgzf::Writer::from_path(&vcf).unwrap();
        writer
            .write_all(
                b"##fileformat=VCFv4.2\n\
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele frequency\">\n\
##contig=<ID=NC_000001.11,length=4000>\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
NC_000001.11\t1601\trs9\tA\tG\t.\tPASS\tAF=0.2\n",
            )
            .unwrap();
        drop(writer);
        index::build(&vcf, None, 1, index::Type::Tbx).unwrap();
        std::fs::write(dir.join("names.csv"), "NC_000001.11,chr1\n").unwrap();

        let mut settings = Settings::default();
        settings.data.reference = dir.join("ref.fa");
        settings.data.coordinates = dir.join("catalog.json");
        settings.data.annotation = dir.join("catalog.json");
        settings.data.variation.insert("dbsnp".to_string(), vcf);
        settings.data.chrom_names = Some(dir.join("names.csv"));
        settings
    }

    #[test]
    fn test_load_settings_from_json_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"version": "hg19", "n_return": 5, "primers": {"max_amplicon_n": 2}}"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.version, "hg19");
        assert_eq!(settings.n_return, 5);
        assert_eq!(settings.primers.max_amplicon_n, 2);
        assert_eq!(settings.primers.min_3prime_matches, 15);
        assert_eq!(settings.size_range_qpcr, (80, 150));
    }

    #[test]
    fn test_load_settings_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "burnin_sanger = 40\nsize_range_pcr = [300, 500]\n\n[data]\nreference = \"/data/hg38.fa\"\n",
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.burnin_sanger, 40);
        assert_eq!(settings.size_range_pcr, (300, 500));
        assert_eq!(settings.data.reference, PathBuf::from("/data/hg38.fa"));
    }

    #[test]
    fn test_missing_resource_fails_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = write_dataset(dir.path());
        settings.data.variation.insert("gnomad".to_string(), dir.path().join("absent.vcf"));

        match Resources::load(settings) {
            Err(StorageError::Core(PrimerError::ResourceMissing(path))) => {
                assert!(path.ends_with("absent.vcf"));
            }
            Err(other) => panic!("erreur inattendue: {other}"),
            Ok(_) => panic!("ressource absente non détectée"),
        }
    }

    #[test]
    fn test_resources_drive_a_design() {
        let dir = tempfile::tempdir().unwrap();
        let resources = Resources::load(write_dataset(dir.path())).unwrap();
        assert_eq!(resources.variant_sources.len(), 1);
        assert_eq!(resources.chrom_names.display("NC_000001.11"), "chr1");
        assert!(Arc::ptr_eq(&resources.coordinates, &resources.annotation));

        let report = resources
            .designer()
            .design_primers(Method::Qpcr, "NM_000001::2")
            .unwrap();
        assert_eq!(report.transcript.to_string(), "NM_000001.2");
        assert_eq!(report.window.chrom, "NC_000001.11");
        assert_eq!((report.window.start, report.window.end), (1450, 1750));
    }
}
