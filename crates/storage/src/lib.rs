//! Ressources sur disque du design d'amorces
//!
//! Génome de référence FASTA, catalogue de transcrits JSON, sources de
//! variants VCF/BCF indexées, table de noms de chromosomes et chargement
//! des paramètres.

pub mod catalog;
pub mod chrom_names;
pub mod error;
pub mod genome;
pub mod settings;
pub mod vcf;

mod reader;

pub use catalog::{load_catalog, TranscriptRecord};
pub use chrom_names::ChromNames;
pub use error::{Result, StorageError};
pub use genome::{load_genome, FastaGenome};
pub use settings::{load_settings, Resources};
pub use vcf::VcfVariantSource;
