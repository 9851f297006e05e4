//! Génome de référence lu depuis un FASTA (éventuellement gzippé)

use std::path::{Path, PathBuf};

use amorce_core::{InMemoryGenome, IupacBase, ReferenceGenome, Strand};
use bio::io::fasta;
use tracing::info;

use crate::{reader, Result, StorageError};

/// Génome FASTA chargé en mémoire
#[derive(Debug, Clone)]
pub struct FastaGenome {
    path: PathBuf,
    inner: InMemoryGenome,
}

impl FastaGenome {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_len(&self) -> u64 {
        self.inner.total_len()
    }
}

/// Charge toutes les séquences du fichier; les symboles inconnus deviennent `N`
pub fn load_genome(path: impl AsRef<Path>) -> Result<FastaGenome> {
    let path = path.as_ref();
    let reader = fasta::Reader::new(reader::open(path)?);
    let mut inner = InMemoryGenome::new();

    for record in reader.records() {
        let record = record.map_err(|e| StorageError::Fasta {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let bases: Vec<IupacBase> = record.seq().iter().map(|&b| IupacBase::from_byte_lossy(b)).collect();
        inner.add_chromosome(record.id(), bases);
    }

    if inner.chromosomes().is_empty() {
        return Err(StorageError::Fasta {
            path: path.to_path_buf(),
            message: "aucune séquence".to_string(),
        });
    }

    info!(
        "Génome chargé depuis {}: {} séquences, {} pb",
        path.display(),
        inner.chromosomes().len(),
        inner.total_len()
    );
    Ok(FastaGenome {
        path: path.to_path_buf(),
        inner,
    })
}

impl ReferenceGenome for FastaGenome {
    fn substring(
        &self,
        chrom: &str,
        start: u64,
        end: u64,
        strand: Strand,
    ) -> amorce_core::Result<Vec<IupacBase>> {
        self.inner.substring(chrom, start, end, strand)
    }

    fn chromosomes(&self) -> Vec<(String, u64)> {
        self.inner.chromosomes()
    }

    fn raw(&self, chrom: &str) -> Option<&[IupacBase]> {
        self.inner.raw(chrom)
    }
}
