//! Catalogue de transcrits au format JSON
//!
//! ```json
//! {
//!   "transcripts": {
//!     "NM_000546.6": {
//!       "gene": "TP53", "contig": "NC_000017.11", "strand": "-",
//!       "exons": [[7687376, 7687490], [7676520, 7676622]],
//!       "cds_start": 202, "cds_end": 1384
//!     }
//!   }
//! }
//! ```
//!
//! Exons en coordonnées génomiques 0-based semi-ouvertes, dans l'ordre du
//! transcrit; bornes du CDS en coordonnées de l'ARNm épissé.

use std::collections::BTreeMap;
use std::path::Path;

use amorce_core::{Exon, Strand, TranscriptCatalog, TranscriptId, TranscriptModel};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{reader, Result, StorageError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub gene: String,
    pub contig: String,
    pub strand: Strand,
    pub exons: Vec<(u64, u64)>,
    pub cds_start: u64,
    pub cds_end: u64,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    transcripts: BTreeMap<String, TranscriptRecord>,
}

impl TranscriptRecord {
    fn into_model(self, id: &str) -> Result<TranscriptModel> {
        let invalid = |reason: &str| StorageError::Catalog(format!("{id}: {reason}"));

        let id: TranscriptId = id.parse()?;
        if self.exons.is_empty() {
            return Err(invalid("aucun exon"));
        }
        if self.exons.iter().any(|&(start, end)| start >= end) {
            return Err(invalid("exon vide ou inversé"));
        }

        let model = TranscriptModel {
            id,
            gene: self.gene,
            chrom: self.contig,
            strand: self.strand,
            exons: self
                .exons
                .into_iter()
                .map(|(start, end)| Exon { start, end })
                .collect(),
            cds_start: self.cds_start,
            cds_end: self.cds_end,
        };
        if model.cds_start > model.cds_end || model.cds_end > model.transcript_len() {
            return Err(invalid("bornes du CDS hors du transcrit"));
        }
        Ok(model)
    }
}

/// Charge un catalogue (`.json` ou `.json.gz`)
pub fn load_catalog(path: impl AsRef<Path>) -> Result<TranscriptCatalog> {
    let path = path.as_ref();
    let file: CatalogFile = serde_json::from_reader(reader::open(path)?)?;

    let catalog = file
        .transcripts
        .into_iter()
        .map(|(id, record)| record.into_model(&id))
        .collect::<Result<TranscriptCatalog>>()?;

    info!("{} transcrits chargés depuis {}", catalog.len(), path.display());
    Ok(catalog)
}
