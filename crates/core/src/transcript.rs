//! Modèle de transcrit et catalogue en mémoire
//!
//! Le catalogue sert à la fois de fournisseur de coordonnées
//! (HGVS `c.` -> génome, exon -> intervalle) et de base d'annotation
//! (liste des exons, version courante d'un transcrit).

use crate::error::{PrimerError, Result};
use crate::hgvs::{Anchor, CodingPosition, TranscriptId, TranscriptVariant};
use crate::notice::Notice;
use crate::providers::{AnnotationStore, CoordinateProvider};
use crate::sequence::{GenomicSpan, Strand};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Exon en coordonnées génomiques 0-based semi-ouvertes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exon {
    pub start: u64,
    pub end: u64,
}

impl Exon {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Transcrit: exons dans l'ordre du transcrit (5' -> 3'), bornes du CDS
/// en coordonnées de l'ARNm épissé (`cds_start` = index de c.1,
/// `cds_end` = index de c.*1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptModel {
    pub id: TranscriptId,
    pub gene: String,
    pub chrom: String,
    pub strand: Strand,
    pub exons: Vec<Exon>,
    pub cds_start: u64,
    pub cds_end: u64,
}

impl TranscriptModel {
    /// Longueur de l'ARNm épissé
    pub fn transcript_len(&self) -> u64 {
        self.exons.iter().map(Exon::len).sum()
    }

    /// Intervalle génomique de l'exon `index` (numérotation à partir de 1)
    pub fn exon_span(&self, index: usize) -> Result<GenomicSpan> {
        let exon = index
            .checked_sub(1)
            .and_then(|i| self.exons.get(i))
            .ok_or_else(|| {
                PrimerError::CoordinateLookup(format!(
                    "{} n'a pas d'exon {index} ({} exons)",
                    self.id,
                    self.exons.len()
                ))
            })?;
        Ok(GenomicSpan::new(self.chrom.clone(), exon.start, exon.end, self.strand))
    }

    /// Position de l'ARNm épissé -> position génomique
    pub fn transcript_to_genome(&self, t: u64) -> Option<u64> {
        let mut cumulative = 0;
        for exon in &self.exons {
            if t < cumulative + exon.len() {
                let within = t - cumulative;
                return Some(match self.strand {
                    Strand::Plus => exon.start + within,
                    Strand::Minus => exon.end - 1 - within,
                });
            }
            cumulative += exon.len();
        }
        None
    }

    /// Position `c.` -> position génomique, décalage intronique compris
    pub fn cds_to_genome(&self, pos: &CodingPosition) -> Result<u64> {
        let out_of_range =
            || PrimerError::CoordinateLookup(format!("position c.{pos} hors de {}", self.id));

        let t = match pos.anchor {
            Anchor::Cds if pos.position > 0 => self.cds_start as i64 + pos.position - 1,
            Anchor::Cds => self.cds_start as i64 + pos.position,
            Anchor::Utr3 => self.cds_end as i64 + pos.position - 1,
        };
        let t = u64::try_from(t).map_err(|_| out_of_range())?;
        let g = self.transcript_to_genome(t).ok_or_else(out_of_range)?;

        let g = match self.strand {
            Strand::Plus => g as i64 + pos.offset,
            Strand::Minus => g as i64 - pos.offset,
        };
        u64::try_from(g).map_err(|_| out_of_range())
    }

    /// Intervalle génomique couvert par un variant
    pub fn variant_span(&self, variant: &TranscriptVariant) -> Result<GenomicSpan> {
        let a = self.cds_to_genome(&variant.start)?;
        let b = match &variant.end {
            Some(end) => self.cds_to_genome(end)?,
            None => a,
        };
        Ok(GenomicSpan::new(
            self.chrom.clone(),
            a.min(b),
            a.max(b) + 1,
            self.strand,
        ))
    }
}

/// Catalogue de transcrits indexé par accession puis par version
#[derive(Debug, Clone, Default)]
pub struct TranscriptCatalog {
    transcripts: HashMap<String, BTreeMap<Option<u32>, TranscriptModel>>,
}

impl TranscriptCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: TranscriptModel) {
        self.transcripts
            .entry(model.id.accession.clone())
            .or_default()
            .insert(model.id.version, model);
    }

    pub fn len(&self) -> usize {
        self.transcripts.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    /// Transcrit exact (accession et version)
    pub fn get(&self, id: &TranscriptId) -> Option<&TranscriptModel> {
        self.transcripts.get(&id.accession)?.get(&id.version)
    }

    fn model(&self, id: &TranscriptId) -> Result<&TranscriptModel> {
        self.get(id)
            .ok_or_else(|| PrimerError::CoordinateLookup(format!("transcrit inconnu: {id}")))
    }

    /// Réconcilie la version demandée avec le catalogue. Une version absente
    /// est remplacée par la plus récente de la même accession.
    pub fn sync_transcript(&self, requested: &TranscriptId) -> Result<(TranscriptId, Option<Notice>)> {
        let versions = self.transcripts.get(&requested.accession).ok_or_else(|| {
            PrimerError::CoordinateLookup(format!("transcrit inconnu: {requested}"))
        })?;

        if requested.version.is_some() && versions.contains_key(&requested.version) {
            return Ok((requested.clone(), None));
        }

        let latest = versions
            .values()
            .next_back()
            .map(|m| m.id.clone())
            .ok_or_else(|| {
                PrimerError::CoordinateLookup(format!("transcrit inconnu: {requested}"))
            })?;

        if requested.version.is_none() {
            return Ok((latest, None));
        }

        warn!("Transcrit {} absent, substitution par {}", requested, latest);
        let notice = Notice::TranscriptSubstituted {
            requested: requested.to_string(),
            resolved: latest.to_string(),
        };
        Ok((latest, Some(notice)))
    }
}

impl FromIterator<TranscriptModel> for TranscriptCatalog {
    fn from_iter<I: IntoIterator<Item = TranscriptModel>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for model in iter {
            catalog.insert(model);
        }
        catalog
    }
}

impl CoordinateProvider for TranscriptCatalog {
    fn variant_span(&self, variant: &TranscriptVariant) -> Result<GenomicSpan> {
        self.model(&variant.transcript)?.variant_span(variant)
    }

    fn exon_span(&self, transcript: &TranscriptId, exon_index: usize) -> Result<GenomicSpan> {
        self.model(transcript)?.exon_span(exon_index)
    }
}

impl AnnotationStore for TranscriptCatalog {
    fn exons_of(&self, transcript: &TranscriptId) -> Result<Vec<GenomicSpan>> {
        let model = self.model(transcript)?;
        Ok(model
            .exons
            .iter()
            .map(|e| GenomicSpan::new(model.chrom.clone(), e.start, e.end, model.strand))
            .collect())
    }

    fn resolve_current_version(
        &self,
        transcript: &TranscriptId,
    ) -> Result<(TranscriptId, Option<Notice>)> {
        self.sync_transcript(transcript)
    }

    fn gene_of(&self, transcript: &TranscriptId) -> Option<String> {
        self.get(transcript).map(|m| m.gene.clone())
    }
}
