//! Résolution d'une requête en fenêtre génomique

use crate::constraints::Method;
use crate::error::{PrimerError, Result};
use crate::hgvs::{parse_hgvs, TranscriptId, TranscriptVariant};
use crate::notice::Notice;
use crate::providers::{AnnotationStore, CoordinateProvider, ReferenceGenome};
use crate::sequence::{GenomicSpan, GenomicWindow, PositionMask};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Requête de design, après vérification de l'arité
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    /// Variant ponctuel (Sanger)
    Variant(TranscriptVariant),
    /// Exon unique (qPCR)
    Exon { transcript: TranscriptId, exon: usize },
    /// Paire d'exons, `first < second` (ARNm)
    ExonPair {
        transcript: TranscriptId,
        first: usize,
        second: usize,
    },
}

fn parse_exon_index(text: &str) -> Result<usize> {
    text.parse::<usize>()
        .map_err(|_| PrimerError::Parse(format!("numéro d'exon invalide: '{text}'")))
}

impl Query {
    /// Découpe la requête sur `::` et vérifie le nombre de composants
    /// avant toute recherche de coordonnées.
    pub fn parse(method: Method, text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split("::").map(str::trim).collect();
        if parts.len() != method.arity() {
            return Err(PrimerError::Arity {
                method: method.to_string(),
                expected: method.arity(),
                found: parts.len(),
                example: method.example(),
            });
        }

        match method {
            Method::Sanger => Ok(Query::Variant(parse_hgvs(parts[0])?)),
            Method::Qpcr => Ok(Query::Exon {
                transcript: parts[0].parse()?,
                exon: parse_exon_index(parts[1])?,
            }),
            Method::Mrna => {
                let a = parse_exon_index(parts[1])?;
                let b = parse_exon_index(parts[2])?;
                if a == b {
                    return Err(PrimerError::Parse(format!(
                        "les deux exons doivent être distincts: '{text}'"
                    )));
                }
                Ok(Query::ExonPair {
                    transcript: parts[0].parse()?,
                    first: a.min(b),
                    second: a.max(b),
                })
            }
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Query::Variant(_) => Method::Sanger,
            Query::Exon { .. } => Method::Qpcr,
            Query::ExonPair { .. } => Method::Mrna,
        }
    }

    pub fn transcript(&self) -> &TranscriptId {
        match self {
            Query::Variant(v) => &v.transcript,
            Query::Exon { transcript, .. } | Query::ExonPair { transcript, .. } => transcript,
        }
    }

    fn with_transcript(&self, id: TranscriptId) -> Self {
        match self {
            Query::Variant(v) => Query::Variant(TranscriptVariant {
                transcript: id,
                ..v.clone()
            }),
            Query::Exon { exon, .. } => Query::Exon {
                transcript: id,
                exon: *exon,
            },
            Query::ExonPair { first, second, .. } => Query::ExonPair {
                transcript: id,
                first: *first,
                second: *second,
            },
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Variant(v) => write!(f, "{v}"),
            Query::Exon { transcript, exon } => write!(f, "{transcript}::{exon}"),
            Query::ExonPair {
                transcript,
                first,
                second,
            } => write!(f, "{transcript}::{first}::{second}"),
        }
    }
}

/// Marges de construction de la fenêtre
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMargins {
    /// Marge autour d'un variant (taille maximale d'amplicon)
    pub variant_flank: u64,
    /// Marge autour d'un exon ciblé
    pub binding_site: u64,
}

/// Cible résolue: fenêtre, masque initial et structure exonique
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub query: Query,
    pub transcript: TranscriptId,
    pub gene: Option<String>,
    pub window: GenomicWindow,
    /// Position de la requête (toujours masquée)
    pub initial_mask: PositionMask,
    /// Intervalle génomique visé: variant, exon ou paire d'exons
    pub target: GenomicSpan,
    /// Exons du transcrit, dans l'ordre du transcrit
    pub exons: Vec<GenomicSpan>,
    pub notices: Vec<Notice>,
}

/// Résolveur de cibles adossé aux collaborateurs externes
pub struct TargetResolver<'a> {
    coordinates: &'a dyn CoordinateProvider,
    annotation: &'a dyn AnnotationStore,
    genome: &'a dyn ReferenceGenome,
}

impl<'a> TargetResolver<'a> {
    pub fn new(
        coordinates: &'a dyn CoordinateProvider,
        annotation: &'a dyn AnnotationStore,
        genome: &'a dyn ReferenceGenome,
    ) -> Self {
        Self {
            coordinates,
            annotation,
            genome,
        }
    }

    fn chrom_len(&self, chrom: &str) -> Result<u64> {
        self.genome
            .chromosomes()
            .into_iter()
            .find(|(name, _)| name == chrom)
            .map(|(_, len)| len)
            .ok_or_else(|| PrimerError::UnknownChromosome(chrom.to_string()))
    }

    /// Construit la fenêtre et le masque initial d'une requête
    pub fn resolve(&self, query: &Query, margins: &WindowMargins) -> Result<ResolvedTarget> {
        let (transcript, notice) = self.annotation.resolve_current_version(query.transcript())?;
        let query = query.with_transcript(transcript.clone());
        let exons = self.annotation.exons_of(&transcript)?;

        let (target, flank) = match &query {
            Query::Variant(variant) => (self.coordinates.variant_span(variant)?, margins.variant_flank),
            Query::Exon { exon, .. } => (
                self.coordinates.exon_span(&transcript, *exon)?,
                margins.binding_site,
            ),
            Query::ExonPair { first, second, .. } => {
                let a = self.coordinates.exon_span(&transcript, *first)?;
                let b = self.coordinates.exon_span(&transcript, *second)?;
                let span = GenomicSpan::new(
                    a.chrom.clone(),
                    a.start.min(b.start),
                    a.end.max(b.end),
                    a.strand,
                );
                (span, 0)
            }
        };

        let chrom_len = self.chrom_len(&target.chrom)?;
        let start = target.start.saturating_sub(flank);
        let end = (target.end + flank).min(chrom_len);
        if start >= end {
            return Err(PrimerError::InvalidWindow {
                chrom: target.chrom.clone(),
                start,
                end,
            });
        }

        let sequence = self.genome.substring(&target.chrom, start, end, target.strand)?;
        let window = GenomicWindow::new(target.chrom.clone(), target.strand, start, sequence)?;

        let mut initial_mask = PositionMask::new();
        if let Query::Variant(_) = query {
            if let Some(range) = window.relative_range(target.start, target.end) {
                initial_mask.insert_range(range);
            }
        }

        debug!(
            "Fenêtre {}:{}-{} ({}) pour {}",
            window.chrom,
            start,
            end,
            window.strand,
            query
        );

        Ok(ResolvedTarget {
            gene: self.annotation.gene_of(&transcript),
            query,
            transcript,
            window,
            initial_mask,
            target,
            exons,
            notices: notice.into_iter().collect(),
        })
    }
}
