//! Point d'entrée du design d'amorces
//!
//! Résolution de la cible, annotation des variants, reconstruction ARNm,
//! deux passes de génération (masquée et aveugle) en parallèle, puis
//! validation hors-cible par lots sous budget.

use crate::config::Settings;
use crate::constraints::{Constraints, Method};
use crate::design::{CandidateEngine, DesignTemplate, PlacementRules, PrimerCandidate, PrimerPair};
use crate::error::Result;
use crate::hgvs::TranscriptId;
use crate::mrna::reconstruct_exon_pair;
use crate::notice::Notice;
use crate::offtarget::{AlignmentHit, GenomicAmplicon, HitFinder, OffTargetValidator, SeedIndex, ValidatedPair};
use crate::providers::{AnnotationStore, CoordinateProvider, ReferenceGenome, VariantSource};
use crate::ranking::{finalize, Budget};
use crate::sequence::{GenomicSpan, GenomicWindow, IupacBase, PositionMask, Strand};
use crate::target::{Query, ResolvedTarget, TargetResolver, WindowMargins};
use crate::variants::{annotate, AnnotatedVariant, VariantAnnotation, VariantFilter};
use crate::{log_error, log_operation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::info;

/// Position génomique d'une amorce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimerLocus {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    /// Brin dont la séquence de l'amorce est identique
    pub strand: Strand,
    /// Vrai si l'amorce chevauche une jonction exon-exon
    pub spans_junction: bool,
}

/// Paire rendue à l'appelant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedPair {
    pub pair: PrimerPair,
    pub amplicons: Vec<GenomicAmplicon>,
    pub forward_locus: PrimerLocus,
    pub reverse_locus: PrimerLocus,
    /// Variants connus sous l'une des deux amorces
    pub variants: Vec<AnnotatedVariant>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignStats {
    pub masked_positions: usize,
    pub masked_pass: usize,
    pub blind_pass: usize,
    pub merged: usize,
    pub examined: usize,
    pub accepted: usize,
}

/// Rapport complet d'une requête
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignReport {
    pub method: Method,
    pub query: String,
    pub transcript: TranscriptId,
    pub gene: Option<String>,
    pub window: GenomicSpan,
    pub target: GenomicSpan,
    pub pairs: Vec<ReportedPair>,
    pub alignments: BTreeMap<String, Vec<AlignmentHit>>,
    pub notices: Vec<Notice>,
    pub stats: DesignStats,
}

impl DesignReport {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Séquence de design, masques et règles d'une cible résolue
struct DesignPlan {
    template: DesignTemplate,
    rules: PlacementRules,
    full_mask: PositionMask,
    blind_mask: PositionMask,
}

/// Concepteur d'amorces; les ressources partagées sont chargées une fois
pub struct PrimerDesigner {
    settings: Settings,
    genome: Arc<dyn ReferenceGenome>,
    coordinates: Arc<dyn CoordinateProvider>,
    annotation: Arc<dyn AnnotationStore>,
    variant_sources: Vec<Arc<dyn VariantSource>>,
    hit_finder: Arc<dyn HitFinder>,
}

impl PrimerDesigner {
    /// Crée un concepteur et indexe le génome pour la recherche hors-cible
    pub fn new(
        settings: Settings,
        genome: Arc<dyn ReferenceGenome>,
        coordinates: Arc<dyn CoordinateProvider>,
        annotation: Arc<dyn AnnotationStore>,
    ) -> Self {
        let index = log_operation!("seed_index", {
            SeedIndex::build(genome.clone(), &settings.off_target_config())
        });
        Self::with_hit_finder(settings, genome, coordinates, annotation, Arc::new(index))
    }

    /// Comme `new`, avec un moteur d'alignement fourni
    pub fn with_hit_finder(
        settings: Settings,
        genome: Arc<dyn ReferenceGenome>,
        coordinates: Arc<dyn CoordinateProvider>,
        annotation: Arc<dyn AnnotationStore>,
        hit_finder: Arc<dyn HitFinder>,
    ) -> Self {
        Self {
            settings,
            genome,
            coordinates,
            annotation,
            variant_sources: Vec::new(),
            hit_finder,
        }
    }

    pub fn add_variant_source(&mut self, source: Arc<dyn VariantSource>) {
        self.variant_sources.push(source);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Design avec les contraintes par défaut de la méthode
    pub fn design_primers(&self, method: Method, query: &str) -> Result<DesignReport> {
        let (constraints, notice) = self.settings.constraints(method, None);
        let mut report = self.design_with(method, query, &constraints)?;
        report.notices.extend(notice);
        Ok(report)
    }

    /// Design avec des contraintes explicites
    pub fn design_with(
        &self,
        method: Method,
        query: &str,
        constraints: &Constraints,
    ) -> Result<DesignReport> {
        let query = Query::parse(method, query).map_err(|e| log_error!(e))?;

        let target = log_operation!("resolve", {
            let resolver = TargetResolver::new(
                self.coordinates.as_ref(),
                self.annotation.as_ref(),
                self.genome.as_ref(),
            );
            let margins = WindowMargins {
                variant_flank: constraints.amplicon_range.1 as u64,
                binding_site: self.settings.binding_site,
            };
            resolver.resolve(&query, &margins)?
        });

        let variants = log_operation!("annotate", {
            let sources: Vec<&dyn VariantSource> =
                self.variant_sources.iter().map(|s| s.as_ref()).collect();
            let filter = VariantFilter {
                frequency_threshold: self.settings.snv_filter.min_frequency,
                min_source_count: self.settings.snv_filter.min_databases,
                max_ref_len: self.settings.snv_filter.max_snv_len,
            };
            annotate(&target.window, &sources, &filter)?
        });

        let plan = self.plan(&target, &variants)?;

        let (masked_pairs, blind_pairs) = log_operation!("candidates", {
            let masked_seq = plan.template.masked_sequence(&plan.full_mask);
            let run_blind = plan.full_mask != plan.blind_mask;
            let (masked, blind) = rayon::join(
                || collect_pass(&masked_seq, constraints, &plan.rules),
                || {
                    if run_blind {
                        let blind_seq = plan.template.masked_sequence(&plan.blind_mask);
                        collect_pass(&blind_seq, constraints, &plan.rules)
                    } else {
                        Vec::new()
                    }
                },
            );
            info!("Passe masquée: {} paires, passe aveugle: {} paires", masked.len(), blind.len());
            (masked, blind)
        });

        let validator = OffTargetValidator::new(self.hit_finder.clone(), constraints.off_target);
        let budget = Budget {
            result_count: constraints.result_count,
            candidate_budget: constraints.max_candidates,
            batch_size: constraints.batch_size,
        };
        let outcome = log_operation!("offtarget", {
            finalize(&masked_pairs, &blind_pairs, &budget, |batch| {
                validator.validate(batch, |pair| {
                    designed_span(&target.window, &plan.template, pair)
                })
            })
        });

        let pairs: Vec<ReportedPair> = outcome
            .results
            .into_iter()
            .map(|validated| report_pair(&target.window, &plan.template, &variants, validated))
            .collect();

        let stats = DesignStats {
            masked_positions: plan.full_mask.len(),
            masked_pass: masked_pairs.len(),
            blind_pass: blind_pairs.len(),
            merged: outcome.merged,
            examined: outcome.examined,
            accepted: pairs.len(),
        };

        Ok(DesignReport {
            method,
            query: target.query.to_string(),
            transcript: target.transcript.clone(),
            gene: target.gene.clone(),
            window: target.window.span(),
            target: target.target.clone(),
            pairs,
            alignments: outcome.alignments,
            notices: target.notices,
            stats,
        })
    }

    /// Séquence de design, masques des deux passes et règles de placement
    fn plan(&self, target: &ResolvedTarget, variants: &VariantAnnotation) -> Result<DesignPlan> {
        let window = &target.window;
        let mut full_mask = target.initial_mask.union(&variants.mask);
        let mut blind_mask = target.initial_mask.clone();

        let (template, rules) = match &target.query {
            Query::Variant(_) => {
                let burnin = self.settings.burnin_sanger;
                let flank = window
                    .relative_range(target.target.start.saturating_sub(burnin), target.target.end + burnin);
                let rules = PlacementRules {
                    flank,
                    ..Default::default()
                };
                (DesignTemplate::from_window(window), rules)
            }
            Query::Exon { .. } => {
                let template = DesignTemplate::from_window(window);
                let overlap = window
                    .relative_range(target.target.start, target.target.end)
                    .and_then(|r| template.design_range(&r));
                let rules = PlacementRules {
                    overlap,
                    ..Default::default()
                };
                (template, rules)
            }
            Query::ExonPair { first, second, .. } => {
                let reconstruction = reconstruct_exon_pair(window, &target.exons, (*first, *second))?;
                // Hors des deux exons ciblés, masqué dans les deux passes
                full_mask = full_mask.union(&reconstruction.mask);
                blind_mask = blind_mask.union(&reconstruction.mask);
                let rules = PlacementRules {
                    junction: Some(reconstruction.junction),
                    ..Default::default()
                };
                (DesignTemplate::from_mrna(&reconstruction), rules)
            }
        };

        Ok(DesignPlan {
            template,
            rules,
            full_mask,
            blind_mask,
        })
    }
}

/// Tire des lots jusqu'à `max_candidates` paires ou l'épuisement du moteur
fn collect_pass(
    sequence: &[IupacBase],
    constraints: &Constraints,
    rules: &PlacementRules,
) -> Vec<PrimerPair> {
    let mut engine = CandidateEngine::new(sequence, constraints, rules.clone(), HashSet::new());
    let mut pairs = Vec::new();
    while pairs.len() < constraints.max_candidates {
        match engine.next_batch() {
            Some(batch) => pairs.extend(batch),
            None => break,
        }
    }
    pairs.truncate(constraints.max_candidates);
    pairs
}

/// Positions génomiques couvertes par une amorce
fn genome_positions(window: &GenomicWindow, template: &DesignTemplate, candidate: &PrimerCandidate) -> Vec<u64> {
    template
        .window_positions(&(candidate.window_start..candidate.window_end))
        .into_iter()
        .map(|w| window.to_genome(w))
        .collect()
}

fn primer_locus(window: &GenomicWindow, template: &DesignTemplate, candidate: &PrimerCandidate) -> PrimerLocus {
    let positions = genome_positions(window, template, candidate);
    let start = positions.iter().copied().min().unwrap_or(window.absolute_offset);
    let end = positions.iter().copied().max().map_or(start, |m| m + 1);
    let strand = match window.strand {
        Strand::Plus => candidate.strand,
        Strand::Minus => candidate.strand.opposite(),
    };
    PrimerLocus {
        chrom: window.chrom.clone(),
        start,
        end,
        strand,
        spans_junction: end - start != positions.len() as u64,
    }
}

/// Étendue génomique prévue d'une paire, introns compris
fn designed_span(window: &GenomicWindow, template: &DesignTemplate, pair: &PrimerPair) -> u64 {
    let f = primer_locus(window, template, &pair.forward);
    let r = primer_locus(window, template, &pair.reverse);
    f.end.max(r.end) - f.start.min(r.start)
}

fn report_pair(
    window: &GenomicWindow,
    template: &DesignTemplate,
    variants: &VariantAnnotation,
    validated: ValidatedPair,
) -> ReportedPair {
    let ValidatedPair { pair, amplicons } = validated;
    let footprint: Vec<u64> = genome_positions(window, template, &pair.forward)
        .into_iter()
        .chain(genome_positions(window, template, &pair.reverse))
        .collect();
    let overlapping = variants
        .variants
        .iter()
        .filter(|v| footprint.iter().any(|&g| v.overlaps(&window.chrom, g, g + 1)))
        .cloned()
        .collect();

    ReportedPair {
        forward_locus: primer_locus(window, template, &pair.forward),
        reverse_locus: primer_locus(window, template, &pair.reverse),
        pair,
        amplicons,
        variants: overlapping,
    }
}
