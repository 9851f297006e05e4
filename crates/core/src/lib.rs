//! Amorce Core Library
//!
//! Design d'amorces PCR, qPCR et ARNm contre un génome de référence:
//! fenêtre cible, masquage des variants, génération des candidates,
//! validation hors-cible et classement sous budget.

pub mod config;
pub mod constraints;
pub mod design;
pub mod error;
pub mod hgvs;
pub mod logging;
pub mod mrna;
pub mod notice;
pub mod offtarget;
pub mod pipeline;
pub mod providers;
pub mod ranking;
pub mod sequence;
pub mod target;
pub mod thermo;
pub mod transcript;
pub mod variants;

// Réexportations principales
pub use config::Settings;
pub use constraints::{Constraints, Method, OffTargetConfig, PenaltyWeights};
pub use design::{CandidateEngine, DesignTemplate, PlacementRules, PrimerCandidate, PrimerPair};
pub use error::{PrimerError, Result};
pub use hgvs::{parse_hgvs, TranscriptId, TranscriptVariant};
pub use logging::{init_logging, try_init_logging};
// Les macros log_operation et log_error sont automatiquement exportées à la racine du crate
pub use notice::Notice;
pub use offtarget::{AlignmentHit, GenomicAmplicon, HitFinder, HitSearch, OffTargetValidator, SeedIndex, ValidatedPair};
pub use pipeline::{DesignReport, DesignStats, PrimerDesigner, PrimerLocus, ReportedPair};
pub use providers::{
    AnnotationStore, CoordinateProvider, InMemoryGenome, InMemoryVariantSource, ReferenceGenome,
    VariantRecord, VariantSource,
};
pub use sequence::{GenomicSpan, GenomicWindow, IupacBase, PositionMask, Strand};
pub use target::{Query, ResolvedTarget, TargetResolver};
pub use thermo::{OligoProfile, ThermoConditions, ThermoScorer};
pub use transcript::{Exon, TranscriptCatalog, TranscriptModel};
pub use variants::{AnnotatedVariant, VariantAnnotation, VariantFilter};
