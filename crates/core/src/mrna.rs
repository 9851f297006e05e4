//! Reconstruction ARNm d'une paire d'exons
//!
//! Les deux exons ciblés sont raboutés dans l'orientation du transcrit.
//! Toute position de la fenêtre hors de ces deux exons est masquée, et
//! une table de traduction ramène chaque index épissé à sa position
//! dans la fenêtre génomique d'origine.

use crate::error::{PrimerError, Result};
use crate::sequence::{GenomicSpan, GenomicWindow, IupacBase, PositionMask};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrnaReconstruction {
    /// Positions de la fenêtre hors des deux exons ciblés
    pub mask: PositionMask,
    /// Exon A suivi de l'exon B
    pub spliced: Vec<IupacBase>,
    /// Index épissé -> index dans la fenêtre
    pub translation: Vec<usize>,
    /// Index épissé de la première base de l'exon B
    pub junction: usize,
}

fn exon_range(window: &GenomicWindow, exons: &[GenomicSpan], index: usize) -> Result<Range<usize>> {
    let exon = index
        .checked_sub(1)
        .and_then(|i| exons.get(i))
        .ok_or_else(|| {
            PrimerError::CoordinateLookup(format!("exon {index} absent ({} exons)", exons.len()))
        })?;
    window
        .relative_range(exon.start, exon.end)
        .filter(|r| r.len() as u64 == exon.len())
        .ok_or_else(|| PrimerError::InvalidWindow {
            chrom: exon.chrom.clone(),
            start: exon.start,
            end: exon.end,
        })
}

/// Construit la séquence épissée et le masque structurel pour les exons
/// `targets` (numérotés à partir de 1, `targets.0 < targets.1`).
pub fn reconstruct_exon_pair(
    window: &GenomicWindow,
    exons: &[GenomicSpan],
    targets: (usize, usize),
) -> Result<MrnaReconstruction> {
    let a = exon_range(window, exons, targets.0)?;
    let b = exon_range(window, exons, targets.1)?;

    let translation: Vec<usize> = a.clone().chain(b.clone()).collect();
    let spliced = translation.iter().map(|&i| window.sequence[i]).collect();
    let mask = (0..window.len())
        .filter(|i| !a.contains(i) && !b.contains(i))
        .collect();

    Ok(MrnaReconstruction {
        mask,
        spliced,
        translation,
        junction: a.len(),
    })
}
