//! Séquence de design et règles de placement des paires

use crate::constraints::Constraints;
use crate::design::PrimerCandidate;
use crate::mrna::MrnaReconstruction;
use crate::sequence::{GenomicWindow, IupacBase, PositionMask};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Règles propres à la méthode, en coordonnées de la séquence de design
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRules {
    /// Région à encadrer strictement (burn-in Sanger)
    pub flank: Option<Range<usize>>,
    /// Région que l'amplicon doit chevaucher (exon qPCR)
    pub overlap: Option<Range<usize>>,
    /// Jonction exon-exon que l'amplicon doit franchir (ARNm)
    pub junction: Option<usize>,
}

impl PlacementRules {
    /// Longueur d'amplicon si la paire respecte toutes les règles
    pub fn admits(
        &self,
        forward: &PrimerCandidate,
        reverse: &PrimerCandidate,
        constraints: &Constraints,
    ) -> Option<usize> {
        if forward.window_end + constraints.min_insert > reverse.window_start {
            return None;
        }
        let amplicon_len = reverse.window_end - forward.window_start;
        if !constraints.amplicon_in_range(amplicon_len) {
            return None;
        }
        if let Some(flank) = &self.flank {
            if forward.window_end > flank.start || reverse.window_start < flank.end {
                return None;
            }
        }
        if let Some(overlap) = &self.overlap {
            if forward.window_start >= overlap.end || overlap.start >= reverse.window_end {
                return None;
            }
        }
        if let Some(junction) = self.junction {
            if forward.window_start >= junction || reverse.window_end <= junction {
                return None;
            }
        }
        Some(amplicon_len)
    }
}

/// Séquence sur laquelle tourne le moteur, avec sa correspondance vers la fenêtre
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignTemplate {
    pub sequence: Vec<IupacBase>,
    /// Index de design -> index de la fenêtre
    pub to_window: Vec<usize>,
}

impl DesignTemplate {
    /// La fenêtre elle-même
    pub fn from_window(window: &GenomicWindow) -> Self {
        Self {
            sequence: window.sequence.clone(),
            to_window: (0..window.len()).collect(),
        }
    }

    /// La séquence épissée d'une paire d'exons
    pub fn from_mrna(reconstruction: &MrnaReconstruction) -> Self {
        Self {
            sequence: reconstruction.spliced.clone(),
            to_window: reconstruction.translation.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Projette un masque de fenêtre sur la séquence de design
    pub fn project_mask(&self, window_mask: &PositionMask) -> PositionMask {
        self.to_window
            .iter()
            .enumerate()
            .filter(|(_, &w)| window_mask.contains(w))
            .map(|(i, _)| i)
            .collect()
    }

    /// Séquence de design avec la sentinelle aux positions masquées
    pub fn masked_sequence(&self, window_mask: &PositionMask) -> Vec<IupacBase> {
        self.project_mask(window_mask).apply(&self.sequence)
    }

    /// Index de fenêtre couverts par un intervalle de design
    pub fn window_positions(&self, range: &Range<usize>) -> Vec<usize> {
        self.to_window[range.clone()].to_vec()
    }

    /// Plus petit intervalle de design contenant les positions de fenêtre `range`
    pub fn design_range(&self, window_range: &Range<usize>) -> Option<Range<usize>> {
        let mut hits = self
            .to_window
            .iter()
            .enumerate()
            .filter(|(_, w)| window_range.contains(*w))
            .map(|(i, _)| i);
        let first = hits.next()?;
        let last = hits.last().unwrap_or(first);
        Some(first..last + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{parse_bases, Strand};

    fn candidate(start: usize, end: usize, strand: Strand) -> PrimerCandidate {
        PrimerCandidate {
            sequence: "A".repeat(end - start),
            strand,
            window_start: start,
            window_end: end,
            tm: 60.0,
            gc_percent: 50.0,
            homopolymer_len: 1,
            three_prime_gc: 2,
            three_prime_stability: 7.0,
            penalty: 0.0,
        }
    }

    fn constraints() -> Constraints {
        Constraints {
            amplicon_range: (100, 200),
            ..Default::default()
        }
    }

    #[test]
    fn test_amplicon_range_and_order() {
        let rules = PlacementRules::default();
        let c = constraints();
        let f = candidate(0, 20, Strand::Plus);
        assert_eq!(rules.admits(&f, &candidate(130, 150, Strand::Minus), &c), Some(150));
        assert_eq!(rules.admits(&f, &candidate(40, 60, Strand::Minus), &c), None);
        assert_eq!(rules.admits(&f, &candidate(300, 320, Strand::Minus), &c), None);
        assert_eq!(rules.admits(&f, &candidate(10, 120, Strand::Minus), &c), None);
    }

    #[test]
    fn test_flank_overlap_and_junction_rules() {
        let c = constraints();
        let f = candidate(0, 20, Strand::Plus);
        let r = candidate(130, 150, Strand::Minus);

        let flank = PlacementRules {
            flank: Some(20..130),
            ..Default::default()
        };
        assert!(flank.admits(&f, &r, &c).is_some());
        let tight = PlacementRules {
            flank: Some(19..130),
            ..Default::default()
        };
        assert!(tight.admits(&f, &r, &c).is_none());

        let overlap = PlacementRules {
            overlap: Some(150..180),
            ..Default::default()
        };
        assert!(overlap.admits(&f, &r, &c).is_none());

        let junction = PlacementRules {
            junction: Some(140),
            ..Default::default()
        };
        assert!(junction.admits(&f, &r, &c).is_some());
        let junction = PlacementRules {
            junction: Some(150),
            ..Default::default()
        };
        assert!(junction.admits(&f, &r, &c).is_none());
    }

    #[test]
    fn test_template_mask_projection() {
        let window =
            GenomicWindow::new("chr1", Strand::Plus, 0, parse_bases("ACGTACGTAC").unwrap()).unwrap();
        let template = DesignTemplate {
            sequence: parse_bases("ACGAC").unwrap(),
            to_window: vec![0, 1, 2, 8, 9],
        };
        let mask: PositionMask = [2usize, 5, 9].into_iter().collect();
        assert_eq!(template.project_mask(&mask).iter().collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(template.design_range(&(1..9)), Some(1..4));
        assert_eq!(template.design_range(&(4..8)), None);
        assert_eq!(DesignTemplate::from_window(&window).to_window.len(), 10);
    }
}
