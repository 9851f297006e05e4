//! Fusion des passes, déduplication et application des budgets

use crate::design::PrimerPair;
use crate::offtarget::{AlignmentHit, BatchOutcome, ValidatedPair};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// Concatène les deux passes, retire les doublons (la première occurrence
/// est gardée) puis trie de façon stable par pénalité de paire.
pub fn merge_passes(masked: &[PrimerPair], blind: &[PrimerPair]) -> Vec<PrimerPair> {
    let mut seen: HashSet<&PrimerPair> = HashSet::new();
    let mut merged: Vec<PrimerPair> = masked
        .iter()
        .chain(blind)
        .filter(|pair| seen.insert(*pair))
        .cloned()
        .collect();
    merged.sort_by(|a, b| a.pair_penalty.total_cmp(&b.pair_penalty));
    merged
}

/// Budgets appliqués pendant la validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub result_count: usize,
    /// Nombre maximal de paires soumises au validateur
    pub candidate_budget: usize,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FinalizeOutcome {
    pub results: Vec<ValidatedPair>,
    pub alignments: BTreeMap<String, Vec<AlignmentHit>>,
    /// Paires distinctes après fusion
    pub merged: usize,
    /// Paires effectivement soumises au validateur
    pub examined: usize,
}

/// Valide l'ordre fusionné lot par lot jusqu'à obtenir `result_count`
/// paires ou épuiser `candidate_budget`. Les budgets sont vérifiés après
/// chaque lot.
pub fn finalize<V>(
    masked: &[PrimerPair],
    blind: &[PrimerPair],
    budget: &Budget,
    mut validate: V,
) -> FinalizeOutcome
where
    V: FnMut(&[PrimerPair]) -> BatchOutcome,
{
    let merged = merge_passes(masked, blind);
    let batch_size = budget.batch_size.max(1);

    let mut outcome = FinalizeOutcome {
        merged: merged.len(),
        ..Default::default()
    };
    let mut cursor = 0;
    while outcome.results.len() < budget.result_count
        && outcome.examined < budget.candidate_budget
        && cursor < merged.len()
    {
        let take = batch_size
            .min(budget.candidate_budget - outcome.examined)
            .min(merged.len() - cursor);
        let batch = &merged[cursor..cursor + take];
        cursor += take;
        outcome.examined += take;

        let validated = validate(batch);
        outcome.results.extend(validated.accepted);
        outcome.alignments.extend(validated.alignments);
    }

    outcome
        .results
        .sort_by(|a, b| a.pair.pair_penalty.total_cmp(&b.pair.pair_penalty));
    outcome.results.truncate(budget.result_count);

    // Seuls les hits des paires rendues sont conservés
    let kept: HashSet<&str> = outcome
        .results
        .iter()
        .flat_map(|r| [r.pair.forward.sequence.as_str(), r.pair.reverse.sequence.as_str()])
        .collect();
    outcome.alignments.retain(|sequence, _| kept.contains(sequence.as_str()));

    info!(
        "{} paires acceptées sur {} examinées ({} après fusion)",
        outcome.results.len(),
        outcome.examined,
        outcome.merged
    );
    outcome
}
