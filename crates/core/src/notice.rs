//! Avertissements non bloquants remontés avec un rapport de design

use crate::constraints::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// La version demandée du transcrit est absente; une autre a été utilisée
    TranscriptSubstituted { requested: String, resolved: String },
    /// La plage d'amplicon imposée sort de la plage recommandée pour la méthode
    AmpliconRangeOverride {
        method: Method,
        requested: (usize, usize),
        recommended: (usize, usize),
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TranscriptSubstituted { requested, resolved } => write!(
                f,
                "Transcrit {requested} absent de l'annotation, utilisation de {resolved}"
            ),
            Notice::AmpliconRangeOverride {
                method,
                requested,
                recommended,
            } => write!(
                f,
                "Plage d'amplicon {}-{} hors de la plage recommandée {}-{} pour {method}",
                requested.0, requested.1, recommended.0, recommended.1
            ),
        }
    }
}
