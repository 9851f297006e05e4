//! Correspondance entre noms de séquences de référence et noms d'affichage

use std::collections::HashMap;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{reader, Result, StorageError};

/// Table `NC_000017.11,chr17`; un nom absent de la table est affiché tel quel
#[derive(Debug, Clone, Default)]
pub struct ChromNames {
    names: HashMap<String, String>,
}

impl ChromNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Charge un CSV à deux colonnes, sans en-tête; `#` ouvre un commentaire
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader::open(path.as_ref())?);

        let mut names = HashMap::new();
        for record in rdr.records() {
            let record = record?;
            match (record.len(), record.get(0), record.get(1)) {
                (2, Some(reference), Some(display)) if !reference.is_empty() && !display.is_empty() => {
                    names.insert(reference.to_string(), display.to_string());
                }
                _ => return Err(malformed(&record)),
            }
        }
        Ok(Self { names })
    }

    pub fn insert(&mut self, reference: impl Into<String>, display: impl Into<String>) {
        self.names.insert(reference.into(), display.into());
    }

    pub fn display<'a>(&'a self, reference: &'a str) -> &'a str {
        self.names.get(reference).map_or(reference, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn malformed(record: &StringRecord) -> StorageError {
    StorageError::ChromNames {
        line: record.position().map_or(0, |p| p.line() as usize),
        content: record.iter().collect::<Vec<_>>().join(","),
    }
}
