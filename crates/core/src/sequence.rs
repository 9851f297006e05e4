//! Séquences, fenêtres génomiques et masques de positions

use crate::error::{PrimerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

/// Codes IUPAC pour les nucléotides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IupacBase {
    A,  // Adénine
    C,  // Cytosine
    G,  // Guanine
    T,  // Thymine
    R,  // A ou G (purine)
    Y,  // C ou T (pyrimidine)
    S,  // G ou C (strong)
    W,  // A ou T (weak)
    K,  // G ou T (keto)
    M,  // A ou C (amino)
    B,  // C ou G ou T
    D,  // A ou G ou T
    H,  // A ou C ou T
    V,  // A ou C ou G
    N,  // Any base
}

impl IupacBase {
    /// Base sentinelle substituée aux positions masquées
    pub const MASK: IupacBase = IupacBase::N;

    /// Convertit un caractère en base IUPAC
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_uppercase() {
            'A' => Ok(IupacBase::A),
            'C' => Ok(IupacBase::C),
            'G' => Ok(IupacBase::G),
            'T' | 'U' => Ok(IupacBase::T),
            'R' => Ok(IupacBase::R),
            'Y' => Ok(IupacBase::Y),
            'S' => Ok(IupacBase::S),
            'W' => Ok(IupacBase::W),
            'K' => Ok(IupacBase::K),
            'M' => Ok(IupacBase::M),
            'B' => Ok(IupacBase::B),
            'D' => Ok(IupacBase::D),
            'H' => Ok(IupacBase::H),
            'V' => Ok(IupacBase::V),
            'N' => Ok(IupacBase::N),
            _ => Err(PrimerError::InvalidBase(c)),
        }
    }

    /// Convertit un octet de FASTA; tout symbole inconnu devient `N`
    pub fn from_byte_lossy(b: u8) -> Self {
        IupacBase::from_char(b as char).unwrap_or(IupacBase::N)
    }

    /// Convertit une base en caractère
    pub fn as_char(self) -> char {
        match self {
            IupacBase::A => 'A',
            IupacBase::C => 'C',
            IupacBase::G => 'G',
            IupacBase::T => 'T',
            IupacBase::R => 'R',
            IupacBase::Y => 'Y',
            IupacBase::S => 'S',
            IupacBase::W => 'W',
            IupacBase::K => 'K',
            IupacBase::M => 'M',
            IupacBase::B => 'B',
            IupacBase::D => 'D',
            IupacBase::H => 'H',
            IupacBase::V => 'V',
            IupacBase::N => 'N',
        }
    }

    /// Vérifie si c'est une base standard (non ambiguë)
    pub fn is_standard(self) -> bool {
        matches!(self, IupacBase::A | IupacBase::C | IupacBase::G | IupacBase::T)
    }

    /// Retourne true si c'est une base GC
    pub fn is_gc(self) -> bool {
        matches!(self, IupacBase::G | IupacBase::C | IupacBase::S)
    }

    /// Vrai pour la sentinelle de masquage
    pub fn is_mask(self) -> bool {
        self == IupacBase::MASK
    }

    /// Base complémentaire
    pub fn complement(self) -> Self {
        match self {
            IupacBase::A => IupacBase::T,
            IupacBase::C => IupacBase::G,
            IupacBase::G => IupacBase::C,
            IupacBase::T => IupacBase::A,
            IupacBase::R => IupacBase::Y,
            IupacBase::Y => IupacBase::R,
            IupacBase::S => IupacBase::S,
            IupacBase::W => IupacBase::W,
            IupacBase::K => IupacBase::M,
            IupacBase::M => IupacBase::K,
            IupacBase::B => IupacBase::V,
            IupacBase::D => IupacBase::H,
            IupacBase::H => IupacBase::D,
            IupacBase::V => IupacBase::B,
            IupacBase::N => IupacBase::N,
        }
    }
}

impl fmt::Display for IupacBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<char> for IupacBase {
    type Error = PrimerError;

    fn try_from(c: char) -> Result<Self> {
        IupacBase::from_char(c)
    }
}

/// Parse une chaîne de bases (espaces ignorés)
pub fn parse_bases(s: &str) -> Result<Vec<IupacBase>> {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .map(IupacBase::from_char)
        .collect()
}

/// Rend une suite de bases sous forme de chaîne
pub fn bases_to_string(bases: &[IupacBase]) -> String {
    bases.iter().map(|b| b.as_char()).collect()
}

/// Complément inverse
pub fn reverse_complement(bases: &[IupacBase]) -> Vec<IupacBase> {
    bases.iter().rev().map(|b| b.complement()).collect()
}

/// Brin génomique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl Strand {
    pub fn opposite(self) -> Self {
        match self {
            Strand::Plus => Strand::Minus,
            Strand::Minus => Strand::Plus,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Strand::Plus => '+',
            Strand::Minus => '-',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Intervalle génomique 0-based semi-ouvert `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomicSpan {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
}

impl GenomicSpan {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64, strand: Strand) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            strand,
        }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, chrom: &str, start: u64, end: u64) -> bool {
        self.chrom == chrom && self.start < end && start < self.end
    }
}

impl fmt::Display for GenomicSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}({})", self.chrom, self.start, self.end, self.strand)
    }
}

/// Fenêtre de séquence autour de la cible d'une requête.
///
/// La position relative `i` correspond à la position génomique
/// `absolute_offset + i` sur le brin plus, et à
/// `absolute_offset + len - 1 - i` sur le brin moins (la séquence
/// est alors le complément inverse de la référence).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomicWindow {
    pub chrom: String,
    pub strand: Strand,
    pub absolute_offset: u64,
    pub sequence: Vec<IupacBase>,
}

impl GenomicWindow {
    /// Crée une fenêtre; une séquence vide est refusée
    pub fn new(
        chrom: impl Into<String>,
        strand: Strand,
        absolute_offset: u64,
        sequence: Vec<IupacBase>,
    ) -> Result<Self> {
        let chrom = chrom.into();
        if sequence.is_empty() {
            return Err(PrimerError::InvalidWindow {
                chrom,
                start: absolute_offset,
                end: absolute_offset,
            });
        }
        Ok(Self {
            chrom,
            strand,
            absolute_offset,
            sequence,
        })
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Fin génomique (exclusive) de la fenêtre
    pub fn genome_end(&self) -> u64 {
        self.absolute_offset + self.sequence.len() as u64
    }

    /// Intervalle génomique couvert
    pub fn span(&self) -> GenomicSpan {
        GenomicSpan::new(self.chrom.clone(), self.absolute_offset, self.genome_end(), self.strand)
    }

    /// Position relative -> position génomique
    pub fn to_genome(&self, i: usize) -> u64 {
        match self.strand {
            Strand::Plus => self.absolute_offset + i as u64,
            Strand::Minus => self.genome_end() - 1 - i as u64,
        }
    }

    /// Position génomique -> position relative, si elle tombe dans la fenêtre
    pub fn to_relative(&self, genome_pos: u64) -> Option<usize> {
        if genome_pos < self.absolute_offset || genome_pos >= self.genome_end() {
            return None;
        }
        Some(match self.strand {
            Strand::Plus => (genome_pos - self.absolute_offset) as usize,
            Strand::Minus => (self.genome_end() - 1 - genome_pos) as usize,
        })
    }

    /// Intersection d'un intervalle génomique avec la fenêtre, en coordonnées relatives
    pub fn relative_range(&self, start: u64, end: u64) -> Option<Range<usize>> {
        let s = start.max(self.absolute_offset);
        let e = end.min(self.genome_end());
        if s >= e {
            return None;
        }
        Some(match self.strand {
            Strand::Plus => {
                (s - self.absolute_offset) as usize..(e - self.absolute_offset) as usize
            }
            Strand::Minus => {
                (self.genome_end() - e) as usize..(self.genome_end() - s) as usize
            }
        })
    }
}

impl fmt::Display for GenomicWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bases_to_string(&self.sequence))
    }
}

/// Ensemble de positions relatives qu'aucune amorce ne doit couvrir
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionMask {
    positions: BTreeSet<usize>,
}

impl PositionMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pos: usize) {
        self.positions.insert(pos);
    }

    pub fn insert_range(&mut self, range: Range<usize>) {
        self.positions.extend(range);
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.positions.contains(&pos)
    }

    /// Vrai si au moins une position de `range` est masquée
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.positions.range(range.clone()).next().is_some()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().copied()
    }

    /// Union de deux masques
    pub fn union(&self, other: &PositionMask) -> PositionMask {
        PositionMask {
            positions: self.positions.union(&other.positions).copied().collect(),
        }
    }

    /// Plages contiguës de positions masquées
    pub fn ranges(&self) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = Vec::new();
        for pos in self.iter() {
            match ranges.last_mut() {
                Some(last) if last.end == pos => last.end = pos + 1,
                _ => ranges.push(pos..pos + 1),
            }
        }
        ranges
    }

    /// Substitue la sentinelle aux positions masquées
    pub fn apply(&self, sequence: &[IupacBase]) -> Vec<IupacBase> {
        let mut out = sequence.to_vec();
        for pos in self.iter() {
            if let Some(base) = out.get_mut(pos) {
                *base = IupacBase::MASK;
            }
        }
        out
    }
}

impl FromIterator<usize> for PositionMask {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}
