//! Analyse des descriptions de variants HGVS sur transcrit codant (`c.`)

use crate::error::{PrimerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifiant de transcrit versionné, p. ex. `NM_000546.6`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TranscriptId {
    pub accession: String,
    pub version: Option<u32>,
}

impl TranscriptId {
    pub fn new(accession: impl Into<String>, version: Option<u32>) -> Self {
        Self {
            accession: accession.into(),
            version,
        }
    }

    pub fn with_version(&self, version: u32) -> Self {
        Self::new(self.accession.clone(), Some(version))
    }
}

impl fmt::Display for TranscriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(v) => write!(f, "{}.{}", self.accession, v),
            None => f.write_str(&self.accession),
        }
    }
}

impl FromStr for TranscriptId {
    type Err = PrimerError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PrimerError::Parse(format!("identifiant de transcrit invalide: '{s}'"));

        let (accession, version) = match s.split_once('.') {
            Some((acc, v)) => {
                if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                (acc, Some(v.parse::<u32>().map_err(|_| invalid())?))
            }
            None => (s, None),
        };

        let letters = accession
            .bytes()
            .take_while(|b| b.is_ascii_uppercase())
            .count();
        let rest = accession[letters..]
            .strip_prefix('_')
            .unwrap_or(&accession[letters..]);
        if letters < 2 || rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        Ok(Self::new(accession, version))
    }
}

/// Région du transcrit à laquelle une position codante est ancrée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    /// Relative à l'ATG (`215`, ou `-15` dans l'UTR 5')
    Cds,
    /// Relative au codon stop (`*20`)
    Utr3,
}

/// Position `c.` avec décalage intronique éventuel (`215+1`, `216-2`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodingPosition {
    pub anchor: Anchor,
    pub position: i64,
    pub offset: i64,
}

impl fmt::Display for CodingPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.anchor == Anchor::Utr3 {
            f.write_str("*")?;
        }
        write!(f, "{}", self.position)?;
        if self.offset != 0 {
            write!(f, "{:+}", self.offset)?;
        }
        Ok(())
    }
}

/// Modification décrite par le variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariantEdit {
    Substitution { reference: char, alternate: char },
    Deletion(Option<String>),
    Duplication(Option<String>),
    Insertion(String),
    DelIns(String),
    Identity,
}

impl fmt::Display for VariantEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantEdit::Substitution {
                reference,
                alternate,
            } => write!(f, "{reference}>{alternate}"),
            VariantEdit::Deletion(seq) => write!(f, "del{}", seq.as_deref().unwrap_or("")),
            VariantEdit::Duplication(seq) => write!(f, "dup{}", seq.as_deref().unwrap_or("")),
            VariantEdit::Insertion(seq) => write!(f, "ins{seq}"),
            VariantEdit::DelIns(seq) => write!(f, "delins{seq}"),
            VariantEdit::Identity => f.write_str("="),
        }
    }
}

/// Variant décrit sur un transcrit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptVariant {
    pub transcript: TranscriptId,
    pub start: CodingPosition,
    pub end: Option<CodingPosition>,
    pub edit: VariantEdit,
}

impl fmt::Display for TranscriptVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:c.{}", self.transcript, self.start)?;
        if let Some(end) = &self.end {
            write!(f, "_{end}")?;
        }
        write!(f, "{}", self.edit)
    }
}

impl FromStr for TranscriptVariant {
    type Err = PrimerError;

    fn from_str(s: &str) -> Result<Self> {
        parse_hgvs(s)
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    fn number(&mut self) -> Option<i64> {
        self.take_while(|b| b.is_ascii_digit()).parse().ok()
    }
}

fn parse_position(cursor: &mut Cursor<'_>) -> Option<CodingPosition> {
    let (anchor, sign) = if cursor.eat("*") {
        (Anchor::Utr3, 1)
    } else if cursor.eat("-") {
        (Anchor::Cds, -1)
    } else {
        (Anchor::Cds, 1)
    };
    let position = sign * cursor.number()?;
    if position == 0 {
        return None;
    }

    let offset = if cursor.eat("+") {
        cursor.number()?
    } else if cursor.peek() == Some(b'-') {
        cursor.pos += 1;
        -cursor.number()?
    } else {
        0
    };

    Some(CodingPosition {
        anchor,
        position,
        offset,
    })
}

fn nucleotides<'a>(cursor: &mut Cursor<'a>) -> &'a str {
    cursor.take_while(|b| matches!(b, b'A' | b'C' | b'G' | b'T' | b'N'))
}

fn parse_edit(cursor: &mut Cursor<'_>, is_range: bool) -> Option<VariantEdit> {
    if cursor.eat("=") {
        return Some(VariantEdit::Identity);
    }
    if cursor.eat("delins") {
        let seq = nucleotides(cursor);
        return (!seq.is_empty()).then(|| VariantEdit::DelIns(seq.to_string()));
    }
    if cursor.eat("del") {
        let seq = nucleotides(cursor);
        return Some(VariantEdit::Deletion((!seq.is_empty()).then(|| seq.to_string())));
    }
    if cursor.eat("dup") {
        let seq = nucleotides(cursor);
        return Some(VariantEdit::Duplication((!seq.is_empty()).then(|| seq.to_string())));
    }
    if cursor.eat("ins") {
        let seq = nucleotides(cursor);
        // Une insertion se place entre deux positions
        return (is_range && !seq.is_empty()).then(|| VariantEdit::Insertion(seq.to_string()));
    }

    let reference = nucleotides(cursor);
    if is_range || reference.len() != 1 || !cursor.eat(">") {
        return None;
    }
    let alternate = nucleotides(cursor);
    if alternate.len() != 1 || alternate == reference {
        return None;
    }
    Some(VariantEdit::Substitution {
        reference: reference.chars().next()?,
        alternate: alternate.chars().next()?,
    })
}

/// Analyse une description `TRANSCRIT:c.POSITION[_POSITION]EDIT`
pub fn parse_hgvs(input: &str) -> Result<TranscriptVariant> {
    let invalid = || PrimerError::Parse(format!("variant HGVS invalide: '{input}'"));

    let (transcript, description) = input.split_once(':').ok_or_else(invalid)?;
    let transcript: TranscriptId = transcript.parse()?;

    let mut cursor = Cursor::new(description);
    if !cursor.eat("c.") {
        return Err(invalid());
    }

    let start = parse_position(&mut cursor).ok_or_else(invalid)?;
    let end = if cursor.eat("_") {
        Some(parse_position(&mut cursor).ok_or_else(invalid)?)
    } else {
        None
    };
    let edit = parse_edit(&mut cursor, end.is_some()).ok_or_else(invalid)?;

    if !cursor.rest().is_empty() {
        return Err(invalid());
    }

    Ok(TranscriptVariant {
        transcript,
        start,
        end,
        edit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_substitution() {
        let v = parse_hgvs("NM_000546.6:c.215C>G").unwrap();
        assert_eq!(v.transcript, TranscriptId::new("NM_000546", Some(6)));
        assert_eq!(v.start.position, 215);
        assert_eq!(v.start.offset, 0);
        assert!(v.end.is_none());
        assert_eq!(
            v.edit,
            VariantEdit::Substitution {
                reference: 'C',
                alternate: 'G'
            }
        );
        assert_eq!(v.to_string(), "NM_000546.6:c.215C>G");
    }

    #[test]
    fn test_parse_intronic_and_utr_positions() {
        let v = parse_hgvs("NM_000546.6:c.375+5G>A").unwrap();
        assert_eq!((v.start.position, v.start.offset), (375, 5));

        let v = parse_hgvs("NM_000546.6:c.-29-3T>C").unwrap();
        assert_eq!((v.start.position, v.start.offset), (-29, -3));

        let v = parse_hgvs("NM_000546.6:c.*12A>G").unwrap();
        assert_eq!(v.start.anchor, Anchor::Utr3);
        assert_eq!(v.start.position, 12);
    }

    #[test]
    fn test_parse_range_edits() {
        let v = parse_hgvs("NM_000546.6:c.215_217del").unwrap();
        assert_eq!(v.end.map(|p| p.position), Some(217));
        assert_eq!(v.edit, VariantEdit::Deletion(None));

        let v = parse_hgvs("NM_000546.6:c.215_216insTTA").unwrap();
        assert_eq!(v.edit, VariantEdit::Insertion("TTA".to_string()));

        let v = parse_hgvs("NM_000546.6:c.215_216delinsGG").unwrap();
        assert_eq!(v.edit, VariantEdit::DelIns("GG".to_string()));

        assert!(parse_hgvs("NM_000546.6:c.215dup").is_ok());
        assert!(parse_hgvs("NM_000546.6:c.215=").is_ok());
    }

    #[test]
    fn test_malformed_variants_are_parse_errors() {
        for bad in [
            "NM_000546.6c.215C>G",
            "NM_000546.6:g.215C>G",
            "NM_000546.6:c.215C>C",
            "NM_000546.6:c.215C>",
            "NM_000546.6:c.C>G",
            "NM_000546.6:c.0C>G",
            "NM_000546.6:c.215insA",
            "NM_000546.6:c.215C>G extra",
            "nm_000546.6:c.215C>G",
            "NM_.6:c.215C>G",
        ] {
            assert!(
                matches!(parse_hgvs(bad), Err(PrimerError::Parse(_))),
                "accepté à tort: {bad}"
            );
        }
    }

    #[test]
    fn test_transcript_id_without_version() {
        let id: TranscriptId = "ENST00000269305".parse().unwrap();
        assert_eq!(id.version, None);
        assert_eq!(id.with_version(9).to_string(), "ENST00000269305.9");
    }
}
