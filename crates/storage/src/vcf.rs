//! Source de variants lue depuis un VCF/BCF indexé (tabix ou CSI)

use std::fmt;
use std::path::{Path, PathBuf};

use amorce_core::{PrimerError, VariantRecord, VariantSource};
use parking_lot::Mutex;
use rust_htslib::bcf::{self, Read};
use tracing::{debug, info};

use crate::{Result, StorageError};

/// Base de variants interrogée par intervalle; seuls les enregistrements
/// de la région demandée sont lus
pub struct VcfVariantSource {
    name: String,
    path: PathBuf,
    contigs: Vec<String>,
    reader: Mutex<bcf::IndexedReader>,
}

impl fmt::Debug for VcfVariantSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VcfVariantSource")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("contigs", &self.contigs.len())
            .finish()
    }
}

impl VcfVariantSource {
    /// Ouvre le fichier et son index (`.tbi` ou `.csi` à côté du fichier)
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = bcf::IndexedReader::from_path(path).map_err(|e| StorageError::Vcf {
            path: path.to_path_buf(),
            message: format!("ouverture impossible (fichier bgzip indexé attendu): {e}"),
        })?;

        let header = reader.header();
        let contigs = (0..header.contig_count())
            .map(|rid| header.rid2name(rid).map(|n| String::from_utf8_lossy(n).into_owned()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let name = name.into();
        info!("{}: {} contigs indexés dans {}", name, contigs.len(), path.display());

        Ok(Self {
            name,
            path: path.to_path_buf(),
            contigs,
            reader: Mutex::new(reader),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Contigs déclarés dans l'en-tête
    pub fn contigs(&self) -> &[String] {
        &self.contigs
    }

    fn query_error(&self, error: rust_htslib::errors::Error) -> PrimerError {
        PrimerError::VariantQuery {
            name: self.name.clone(),
            message: error.to_string(),
        }
    }
}

impl VariantSource for VcfVariantSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn overlapping(&self, chrom: &str, start: u64, end: u64) -> amorce_core::Result<Vec<VariantRecord>> {
        if end <= start {
            return Ok(Vec::new());
        }
        let mut reader = self.reader.lock();
        let Ok(rid) = reader.header().name2rid(chrom.as_bytes()) else {
            return Ok(Vec::new());
        };
        // Fin incluse pour htslib
        reader
            .fetch(rid, start, Some(end - 1))
            .map_err(|e| self.query_error(e))?;

        let mut found = Vec::new();
        let mut skipped = 0usize;
        for record in reader.records() {
            let record = record.map_err(|e| self.query_error(e))?;
            let alleles = split_alleles(chrom, &record);
            if alleles.is_empty() {
                skipped += 1;
            }
            found.extend(alleles.into_iter().filter(|r| r.overlaps(chrom, start, end)));
        }
        if skipped > 0 {
            debug!("{}: {} sites sans allèle exploitable ignorés", self.name, skipped);
        }
        Ok(found)
    }
}

/// Un enregistrement par allèle alternatif exploitable
fn split_alleles(chrom: &str, record: &bcf::Record) -> Vec<VariantRecord> {
    let alleles = record.alleles();
    let Some((reference, alternates)) = alleles.split_first() else {
        return Vec::new();
    };
    let reference = String::from_utf8_lossy(reference).to_ascii_uppercase();
    let id = record.id();
    let id = (id.as_slice() != b".").then(|| String::from_utf8_lossy(&id).into_owned());
    let frequencies = allele_frequencies(record);

    alternates
        .iter()
        .enumerate()
        .filter(|(_, alt)| is_sequence_allele(alt))
        .map(|(i, alt)| VariantRecord {
            chrom: chrom.to_string(),
            position: record.pos().max(0) as u64,
            reference: reference.clone(),
            alternate: String::from_utf8_lossy(alt).to_ascii_uppercase(),
            frequency: frequencies.get(i).copied().unwrap_or(0.0),
            id: id.clone(),
        })
        .collect()
}

fn is_sequence_allele(allele: &[u8]) -> bool {
    !allele.is_empty()
        && allele
            .iter()
            .all(|b| matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T' | b'N'))
}

/// Valeurs du champ INFO `AF`, une par allèle alternatif; absent ou
/// non déclaré dans l'en-tête, il vaut 0
fn allele_frequencies(record: &bcf::Record) -> Vec<f64> {
    match record.info(b"AF").float() {
        Ok(Some(values)) => values
            .iter()
            .map(|&v| if v.is_nan() { 0.0 } else { f64::from(v) })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_htslib::bcf::index;
    use rust_htslib::bgzf;
    use std::io::Write;

    const VCF: &str = "##fileformat=VCFv4.2\n\
##INFO=<ID=AC,Number=A,Type=Integer,Description=\"Allele count\">\n\
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele frequency\">\n\
##contig=<ID=chr1,length=1000>\n\
##contig=<ID=chr2,length=1000>\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
chr1\t101\trs1\tA\tG\t.\tPASS\tAC=3;AF=0.25\n\
chr1\t201\t.\tC\tT,<DEL>,A\t.\tPASS\tAF=0.1,0.2,0.3\n\
chr1\t295\trs3\tACGTACGTAC\tA\t.\tPASS\tAF=0.05\n\
chr1\t400\trs5\tT\tC\t.\tPASS\tAC=1\n\
chr2\t50\trs4\tG\t*\t.\tPASS\tAF=0.5\n";

    fn write_indexed(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("dbsnp.vcf.gz");
        let mut writer = bgzf::Writer::from_path(&path).unwrap();
        writer.write_all(text.as_bytes()).unwrap();
        drop(writer);
        index::build(&path, None, 1, index::Type::Tbx).unwrap();
        path
    }

    fn source() -> (tempfile::TempDir, VcfVariantSource) {
        let dir = tempfile::tempdir().unwrap();
        let path = write_indexed(dir.path(), VCF);
        let source = VcfVariantSource::open("dbSNP", &path).unwrap();
        (dir, source)
    }

    #[test]
    fn test_records_are_zero_based() {
        let (_dir, source) = source();
        assert_eq!(source.name(), "dbSNP");
        assert_eq!(source.contigs(), ["chr1".to_string(), "chr2".to_string()]);

        let hits = source.overlapping("chr1", 100, 101).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].position, 100);
        assert_eq!(hits[0].id.as_deref(), Some("rs1"));
        assert!((hits[0].frequency - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_multiallelic_frequencies_follow_alleles() {
        let (_dir, source) = source();
        let hits = source.overlapping("chr1", 200, 201).unwrap();
        let alleles: Vec<&str> = hits.iter().map(|r| r.alternate.as_str()).collect();
        assert_eq!(alleles, vec!["T", "A"]);
        assert!((hits[0].frequency - 0.1).abs() < 1e-6);
        assert!((hits[1].frequency - 0.3).abs() < 1e-6);
        assert!(hits.iter().all(|r| r.id.is_none()));
    }

    #[test]
    fn test_missing_frequency_defaults_to_zero() {
        let (_dir, source) = source();
        let hits = source.overlapping("chr1", 399, 400).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].frequency, 0.0);
        // L'allèle `*` n'est pas une séquence
        assert!(source.overlapping("chr2", 0, 100).unwrap().is_empty());
    }

    #[test]
    fn test_long_reference_overlaps_from_the_left() {
        let (_dir, source) = source();
        // rs3 couvre [294, 304)
        let hits = source.overlapping("chr1", 300, 310).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_deref(), Some("rs3"));
        assert!(source.overlapping("chr1", 304, 310).unwrap().is_empty());
        assert!(source.overlapping("chr3", 0, 1000).unwrap().is_empty());
    }

    #[test]
    fn test_repeated_queries_reuse_the_reader() {
        let (_dir, source) = source();
        assert_eq!(source.overlapping("chr1", 0, 1000).unwrap().len(), 5);
        assert_eq!(source.overlapping("chr1", 100, 101).unwrap().len(), 1);
        assert_eq!(source.overlapping("chr1", 0, 1000).unwrap().len(), 5);
    }

    #[test]
    fn test_unindexed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.vcf");
        std::fs::write(&path, VCF).unwrap();
        match VcfVariantSource::open("plain", &path) {
            Err(StorageError::Vcf { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("résultat inattendu: {other:?}"),
        }
    }
}
