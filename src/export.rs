use std::fs;
use std::io::{self, BufWriter, Write};

use camino::Utf8Path;
use flate2::Compression;
use flate2::write::GzEncoder;

use crate::aggregate::VariantCount;
use crate::error::KiraError;
use crate::table::{MutationRow, ROW_COLUMNS};

pub const COUNT_COLUMNS: [&str; 7] = [
    "Gene",
    "chr",
    "startPosition",
    "endPosition",
    "referenceAllele",
    "variantAllele",
    "sampleCount",
];

pub fn write_counts<W: Write>(writer: W, counts: &[VariantCount]) -> Result<(), KiraError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(COUNT_COLUMNS)
        .map_err(|err| KiraError::Csv(err.to_string()))?;
    for count in counts {
        let key = &count.key;
        csv.write_record([
            key.gene.clone(),
            key.chromosome.clone(),
            key.start_position.to_string(),
            key.end_position.to_string(),
            key.reference_allele.clone(),
            key.variant_allele.clone(),
            count.sample_count.to_string(),
        ])
        .map_err(|err| KiraError::Csv(err.to_string()))?;
    }
    csv.flush().map_err(|err| KiraError::Csv(err.to_string()))
}

/// Missing values are written as empty fields.
pub fn write_rows<W: Write>(writer: W, rows: &[MutationRow]) -> Result<(), KiraError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(ROW_COLUMNS)
        .map_err(|err| KiraError::Csv(err.to_string()))?;
    for row in rows {
        csv.write_record([
            row.gene.clone().unwrap_or_default(),
            row.chromosome.clone().unwrap_or_default(),
            row.start_position.map(|v| v.to_string()).unwrap_or_default(),
            row.end_position.map(|v| v.to_string()).unwrap_or_default(),
            row.reference_allele.clone().unwrap_or_default(),
            row.variant_allele.clone().unwrap_or_default(),
            row.sample_id.clone().unwrap_or_default(),
        ])
        .map_err(|err| KiraError::Csv(err.to_string()))?;
    }
    csv.flush().map_err(|err| KiraError::Csv(err.to_string()))
}

pub fn export_counts(path: &Utf8Path, counts: &[VariantCount]) -> Result<(), KiraError> {
    write_file_atomic(path, |writer| write_counts(writer, counts))
}

pub fn export_rows(path: &Utf8Path, rows: &[MutationRow]) -> Result<(), KiraError> {
    write_file_atomic(path, |writer| write_rows(writer, rows))
}

pub fn is_gzip_path(path: &Utf8Path) -> bool {
    path.extension().map(|ext| ext == "gz").unwrap_or(false)
}

/// Writes through a temp file in the destination directory and renames it
/// into place, gzip-compressing when the path ends in `.gz`.
fn write_file_atomic<F>(path: &Utf8Path, write: F) -> Result<(), KiraError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), KiraError>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    let temp = tempfile::Builder::new()
        .prefix("kira-vc-out")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;

    {
        let mut buffered = BufWriter::new(temp.as_file());
        if is_gzip_path(path) {
            let mut encoder = GzEncoder::new(&mut buffered, Compression::default());
            write(&mut encoder)?;
            encoder
                .finish()
                .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        } else {
            write(&mut buffered)?;
        }
        buffered
            .flush()
            .map_err(|err: io::Error| KiraError::Filesystem(err.to_string()))?;
    }

    temp.persist(path.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    Ok(())
}
