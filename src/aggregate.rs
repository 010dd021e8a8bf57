use std::collections::{BTreeMap, HashSet};

use crate::table::MutationRow;

/// Fields that identify a variant. Ordering is field by field, with the
/// chromosome compared as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariantKey {
    pub gene: String,
    pub chromosome: String,
    pub start_position: i64,
    pub end_position: i64,
    pub reference_allele: String,
    pub variant_allele: String,
}

impl VariantKey {
    /// `None` when any key field is missing.
    pub fn from_row(row: &MutationRow) -> Option<Self> {
        Some(Self {
            gene: row.gene.clone()?,
            chromosome: row.chromosome.clone()?,
            start_position: row.start_position?,
            end_position: row.end_position?,
            reference_allele: row.reference_allele.clone()?,
            variant_allele: row.variant_allele.clone()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCount {
    pub key: VariantKey,
    pub sample_count: usize,
}

pub fn drop_undefined_coordinates(rows: &[MutationRow]) -> Vec<MutationRow> {
    rows.iter()
        .filter(|row| row.has_coordinates())
        .cloned()
        .collect()
}

/// Groups rows by [`VariantKey`] and counts distinct sample ids per group.
///
/// Rows without coordinates are dropped first. Rows whose gene or alleles are
/// missing have no key and do not form a group; a null sample id does not
/// count as a sample. The result is sorted by key.
pub fn aggregate(rows: &[MutationRow]) -> Vec<VariantCount> {
    let mut groups: BTreeMap<VariantKey, HashSet<&str>> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.has_coordinates()) {
        let Some(key) = VariantKey::from_row(row) else {
            continue;
        };
        let samples = groups.entry(key).or_default();
        if let Some(sample) = row.sample_id.as_deref() {
            samples.insert(sample);
        }
    }

    groups
        .into_iter()
        .map(|(key, samples)| VariantCount {
            key,
            sample_count: samples.len(),
        })
        .collect()
}
