use crate::domain::Mutation;

/// Column order of a flattened mutation row.
pub const ROW_COLUMNS: [&str; 7] = [
    "Gene",
    "chr",
    "startPosition",
    "endPosition",
    "referenceAllele",
    "variantAllele",
    "sampleId",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MutationRow {
    pub gene: Option<String>,
    pub chromosome: Option<String>,
    pub start_position: Option<i64>,
    pub end_position: Option<i64>,
    pub reference_allele: Option<String>,
    pub variant_allele: Option<String>,
    pub sample_id: Option<String>,
}

impl MutationRow {
    pub fn has_coordinates(&self) -> bool {
        self.chromosome.is_some() && self.start_position.is_some() && self.end_position.is_some()
    }
}

impl From<&Mutation> for MutationRow {
    fn from(mutation: &Mutation) -> Self {
        Self {
            gene: mutation
                .gene
                .as_ref()
                .and_then(|gene| gene.hugo_gene_symbol.clone()),
            chromosome: mutation.chr.clone(),
            start_position: mutation.start_position,
            end_position: mutation.end_position,
            reference_allele: mutation.reference_allele.clone(),
            variant_allele: mutation.variant_allele.clone(),
            sample_id: mutation.sample_id.clone(),
        }
    }
}

/// Flattened rows of every study, in fetch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationTable {
    rows: Vec<MutationRow>,
}

impl MutationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend_from_mutations(&mut self, mutations: &[Mutation]) -> usize {
        self.rows.reserve(mutations.len());
        self.rows.extend(mutations.iter().map(MutationRow::from));
        mutations.len()
    }

    pub fn rows(&self) -> &[MutationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
