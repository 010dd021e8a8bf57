use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{VariantCount, aggregate, drop_undefined_coordinates};
use crate::cbioportal::CbioportalClient;
use crate::config::ResolvedConfig;
use crate::domain::{Gene, GeneSymbol, StudyTarget, resolve_target};
use crate::error::KiraError;
use crate::export::{export_counts, export_rows};
use crate::table::{MutationRow, MutationTable};

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedStudy {
    pub study_id: String,
    pub reason: String,
}

/// Everything fetched for one gene, before filtering.
#[derive(Debug, Clone)]
pub struct Collection {
    pub gene: Gene,
    pub studies_total: usize,
    pub targets: Vec<StudyTarget>,
    pub skipped: Vec<SkippedStudy>,
    pub table: MutationTable,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub collection: Collection,
    pub filtered: Vec<MutationRow>,
    pub counts: Vec<VariantCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub gene: String,
    pub entrez_gene_id: i64,
    pub base_url: String,
    pub studies_total: usize,
    pub studies_queried: usize,
    pub studies_skipped: Vec<SkippedStudy>,
    pub rows_fetched: usize,
    pub rows_with_coordinates: usize,
    pub distinct_variants: usize,
    pub output: String,
    pub rows_output: Option<String>,
    pub generated_at: String,
}

pub struct App<C: CbioportalClient> {
    client: C,
}

impl<C: CbioportalClient> App<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Resolves the gene and pulls its mutations from every study that has a
    /// MAF profile and a sample list. Studies lacking either are skipped.
    pub fn collect(
        &self,
        symbol: &GeneSymbol,
        sink: &dyn ProgressSink,
    ) -> Result<Collection, KiraError> {
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; gene {symbol}"),
            elapsed: None,
        });
        let gene = self.client.gene(symbol)?;
        info!(
            gene = gene.hugo_gene_symbol.as_str(),
            entrez_gene_id = gene.entrez_gene_id,
            "resolved gene"
        );

        let studies = self.client.studies()?;
        info!(studies = studies.len(), "listed studies");

        let mut targets = Vec::new();
        let mut skipped = Vec::new();
        let mut table = MutationTable::new();

        for (index, study) in studies.iter().enumerate() {
            let study_id = study.study_id.as_str();
            let start = Instant::now();

            let profiles = self.client.molecular_profiles(study_id)?;
            let sample_lists = self.client.sample_lists(study_id)?;
            let target = match resolve_target(study_id, &profiles, &sample_lists) {
                Ok(target) => target,
                Err(err @ (KiraError::MissingProfile(_) | KiraError::MissingSampleList(_))) => {
                    warn!(study = study_id, "skipping study: {err}");
                    sink.event(ProgressEvent {
                        message: format!(
                            "study {}/{} {study_id}: skipped",
                            index + 1,
                            studies.len()
                        ),
                        elapsed: Some(start.elapsed()),
                    });
                    skipped.push(SkippedStudy {
                        study_id: study_id.to_string(),
                        reason: err.to_string(),
                    });
                    continue;
                }
                Err(err) => return Err(err),
            };

            let mutations = self.client.mutations(
                &target.molecular_profile_id,
                &target.sample_list_id,
                gene.entrez_gene_id,
            )?;
            let added = table.extend_from_mutations(&mutations);
            debug!(
                study = study_id,
                profile = target.molecular_profile_id.as_str(),
                sample_list = target.sample_list_id.as_str(),
                mutations = added,
                "fetched mutations"
            );
            sink.event(ProgressEvent {
                message: format!(
                    "study {}/{} {study_id}: {added} mutations",
                    index + 1,
                    studies.len()
                ),
                elapsed: Some(start.elapsed()),
            });
            targets.push(target);
        }

        info!(
            rows = table.len(),
            queried = targets.len(),
            skipped = skipped.len(),
            "collected mutation table"
        );

        Ok(Collection {
            gene,
            studies_total: studies.len(),
            targets,
            skipped,
            table,
        })
    }

    pub fn analyze(
        &self,
        symbol: &GeneSymbol,
        sink: &dyn ProgressSink,
    ) -> Result<Analysis, KiraError> {
        let collection = self.collect(symbol, sink)?;
        sink.event(ProgressEvent {
            message: "phase=Aggregate; counting samples per variant".to_string(),
            elapsed: None,
        });
        let filtered = drop_undefined_coordinates(collection.table.rows());
        let counts = aggregate(&filtered);
        info!(
            rows_with_coordinates = filtered.len(),
            variants = counts.len(),
            "aggregated variants"
        );
        Ok(Analysis {
            collection,
            filtered,
            counts,
        })
    }

    /// Full pipeline: fetch, aggregate, then write the outputs. Nothing is
    /// written unless every request succeeded.
    pub fn run(
        &self,
        config: &ResolvedConfig,
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary, KiraError> {
        let analysis = self.analyze(&config.gene, sink)?;

        sink.event(ProgressEvent {
            message: format!("phase=Store; writing {}", config.output),
            elapsed: None,
        });
        export_counts(&config.output, &analysis.counts)?;
        if let Some(rows_output) = &config.rows_output {
            export_rows(rows_output, &analysis.filtered)?;
        }

        Ok(build_summary(
            &analysis,
            &config.base_url,
            &config.output,
            config.rows_output.as_ref(),
        ))
    }
}

pub fn build_summary(
    analysis: &Analysis,
    base_url: &str,
    output: &Utf8PathBuf,
    rows_output: Option<&Utf8PathBuf>,
) -> RunSummary {
    let collection = &analysis.collection;
    RunSummary {
        gene: collection.gene.hugo_gene_symbol.clone(),
        entrez_gene_id: collection.gene.entrez_gene_id,
        base_url: base_url.to_string(),
        studies_total: collection.studies_total,
        studies_queried: collection.targets.len(),
        studies_skipped: collection.skipped.clone(),
        rows_fetched: collection.table.len(),
        rows_with_coordinates: analysis.filtered.len(),
        distinct_variants: analysis.counts.len(),
        output: output.to_string(),
        rows_output: rows_output.map(|path| path.to_string()),
        generated_at: chrono::Utc::now().to_rfc3339(),
    }
}
