use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use kira_variant_counts::app::{App, ProgressEvent, ProgressSink};
use kira_variant_counts::cbioportal::CbioportalClient;
use kira_variant_counts::config::ResolvedConfig;
use kira_variant_counts::domain::{
    Gene, GeneSymbol, MolecularProfile, Mutation, MutationGene, SampleList, Study,
};
use kira_variant_counts::error::KiraError;
use kira_variant_counts::output::JsonOutput;

#[derive(Default)]
struct MockPortal {
    studies: Vec<Study>,
    profiles: HashMap<String, Vec<MolecularProfile>>,
    sample_lists: HashMap<String, Vec<SampleList>>,
    mutations: HashMap<(String, String), Vec<Mutation>>,
    fail_studies: bool,
}

impl MockPortal {
    fn with_study(
        mut self,
        study_id: &str,
        datatype: Option<&str>,
        sample_list: Option<&str>,
        mutations: Vec<Mutation>,
    ) -> Self {
        self.studies.push(Study {
            study_id: study_id.to_string(),
            name: None,
        });
        let profile_id = format!("{study_id}_mutations");
        let mut profiles = vec![MolecularProfile {
            molecular_profile_id: format!("{study_id}_gistic"),
            datatype: Some("DISCRETE".to_string()),
            molecular_alteration_type: Some("COPY_NUMBER_ALTERATION".to_string()),
            name: None,
        }];
        if let Some(datatype) = datatype {
            profiles.push(MolecularProfile {
                molecular_profile_id: profile_id.clone(),
                datatype: Some(datatype.to_string()),
                molecular_alteration_type: Some("MUTATION_EXTENDED".to_string()),
                name: None,
            });
        }
        self.profiles.insert(study_id.to_string(), profiles);
        let lists = sample_list
            .map(|id| {
                vec![SampleList {
                    sample_list_id: id.to_string(),
                    category: Some("all_cases_in_study".to_string()),
                    name: None,
                }]
            })
            .unwrap_or_default();
        if let Some(id) = sample_list {
            self.mutations.insert((profile_id, id.to_string()), mutations);
        }
        self.sample_lists.insert(study_id.to_string(), lists);
        self
    }
}

impl CbioportalClient for MockPortal {
    fn gene(&self, symbol: &GeneSymbol) -> Result<Gene, KiraError> {
        if symbol.as_str() != "GENEX" {
            return Err(KiraError::UnknownGene(symbol.to_string()));
        }
        Ok(Gene {
            entrez_gene_id: 4242,
            hugo_gene_symbol: "GENEX".to_string(),
            gene_type: None,
        })
    }

    fn studies(&self) -> Result<Vec<Study>, KiraError> {
        if self.fail_studies {
            return Err(KiraError::CbioportalStatus {
                status: 503,
                message: "maintenance".to_string(),
            });
        }
        Ok(self.studies.clone())
    }

    fn molecular_profiles(&self, study_id: &str) -> Result<Vec<MolecularProfile>, KiraError> {
        Ok(self.profiles.get(study_id).cloned().unwrap_or_default())
    }

    fn sample_lists(&self, study_id: &str) -> Result<Vec<SampleList>, KiraError> {
        Ok(self.sample_lists.get(study_id).cloned().unwrap_or_default())
    }

    fn mutations(
        &self,
        molecular_profile_id: &str,
        sample_list_id: &str,
        entrez_gene_id: i64,
    ) -> Result<Vec<Mutation>, KiraError> {
        assert_eq!(entrez_gene_id, 4242);
        Ok(self
            .mutations
            .get(&(molecular_profile_id.to_string(), sample_list_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct RecordingSink {
    events: RefCell<Vec<String>>,
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.events.borrow_mut().push(event.message);
    }
}

fn mutation(chr: Option<&str>, start: i64, alt: &str, sample: &str) -> Mutation {
    Mutation {
        gene: Some(MutationGene {
            hugo_gene_symbol: Some("GENEX".to_string()),
            entrez_gene_id: Some(4242),
        }),
        chr: chr.map(str::to_string),
        start_position: Some(start),
        end_position: Some(start),
        reference_allele: Some("A".to_string()),
        variant_allele: Some(alt.to_string()),
        sample_id: Some(sample.to_string()),
        study_id: None,
    }
}

fn config(dir: &std::path::Path, gene: &str) -> ResolvedConfig {
    let root = Utf8PathBuf::from_path_buf(dir.to_path_buf()).unwrap();
    ResolvedConfig {
        schema_version: 1,
        gene: gene.parse().unwrap(),
        base_url: "https://www.cbioportal.org/api".to_string(),
        output: root.join("counts.csv"),
        rows_output: Some(root.join("rows.csv")),
        timeout: Duration::from_secs(1),
    }
}

#[test]
fn overlapping_variants_across_two_studies() {
    let portal = MockPortal::default()
        .with_study(
            "study_a",
            Some("MAF"),
            Some("study_a_all"),
            vec![
                mutation(Some("1"), 100, "T", "S1"),
                mutation(Some("1"), 100, "T", "S2"),
                mutation(Some("2"), 500, "G", "S1"),
            ],
        )
        .with_study(
            "study_b",
            Some("MAF"),
            Some("study_b_all"),
            vec![
                mutation(Some("1"), 100, "T", "S3"),
                mutation(Some("1"), 100, "T", "S1"),
                mutation(None, 900, "C", "S4"),
            ],
        );
    let app = App::new(portal);
    let symbol: GeneSymbol = "GENEX".parse().unwrap();

    let analysis = app.analyze(&symbol, &JsonOutput).unwrap();
    assert_eq!(analysis.collection.table.len(), 6);
    assert_eq!(analysis.filtered.len(), 5);
    assert_eq!(analysis.counts.len(), 2);
    assert_eq!(analysis.counts[0].key.chromosome, "1");
    assert_eq!(analysis.counts[0].sample_count, 3);
    assert_eq!(analysis.counts[1].key.chromosome, "2");
    assert_eq!(analysis.counts[1].sample_count, 1);
}

#[test]
fn selects_maf_profile_and_first_sample_list() {
    let portal =
        MockPortal::default().with_study("study_a", Some("MAF"), Some("study_a_all"), vec![]);
    let app = App::new(portal);
    let symbol: GeneSymbol = "GENEX".parse().unwrap();
    let collection = app.collect(&symbol, &JsonOutput).unwrap();
    assert_eq!(collection.targets.len(), 1);
    assert_eq!(
        collection.targets[0].molecular_profile_id,
        "study_a_mutations"
    );
    assert_eq!(collection.targets[0].sample_list_id, "study_a_all");
}

#[test]
fn studies_without_profile_or_sample_list_are_skipped() {
    let portal = MockPortal::default()
        .with_study("no_maf", None, Some("no_maf_all"), vec![])
        .with_study("no_lists", Some("MAF"), None, vec![])
        .with_study(
            "good",
            Some("MAF"),
            Some("good_all"),
            vec![mutation(Some("3"), 7, "C", "S9")],
        );
    let app = App::new(portal);
    let sink = RecordingSink::default();
    let symbol: GeneSymbol = "GENEX".parse().unwrap();

    let collection = app.collect(&symbol, &sink).unwrap();
    assert_eq!(collection.studies_total, 3);
    assert_eq!(collection.targets.len(), 1);
    let skipped: Vec<_> = collection
        .skipped
        .iter()
        .map(|s| s.study_id.as_str())
        .collect();
    assert_eq!(skipped, vec!["no_maf", "no_lists"]);
    assert_eq!(collection.table.len(), 1);
    assert!(
        sink.events
            .borrow()
            .iter()
            .any(|message| message.contains("no_maf: skipped"))
    );
}

#[test]
fn run_writes_counts_and_rows() {
    let temp = tempfile::tempdir().unwrap();
    let portal = MockPortal::default().with_study(
        "study_a",
        Some("MAF"),
        Some("study_a_all"),
        vec![
            mutation(Some("1"), 100, "T", "S1"),
            mutation(Some("1"), 100, "T", "S2"),
            mutation(Some("1"), 100, "T", "S1"),
            mutation(None, 100, "T", "S5"),
        ],
    );
    let app = App::new(portal);
    let config = config(temp.path(), "GENEX");

    let summary = app.run(&config, &JsonOutput).unwrap();
    assert_eq!(summary.entrez_gene_id, 4242);
    assert_eq!(summary.rows_fetched, 4);
    assert_eq!(summary.rows_with_coordinates, 3);
    assert_eq!(summary.distinct_variants, 1);

    let counts = std::fs::read_to_string(temp.path().join("counts.csv")).unwrap();
    assert_eq!(
        counts,
        "Gene,chr,startPosition,endPosition,referenceAllele,variantAllele,sampleCount\n\
         GENEX,1,100,100,A,T,2\n"
    );
    let rows = std::fs::read_to_string(temp.path().join("rows.csv")).unwrap();
    assert_eq!(rows.lines().count(), 4);
}

#[test]
fn no_studies_produces_header_only_file() {
    let temp = tempfile::tempdir().unwrap();
    let app = App::new(MockPortal::default());
    let config = config(temp.path(), "GENEX");

    let summary = app.run(&config, &JsonOutput).unwrap();
    assert_eq!(summary.studies_total, 0);
    assert_eq!(summary.distinct_variants, 0);
    let counts = std::fs::read_to_string(temp.path().join("counts.csv")).unwrap();
    assert_eq!(counts.lines().count(), 1);
}

#[test]
fn unknown_gene_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let app = App::new(MockPortal::default());
    let config = config(temp.path(), "NOPE1");

    let err = app.run(&config, &JsonOutput).unwrap_err();
    assert_matches!(err, KiraError::UnknownGene(name) if name == "NOPE1");
    assert!(!temp.path().join("counts.csv").exists());
}

#[test]
fn remote_failure_aborts_without_output() {
    let temp = tempfile::tempdir().unwrap();
    let portal = MockPortal {
        fail_studies: true,
        ..MockPortal::default()
    };
    let app = App::new(portal);
    let config = config(temp.path(), "GENEX");

    let err = app.run(&config, &JsonOutput).unwrap_err();
    assert_matches!(err, KiraError::CbioportalStatus { status: 503, .. });
    assert!(err.is_remote());
    assert!(!temp.path().join("counts.csv").exists());
}
