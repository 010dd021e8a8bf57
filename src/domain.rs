use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::KiraError;

/// Datatype tag cBioPortal puts on mutation-calling molecular profiles.
pub const MAF_DATATYPE: &str = "MAF";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneSymbol(String);

impl GeneSymbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeneSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GeneSymbol {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        if !gene_symbol_regex().is_match(&normalized) {
            return Err(KiraError::InvalidGeneSymbol(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

fn gene_symbol_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-\.@_]{0,39}$").expect("valid gene symbol regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gene {
    pub entrez_gene_id: i64,
    pub hugo_gene_symbol: String,
    #[serde(default, rename = "type")]
    pub gene_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    pub study_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MolecularProfile {
    pub molecular_profile_id: String,
    #[serde(default)]
    pub datatype: Option<String>,
    #[serde(default)]
    pub molecular_alteration_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl MolecularProfile {
    pub fn is_mutation_profile(&self) -> bool {
        self.datatype.as_deref() == Some(MAF_DATATYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleList {
    pub sample_list_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationGene {
    #[serde(default)]
    pub hugo_gene_symbol: Option<String>,
    #[serde(default)]
    pub entrez_gene_id: Option<i64>,
}

/// One mutation as returned by the DETAILED projection. Every field the
/// aggregation looks at can be absent or null upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutation {
    #[serde(default)]
    pub gene: Option<MutationGene>,
    #[serde(default)]
    pub chr: Option<String>,
    #[serde(default)]
    pub start_position: Option<i64>,
    #[serde(default)]
    pub end_position: Option<i64>,
    #[serde(default)]
    pub reference_allele: Option<String>,
    #[serde(default)]
    pub variant_allele: Option<String>,
    #[serde(default)]
    pub sample_id: Option<String>,
    #[serde(default)]
    pub study_id: Option<String>,
}

/// The (profile, sample list) pair a study is queried with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyTarget {
    pub study_id: String,
    pub molecular_profile_id: String,
    pub sample_list_id: String,
}

/// Picks the mutation profile of a study. When a study carries several MAF
/// profiles the first one listed is used.
pub fn select_mutation_profile<'a>(
    study_id: &str,
    profiles: &'a [MolecularProfile],
) -> Result<&'a MolecularProfile, KiraError> {
    let mut candidates = profiles.iter().filter(|profile| profile.is_mutation_profile());
    let selected = candidates
        .next()
        .ok_or_else(|| KiraError::MissingProfile(study_id.to_string()))?;
    let extra = candidates.count();
    if extra > 0 {
        tracing::debug!(
            study = study_id,
            selected = selected.molecular_profile_id.as_str(),
            ignored = extra,
            "study has several MAF profiles"
        );
    }
    Ok(selected)
}

/// Picks the default sample list: the head of the category-sorted listing.
pub fn select_sample_list<'a>(
    study_id: &str,
    sample_lists: &'a [SampleList],
) -> Result<&'a SampleList, KiraError> {
    sample_lists
        .first()
        .ok_or_else(|| KiraError::MissingSampleList(study_id.to_string()))
}

pub fn resolve_target(
    study_id: &str,
    profiles: &[MolecularProfile],
    sample_lists: &[SampleList],
) -> Result<StudyTarget, KiraError> {
    let profile = select_mutation_profile(study_id, profiles)?;
    let sample_list = select_sample_list(study_id, sample_lists)?;
    Ok(StudyTarget {
        study_id: study_id.to_string(),
        molecular_profile_id: profile.molecular_profile_id.clone(),
        sample_list_id: sample_list.sample_list_id.clone(),
    })
}
