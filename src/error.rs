use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid gene symbol: {0}")]
    #[diagnostic(help("use an HGNC symbol such as TP53 or TNFRSF10B"))]
    InvalidGeneSymbol(String),

    #[error("gene not found in cBioPortal: {0}")]
    UnknownGene(String),

    #[error("no gene given (pass it as an argument or set \"gene\" in the config file)")]
    MissingGene,

    #[error("study {0} has no MAF mutation profile")]
    MissingProfile(String),

    #[error("study {0} has no sample lists")]
    MissingSampleList(String),

    #[error("cBioPortal request failed: {0}")]
    CbioportalHttp(String),

    #[error("cBioPortal returned status {status}: {message}")]
    CbioportalStatus { status: u16, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to write CSV: {0}")]
    Csv(String),
}

impl KiraError {
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            KiraError::CbioportalHttp(_) | KiraError::CbioportalStatus { .. }
        )
    }
}
