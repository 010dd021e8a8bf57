use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;

use crate::domain::{Gene, GeneSymbol, MolecularProfile, Mutation, SampleList, Study};
use crate::error::KiraError;

pub const DEFAULT_BASE_URL: &str = "https://www.cbioportal.org/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const TOKEN_ENV: &str = "CBIOPORTAL_TOKEN";

/// The five cBioPortal operations the pipeline needs.
pub trait CbioportalClient {
    fn gene(&self, symbol: &GeneSymbol) -> Result<Gene, KiraError>;
    fn studies(&self) -> Result<Vec<Study>, KiraError>;
    fn molecular_profiles(&self, study_id: &str) -> Result<Vec<MolecularProfile>, KiraError>;
    fn sample_lists(&self, study_id: &str) -> Result<Vec<SampleList>, KiraError>;
    fn mutations(
        &self,
        molecular_profile_id: &str,
        sample_list_id: &str,
        entrez_gene_id: i64,
    ) -> Result<Vec<Mutation>, KiraError>;
}

#[derive(Clone)]
pub struct CbioportalHttpClient {
    client: Client,
    base_url: String,
}

impl CbioportalHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-vc/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KiraError::CbioportalHttp(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                        .map_err(|err| KiraError::CbioportalHttp(err.to_string()))?,
                );
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| KiraError::CbioportalHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send(request: RequestBuilder) -> Result<Response, KiraError> {
        request
            .send()
            .map_err(|err| KiraError::CbioportalHttp(err.to_string()))
    }

    fn handle_status(response: Response) -> Result<Response, KiraError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "cBioPortal request failed".to_string());
        Err(KiraError::CbioportalStatus { status, message })
    }

    fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, KiraError> {
        let response = Self::handle_status(Self::send(request)?)?;
        response
            .json()
            .map_err(|err| KiraError::CbioportalHttp(err.to_string()))
    }
}

impl CbioportalClient for CbioportalHttpClient {
    fn gene(&self, symbol: &GeneSymbol) -> Result<Gene, KiraError> {
        let url = self.url(&format!("genes/{}", symbol.as_str()));
        let response = Self::send(self.client.get(&url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(KiraError::UnknownGene(symbol.to_string()));
        }
        let response = Self::handle_status(response)?;
        let raw: serde_json::Value = response
            .json()
            .map_err(|err| KiraError::CbioportalHttp(err.to_string()))?;
        parse_gene(symbol, raw)
    }

    fn studies(&self) -> Result<Vec<Study>, KiraError> {
        let url = self.url("studies");
        self.get_json(self.client.get(&url).query(&[("projection", "SUMMARY")]))
    }

    fn molecular_profiles(&self, study_id: &str) -> Result<Vec<MolecularProfile>, KiraError> {
        let url = self.url(&format!("studies/{study_id}/molecular-profiles"));
        self.get_json(self.client.get(&url))
    }

    fn sample_lists(&self, study_id: &str) -> Result<Vec<SampleList>, KiraError> {
        let url = self.url(&format!("studies/{study_id}/sample-lists"));
        self.get_json(self.client.get(&url).query(&[("sortBy", "category")]))
    }

    fn mutations(
        &self,
        molecular_profile_id: &str,
        sample_list_id: &str,
        entrez_gene_id: i64,
    ) -> Result<Vec<Mutation>, KiraError> {
        let url = self.url(&format!("molecular-profiles/{molecular_profile_id}/mutations"));
        let entrez = entrez_gene_id.to_string();
        self.get_json(self.client.get(&url).query(&[
            ("sampleListId", sample_list_id),
            ("entrezGeneId", entrez.as_str()),
            ("projection", "DETAILED"),
        ]))
    }
}

/// A gene lookup answer without an Entrez id is treated like a miss.
pub fn parse_gene(symbol: &GeneSymbol, raw: serde_json::Value) -> Result<Gene, KiraError> {
    let has_id = raw
        .get("entrezGeneId")
        .map(|value| value.is_i64() || value.is_u64())
        .unwrap_or(false);
    if !has_id {
        return Err(KiraError::UnknownGene(symbol.to_string()));
    }
    serde_json::from_value(raw).map_err(|err| KiraError::CbioportalHttp(err.to_string()))
}

pub fn normalize_base_url(base_url: &str) -> Result<String, KiraError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Err(KiraError::InvalidBaseUrl(base_url.to_string()));
    }
    Ok(trimmed.to_string())
}
