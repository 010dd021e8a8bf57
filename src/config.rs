use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::cbioportal::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, normalize_base_url};
use crate::domain::GeneSymbol;
use crate::error::KiraError;

pub const CONFIG_FILE_NAME: &str = "kira-vc.json";
pub const DEFAULT_OUTPUT: &str = "variants_unique_samples_count.csv";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub gene: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub rows_output: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Values given on the command line; they take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub gene: Option<String>,
    pub base_url: Option<String>,
    pub output: Option<Utf8PathBuf>,
    pub rows_output: Option<Utf8PathBuf>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub gene: GeneSymbol,
    pub base_url: String,
    pub output: Utf8PathBuf,
    pub rows_output: Option<Utf8PathBuf>,
    pub timeout: Duration,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must be readable. Without one, `kira-vc.json` in the
    /// current directory and then the user config directory are tried, and a
    /// missing file means an empty config.
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, KiraError> {
        let config = match path {
            Some(path) => Self::read(PathBuf::from(path))?,
            None => match Self::discover() {
                Some(found) => Self::read(found)?,
                None => Config::default(),
            },
        };
        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, KiraError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let gene = overrides
            .gene
            .or(config.gene)
            .ok_or(KiraError::MissingGene)?
            .parse::<GeneSymbol>()?;

        let base_url = overrides
            .base_url
            .or(config.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = normalize_base_url(&base_url)?;

        let output = overrides
            .output
            .or_else(|| config.output.map(Utf8PathBuf::from))
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT));
        let rows_output = overrides
            .rows_output
            .or_else(|| config.rows_output.map(Utf8PathBuf::from));

        let timeout_secs = overrides
            .timeout_secs
            .or(config.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(ResolvedConfig {
            schema_version,
            gene,
            base_url,
            output,
            rows_output,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    fn read(path: PathBuf) -> Result<Config, KiraError> {
        let content = fs::read_to_string(&path).map_err(|_| KiraError::ConfigRead(path.clone()))?;
        serde_json::from_str(&content).map_err(|err| KiraError::ConfigParse(err.to_string()))
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        user_config_path().filter(|path| path.exists())
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "kira-variant-counts")
        .map(|dirs| dirs.config_dir().join("config.json"))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn defaults_apply() {
        let config = Config {
            gene: Some(" C1orf112 ".to_string()),
            ..Config::default()
        };
        let resolved = ConfigLoader::resolve_config(config, ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.gene.as_str(), "C1orf112");
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.output, Utf8PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(resolved.rows_output, None);
        assert_eq!(resolved.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn cli_overrides_file() {
        let config = Config {
            gene: Some("KRAS".to_string()),
            output: Some("file.csv".to_string()),
            timeout_secs: Some(5),
            ..Config::default()
        };
        let overrides = ConfigOverrides {
            gene: Some("TP53".to_string()),
            output: Some(Utf8PathBuf::from("cli.csv")),
            ..ConfigOverrides::default()
        };
        let resolved = ConfigLoader::resolve_config(config, overrides).unwrap();
        assert_eq!(resolved.gene.as_str(), "TP53");
        assert_eq!(resolved.output, Utf8PathBuf::from("cli.csv"));
        assert_eq!(resolved.timeout, Duration::from_secs(5));
    }

    #[test]
    fn gene_is_required() {
        let err = ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default())
            .unwrap_err();
        assert_matches!(err, KiraError::MissingGene);
    }
}
