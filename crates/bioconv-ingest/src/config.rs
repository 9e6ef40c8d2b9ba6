//! Converter configuration
//!
//! Settings come from an optional TOML file (`bioconv.toml` by default),
//! then `BIOCONV_*` environment variables, then command-line flags, each
//! layer overriding the previous one.
//!
//! ```toml
//! output = "items.jsonl"
//! report = "report.json"
//!
//! [defaults]
//! malformed_rows = "skip"
//! unknown_lookups = "skip"
//!
//! [sources.mirtarbase]
//! mirna_map = "data/mirna_accessions.tsv"
//!
//! [sources.gene_orthologs]
//! organisms = ["9606", "10090", "10116"]
//! ```

use crate::converters::{
    ccsb::CcsbOptions, chembl_hierarchy::ChemblHierarchyOptions, chembl_hierarchy::HierarchySource,
    disgenet::DisgenetOptions, gene_orthologs::GeneOrthologsOptions, mirtarbase::MirtarbaseOptions,
    nci_pathway::NciPathwayOptions, predicted_ppi::PredictedPpiOptions, ConverterKind,
};
use crate::framework::{MalformedRowPolicy, UnknownLookupPolicy};
use bioconv_common::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "bioconv.toml";

/// Output path meaning "write items to stdout"
pub const STDOUT_OUTPUT: &str = "-";

/// Row and lookup policies applied to every converter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunPolicy {
    pub malformed_rows: MalformedRowPolicy,
    pub unknown_lookups: UnknownLookupPolicy,
}

/// Per-converter option tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub ccsb: CcsbOptions,
    pub predicted_ppi: PredictedPpiOptions,
    pub mirtarbase: MirtarbaseOptions,
    pub chembl_hierarchy: ChemblHierarchyOptions,
    pub nci_pathway: NciPathwayOptions,
    pub disgenet: DisgenetOptions,
    pub gene_orthologs: GeneOrthologsOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// JSON-lines item output; `-` or unset means stdout
    pub output: Option<PathBuf>,

    /// Where to write the run report (JSON)
    pub report: Option<PathBuf>,

    pub defaults: RunPolicy,

    pub sources: SourcesConfig,
}

impl ConvertConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConvertError::config(format!("Invalid configuration: {}", e)))
    }

    /// Read a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConvertError::config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load the effective configuration
    ///
    /// An explicit `path` must exist; otherwise `bioconv.toml` is used when
    /// present. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };
        config.merge_env()
    }

    /// Apply environment overrides
    ///
    /// - `BIOCONV_OUTPUT`: item output path
    /// - `BIOCONV_REPORT`: run report path
    /// - `BIOCONV_MALFORMED_ROWS`: skip, fail
    /// - `BIOCONV_UNKNOWN_LOOKUPS`: skip, fail
    /// - `BIOCONV_DATABASE_URL`: ChEMBL database URL
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(output) = std::env::var("BIOCONV_OUTPUT") {
            self.output = Some(PathBuf::from(output));
        }
        if let Ok(report) = std::env::var("BIOCONV_REPORT") {
            self.report = Some(PathBuf::from(report));
        }
        if let Ok(policy) = std::env::var("BIOCONV_MALFORMED_ROWS") {
            self.defaults.malformed_rows = policy.parse()?;
        }
        if let Ok(policy) = std::env::var("BIOCONV_UNKNOWN_LOOKUPS") {
            self.defaults.unknown_lookups = policy.parse()?;
        }
        if let Ok(url) = std::env::var("BIOCONV_DATABASE_URL") {
            self.sources.chembl_hierarchy.database_url = Some(url);
        }
        Ok(self)
    }

    /// Whether items go to stdout
    pub fn writes_to_stdout(&self) -> bool {
        self.output
            .as_deref()
            .is_none_or(|path| path.as_os_str() == STDOUT_OUTPUT)
    }

    /// Check that a converter has everything it needs before it runs
    pub fn validate(&self, kind: ConverterKind) -> Result<()> {
        let sources = &self.sources;
        match kind {
            ConverterKind::PredictedPpi => {
                require_file(&sources.predicted_ppi.gene_map, "predicted_ppi.gene_map")?;
            },
            ConverterKind::Mirtarbase => {
                require_file(&sources.mirtarbase.mirna_map, "mirtarbase.mirna_map")?;
            },
            ConverterKind::Disgenet => {
                require_file(&sources.disgenet.pmid_file, "disgenet.pmid_file")?;
                require_file(&sources.disgenet.disease_map_file, "disgenet.disease_map_file")?;
            },
            ConverterKind::GeneOrthologs => {
                if sources.gene_orthologs.organisms.is_empty() {
                    return Err(ConvertError::MissingOption("gene_orthologs.organisms"));
                }
            },
            ConverterKind::ChemblHierarchy => {
                let options = &sources.chembl_hierarchy;
                if options.source == HierarchySource::Database && options.database_url.is_none() {
                    return Err(ConvertError::MissingOption("chembl_hierarchy.database_url"));
                }
            },
            ConverterKind::Ccsb => {
                require_non_empty(&sources.ccsb.taxon_id, "ccsb.taxon_id")?;
            },
            ConverterKind::NciPathway => {
                require_non_empty(&sources.nci_pathway.taxon_id, "nci_pathway.taxon_id")?;
            },
            ConverterKind::Htridb | ConverterKind::Atc | ConverterKind::ProteinOrtholog | ConverterKind::DoMesh => {},
        }

        debug!(converter = kind.name(), "Configuration validated");
        Ok(())
    }
}

fn require_file(path: &Option<PathBuf>, option: &'static str) -> Result<()> {
    let Some(path) = path else {
        return Err(ConvertError::MissingOption(option));
    };
    if !path.is_file() {
        return Err(ConvertError::config(format!("{} not found: {}", option, path.display())));
    }
    Ok(())
}

fn require_non_empty(value: &str, option: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConvertError::MissingOption(option));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::default();
        assert!(config.writes_to_stdout());
        assert_eq!(config.defaults.malformed_rows, MalformedRowPolicy::Fail);
        assert_eq!(config.defaults.unknown_lookups, UnknownLookupPolicy::Skip);
        assert_eq!(config.sources.ccsb.taxon_id, "9606");
        assert_eq!(config.sources.mirtarbase.header_lines, 1);
    }

    #[test]
    fn test_parse_toml() {
        let config = ConvertConfig::from_toml_str(
            r#"
            output = "items.jsonl"

            [defaults]
            malformed_rows = "skip"

            [sources.gene_orthologs]
            organisms = ["9606", "10090"]

            [sources.chembl_hierarchy]
            source = "database"
            database_url = "postgres://localhost/chembl"
            "#,
        )
        .unwrap();

        assert_eq!(config.output, Some(PathBuf::from("items.jsonl")));
        assert!(!config.writes_to_stdout());
        assert_eq!(config.defaults.malformed_rows, MalformedRowPolicy::Skip);
        assert_eq!(config.sources.gene_orthologs.organisms, vec!["9606", "10090"]);
        assert_eq!(config.sources.chembl_hierarchy.source, HierarchySource::Database);
        assert_eq!(config.sources.ccsb.taxon_id, "9606");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ConvertConfig::from_toml_str("[defaults]\nmalformed_rows = \"sometimes\"\n").unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    #[test]
    fn test_dash_output_means_stdout() {
        let config = ConvertConfig {
            output: Some(PathBuf::from("-")),
            ..ConvertConfig::default()
        };
        assert!(config.writes_to_stdout());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("BIOCONV_MALFORMED_ROWS", "skip");
        std::env::set_var("BIOCONV_OUTPUT", "/tmp/out.jsonl");

        let config = ConvertConfig::default().merge_env().unwrap();
        assert_eq!(config.defaults.malformed_rows, MalformedRowPolicy::Skip);
        assert_eq!(config.output, Some(PathBuf::from("/tmp/out.jsonl")));

        std::env::remove_var("BIOCONV_MALFORMED_ROWS");
        std::env::remove_var("BIOCONV_OUTPUT");
    }

    #[test]
    #[serial]
    fn test_bad_env_policy_is_rejected() {
        std::env::set_var("BIOCONV_UNKNOWN_LOOKUPS", "perhaps");
        let result = ConvertConfig::default().merge_env();
        std::env::remove_var("BIOCONV_UNKNOWN_LOOKUPS");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "report = \"report.json\"").unwrap();
        file.flush().unwrap();

        let config = ConvertConfig::from_file(file.path()).unwrap();
        assert_eq!(config.report, Some(PathBuf::from("report.json")));
        assert!(ConvertConfig::from_file("/no/such/bioconv.toml").is_err());
    }

    #[test]
    fn test_validate_required_options() {
        let mut config = ConvertConfig::default();
        assert!(matches!(
            config.validate(ConverterKind::GeneOrthologs),
            Err(ConvertError::MissingOption("gene_orthologs.organisms"))
        ));
        assert!(matches!(
            config.validate(ConverterKind::Mirtarbase),
            Err(ConvertError::MissingOption("mirtarbase.mirna_map"))
        ));
        assert!(config.validate(ConverterKind::Atc).is_ok());

        config.sources.mirtarbase.mirna_map = Some(PathBuf::from("/no/such/map.tsv"));
        assert!(matches!(config.validate(ConverterKind::Mirtarbase), Err(ConvertError::Config(_))));

        let map = tempfile::NamedTempFile::new().unwrap();
        config.sources.mirtarbase.mirna_map = Some(map.path().to_path_buf());
        assert!(config.validate(ConverterKind::Mirtarbase).is_ok());

        config.sources.chembl_hierarchy.source = HierarchySource::Database;
        assert!(config.validate(ConverterKind::ChemblHierarchy).is_err());
    }
}
