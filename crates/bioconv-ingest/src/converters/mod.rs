//! Concrete converters, one module per data source

pub mod atc;
pub mod ccsb;
pub mod chembl_hierarchy;
pub mod disgenet;
pub mod do_mesh;
pub mod gene_orthologs;
pub mod htridb;
pub mod mirtarbase;
pub mod nci_pathway;
pub mod predicted_ppi;
pub mod protein_ortholog;

pub use atc::AtcConverter;
pub use ccsb::CcsbConverter;
pub use chembl_hierarchy::ChemblHierarchyConverter;
pub use disgenet::DisgenetConverter;
pub use do_mesh::DoMeshConverter;
pub use gene_orthologs::GeneOrthologsConverter;
pub use htridb::HtridbConverter;
pub use mirtarbase::MirtarbaseConverter;
pub use nci_pathway::NciPathwayConverter;
pub use predicted_ppi::PredictedPpiConverter;
pub use protein_ortholog::ProteinOrthologConverter;

use crate::config::ConvertConfig;
use crate::framework::{open_input, Converter, Delimiter, LookupTable};
use bioconv_common::{ConvertError, Result};
use chembl_hierarchy::HierarchySource;
use std::path::Path;
use tracing::info;

/// Every available converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConverterKind {
    Ccsb,
    PredictedPpi,
    Htridb,
    Mirtarbase,
    Atc,
    ChemblHierarchy,
    ProteinOrtholog,
    NciPathway,
    Disgenet,
    DoMesh,
    GeneOrthologs,
}

impl ConverterKind {
    pub const ALL: [ConverterKind; 11] = [
        ConverterKind::Ccsb,
        ConverterKind::PredictedPpi,
        ConverterKind::Htridb,
        ConverterKind::Mirtarbase,
        ConverterKind::Atc,
        ConverterKind::ChemblHierarchy,
        ConverterKind::ProteinOrtholog,
        ConverterKind::NciPathway,
        ConverterKind::Disgenet,
        ConverterKind::DoMesh,
        ConverterKind::GeneOrthologs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConverterKind::Ccsb => "ccsb",
            ConverterKind::PredictedPpi => "predicted-ppi",
            ConverterKind::Htridb => "htridb",
            ConverterKind::Mirtarbase => "mirtarbase",
            ConverterKind::Atc => "atc",
            ConverterKind::ChemblHierarchy => "chembl-hierarchy",
            ConverterKind::ProteinOrtholog => "protein-ortholog",
            ConverterKind::NciPathway => "nci-pathway",
            ConverterKind::Disgenet => "disgenet",
            ConverterKind::DoMesh => "do-mesh",
            ConverterKind::GeneOrthologs => "gene-orthologs",
        }
    }

    /// Whether a run reads an input file
    pub fn reads_file(self, config: &ConvertConfig) -> bool {
        !(self == ConverterKind::ChemblHierarchy
            && config.sources.chembl_hierarchy.source == HierarchySource::Database)
    }
}

impl std::fmt::Display for ConverterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ConverterKind {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        ConverterKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ConvertError::parse(format!("Unknown converter: {}", s)))
    }
}

fn load_table(
    path: Option<&Path>,
    option: &'static str,
    header_lines: usize,
    key_column: usize,
    value_column: usize,
) -> Result<LookupTable> {
    let path = path.ok_or(ConvertError::MissingOption(option))?;
    let table = LookupTable::load(open_input(path)?, Delimiter::Tab, header_lines, key_column, value_column)?;
    info!(path = %path.display(), keys = table.len(), "Loaded {}", option);
    Ok(table)
}

/// Build a configured converter, loading its auxiliary tables
///
/// Async only because the ChEMBL hierarchy may be read from a database.
pub async fn build(kind: ConverterKind, config: &ConvertConfig) -> Result<Box<dyn Converter>> {
    config.validate(kind)?;
    let sources = &config.sources;
    let rows = config.defaults.malformed_rows;
    let unknown = config.defaults.unknown_lookups;

    let converter: Box<dyn Converter> = match kind {
        ConverterKind::Ccsb => Box::new(CcsbConverter::new(sources.ccsb.clone()).with_policy(rows)),
        ConverterKind::PredictedPpi => {
            let options = &sources.predicted_ppi;
            let genes = load_table(
                options.gene_map.as_deref(),
                "predicted_ppi.gene_map",
                options.gene_map_header_lines,
                0,
                1,
            )?;
            Box::new(
                PredictedPpiConverter::new(genes)
                    .with_policy(rows)
                    .with_unknown_lookups(unknown),
            )
        },
        ConverterKind::Htridb => Box::new(HtridbConverter::new().with_policy(rows)),
        ConverterKind::Mirtarbase => {
            let options = &sources.mirtarbase;
            let accessions = load_table(options.mirna_map.as_deref(), "mirtarbase.mirna_map", 0, 0, 1)?;
            Box::new(
                MirtarbaseConverter::new(accessions)
                    .with_header_lines(options.header_lines)
                    .with_policy(rows)
                    .with_unknown_lookups(unknown),
            )
        },
        ConverterKind::Atc => Box::new(AtcConverter::new().with_policy(rows)),
        ConverterKind::ChemblHierarchy => {
            let options = &sources.chembl_hierarchy;
            let converter = ChemblHierarchyConverter::new()
                .with_header_lines(options.header_lines)
                .with_policy(rows);
            match options.source {
                HierarchySource::File => Box::new(converter),
                HierarchySource::Database => Box::new(converter.with_rows(fetch_hierarchy(config).await?)),
            }
        },
        ConverterKind::ProteinOrtholog => Box::new(ProteinOrthologConverter::new().with_policy(rows)),
        ConverterKind::NciPathway => Box::new(NciPathwayConverter::new(sources.nci_pathway.clone()).with_policy(rows)),
        ConverterKind::Disgenet => {
            let options = &sources.disgenet;
            let pmid_path = options.pmid_file.as_deref().ok_or(ConvertError::MissingOption("disgenet.pmid_file"))?;
            let map_path = options
                .disease_map_file
                .as_deref()
                .ok_or(ConvertError::MissingOption("disgenet.disease_map_file"))?;
            let pmids = disgenet::load_pmids(open_input(pmid_path)?)?;
            let disease_terms = disgenet::load_disease_map(open_input(map_path)?)?;
            Box::new(
                DisgenetConverter::new(pmids, disease_terms)
                    .with_policy(rows)
                    .with_unknown_lookups(unknown),
            )
        },
        ConverterKind::DoMesh => Box::new(DoMeshConverter::new()),
        ConverterKind::GeneOrthologs => {
            Box::new(GeneOrthologsConverter::new(sources.gene_orthologs.clone()).with_policy(rows))
        },
    };

    Ok(converter)
}

#[cfg(feature = "database")]
async fn fetch_hierarchy(config: &ConvertConfig) -> Result<Vec<(String, String)>> {
    let url = config
        .sources
        .chembl_hierarchy
        .database_url
        .as_deref()
        .ok_or(ConvertError::MissingOption("chembl_hierarchy.database_url"))?;
    crate::database::fetch_chembl_hierarchy(url).await
}

#[cfg(not(feature = "database"))]
async fn fetch_hierarchy(_config: &ConvertConfig) -> Result<Vec<(String, String)>> {
    Err(ConvertError::config(
        "chembl_hierarchy.source = \"database\" requires the `database` feature",
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::framework::{run, MemorySink};
    use std::io::{Cursor, Write};

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ConverterKind::ALL {
            assert_eq!(kind.name().parse::<ConverterKind>().unwrap(), kind);
        }
        assert!("uniprot".parse::<ConverterKind>().is_err());
    }

    #[test]
    fn test_database_source_reads_no_file() {
        let mut config = ConvertConfig::default();
        assert!(ConverterKind::ChemblHierarchy.reads_file(&config));
        config.sources.chembl_hierarchy.source = HierarchySource::Database;
        assert!(!ConverterKind::ChemblHierarchy.reads_file(&config));
        assert!(ConverterKind::Atc.reads_file(&config));
    }

    #[tokio::test]
    async fn test_build_loads_auxiliary_table() {
        let mut map = tempfile::NamedTempFile::new().unwrap();
        writeln!(map, "hsa-miR-21-5p\tMIMAT0000076").unwrap();
        map.flush().unwrap();

        let mut config = ConvertConfig::default();
        config.sources.mirtarbase.mirna_map = Some(map.path().to_path_buf());
        config.sources.mirtarbase.header_lines = 0;

        let mut converter = build(ConverterKind::Mirtarbase, &config).await.unwrap();
        assert_eq!(converter.name(), "mirtarbase");

        let mut sink = MemorySink::new();
        let data = "MIRT1\thsa-miR-21-5p\t7157\tWB\tFunctional MTI\t1\n";
        run(converter.as_mut(), &mut Cursor::new(data), &mut sink).unwrap();
        assert_eq!(sink.of_class("MiRNAInteraction").count(), 1);
    }

    #[tokio::test]
    async fn test_build_applies_unknown_lookup_policy() {
        let mut map = tempfile::NamedTempFile::new().unwrap();
        writeln!(map, "P1\tG1").unwrap();
        map.flush().unwrap();

        let mut config = ConvertConfig::default();
        config.sources.predicted_ppi.gene_map = Some(map.path().to_path_buf());
        config.defaults.unknown_lookups = crate::framework::UnknownLookupPolicy::Fail;

        let mut converter = build(ConverterKind::PredictedPpi, &config).await.unwrap();
        let mut sink = MemorySink::new();
        let err = run(converter.as_mut(), &mut Cursor::new("P1,P9,0.5\n"), &mut sink).unwrap_err();
        assert!(matches!(err, ConvertError::UnknownLookup { kind: "protein accession", .. }));
    }

    #[tokio::test]
    async fn test_build_rejects_missing_options() {
        let config = ConvertConfig::default();
        let err = build(ConverterKind::Disgenet, &config).await.err().unwrap();
        assert!(matches!(err, ConvertError::MissingOption("disgenet.pmid_file")));
    }
}
