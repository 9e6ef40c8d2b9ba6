//! Command-line interface of the `bioconv` binary

use crate::config::ConvertConfig;
use crate::converters::chembl_hierarchy::HierarchySource;
use crate::converters::{self, ConverterKind};
use crate::framework::{run, run_file, Converter, ItemSink, JsonLinesSink, MalformedRowPolicy, RunReport, UnknownLookupPolicy};
use anyhow::{bail, Context, Result};
use bioconv_common::logging::{LogConfig, LogLevel};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bioconv")]
#[command(author, version, about = "Convert biological source files into warehouse items")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./bioconv.toml when present)
    #[arg(short, long, global = true, env = "BIOCONV_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON-lines output file, `-` for stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Write a JSON run report to this file
    #[arg(long, global = true)]
    pub report: Option<PathBuf>,

    /// Malformed row handling: skip or fail
    #[arg(long, global = true)]
    pub malformed_rows: Option<MalformedRowPolicy>,

    /// Unknown lookup handling: skip or fail
    #[arg(long, global = true)]
    pub unknown_lookups: Option<UnknownLookupPolicy>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Source file (`.gz` is decompressed)
    #[arg(short, long)]
    pub input: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// CCSB human interactome (TSV)
    Ccsb {
        #[command(flatten)]
        input: InputArgs,

        /// Organism of the genes
        #[arg(long)]
        taxon_id: Option<String>,
    },

    /// Predicted protein-protein interactions (CSV)
    PredictedPpi {
        #[command(flatten)]
        input: InputArgs,

        /// Protein to gene table (TSV)
        #[arg(long)]
        gene_map: Option<PathBuf>,
    },

    /// HTRIdb transcriptional regulations (semicolon-separated)
    Htridb {
        #[command(flatten)]
        input: InputArgs,
    },

    /// miRTarBase miRNA targets (TSV)
    Mirtarbase {
        #[command(flatten)]
        input: InputArgs,

        /// miRNA symbol to accession table (TSV)
        #[arg(long)]
        mirna_map: Option<PathBuf>,

        /// Header rows in the input
        #[arg(long)]
        header_lines: Option<usize>,
    },

    /// ATC classification codes
    Atc {
        #[command(flatten)]
        input: InputArgs,
    },

    /// ChEMBL molecule hierarchy (TSV or database)
    ChemblHierarchy {
        /// Hierarchy export (TSV); omit when reading the database
        #[arg(short, long, required_unless_present = "database_url")]
        input: Option<PathBuf>,

        /// Read `molecule_hierarchy` from this PostgreSQL database
        #[arg(long, conflicts_with = "input")]
        database_url: Option<String>,
    },

    /// Protein ortholog pairs (TSV)
    ProteinOrtholog {
        #[command(flatten)]
        input: InputArgs,
    },

    /// NCI pathway memberships (TSV)
    NciPathway {
        #[command(flatten)]
        input: InputArgs,

        /// Organism of proteins and pathways
        #[arg(long)]
        taxon_id: Option<String>,
    },

    /// DisGeNET gene-disease associations (TSV)
    Disgenet {
        #[command(flatten)]
        input: InputArgs,

        /// Gene-disease PubMed evidence (TSV)
        #[arg(long)]
        pmid_file: Option<PathBuf>,

        /// Disease vocabulary mappings (TSV)
        #[arg(long)]
        disease_map_file: Option<PathBuf>,
    },

    /// Disease Ontology MeSH cross references (OBO)
    DoMesh {
        #[command(flatten)]
        input: InputArgs,
    },

    /// NCBI gene orthologs (TSV)
    GeneOrthologs {
        #[command(flatten)]
        input: InputArgs,

        /// Taxon ids to keep, comma-separated
        #[arg(long, value_delimiter = ',')]
        organisms: Vec<String>,
    },
}

impl Command {
    pub fn kind(&self) -> ConverterKind {
        match self {
            Command::Ccsb { .. } => ConverterKind::Ccsb,
            Command::PredictedPpi { .. } => ConverterKind::PredictedPpi,
            Command::Htridb { .. } => ConverterKind::Htridb,
            Command::Mirtarbase { .. } => ConverterKind::Mirtarbase,
            Command::Atc { .. } => ConverterKind::Atc,
            Command::ChemblHierarchy { .. } => ConverterKind::ChemblHierarchy,
            Command::ProteinOrtholog { .. } => ConverterKind::ProteinOrtholog,
            Command::NciPathway { .. } => ConverterKind::NciPathway,
            Command::Disgenet { .. } => ConverterKind::Disgenet,
            Command::DoMesh { .. } => ConverterKind::DoMesh,
            Command::GeneOrthologs { .. } => ConverterKind::GeneOrthologs,
        }
    }

    /// Input file, if the run reads one
    pub fn input(&self) -> Option<&Path> {
        match self {
            Command::ChemblHierarchy { input, .. } => input.as_deref(),
            Command::Ccsb { input, .. }
            | Command::PredictedPpi { input, .. }
            | Command::Htridb { input }
            | Command::Mirtarbase { input, .. }
            | Command::Atc { input }
            | Command::ProteinOrtholog { input }
            | Command::NciPathway { input, .. }
            | Command::Disgenet { input, .. }
            | Command::DoMesh { input }
            | Command::GeneOrthologs { input, .. } => Some(input.input.as_path()),
        }
    }
}

impl Cli {
    /// Logging settings from `--verbose`, overridden by `BIOCONV_LOG_*`
    ///
    /// An invalid environment value is reported and ignored; the flag-derived
    /// settings stay in effect.
    pub fn log_config(&self) -> LogConfig {
        let level = if self.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };
        let config = LogConfig::builder().level(level).log_file_prefix("bioconv").build();

        match config.clone().merge_env() {
            Ok(merged) => merged,
            Err(e) => {
                eprintln!("Warning: ignoring invalid logging environment: {}", e);
                config
            },
        }
    }

    /// Apply command-line overrides on top of file and environment settings
    pub fn apply(&self, config: &mut ConvertConfig) {
        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }
        if let Some(report) = &self.report {
            config.report = Some(report.clone());
        }
        if let Some(policy) = self.malformed_rows {
            config.defaults.malformed_rows = policy;
        }
        if let Some(policy) = self.unknown_lookups {
            config.defaults.unknown_lookups = policy;
        }

        let sources = &mut config.sources;
        match &self.command {
            Command::Ccsb { taxon_id: Some(taxon_id), .. } => sources.ccsb.taxon_id = taxon_id.clone(),
            Command::PredictedPpi { gene_map: Some(path), .. } => sources.predicted_ppi.gene_map = Some(path.clone()),
            Command::Mirtarbase {
                mirna_map,
                header_lines,
                ..
            } => {
                if let Some(path) = mirna_map {
                    sources.mirtarbase.mirna_map = Some(path.clone());
                }
                if let Some(lines) = header_lines {
                    sources.mirtarbase.header_lines = *lines;
                }
            },
            Command::ChemblHierarchy { input, database_url } => {
                if let Some(url) = database_url {
                    sources.chembl_hierarchy.database_url = Some(url.clone());
                    sources.chembl_hierarchy.source = HierarchySource::Database;
                } else if input.is_some() {
                    sources.chembl_hierarchy.source = HierarchySource::File;
                }
            },
            Command::NciPathway { taxon_id: Some(taxon_id), .. } => sources.nci_pathway.taxon_id = taxon_id.clone(),
            Command::Disgenet {
                pmid_file,
                disease_map_file,
                ..
            } => {
                if let Some(path) = pmid_file {
                    sources.disgenet.pmid_file = Some(path.clone());
                }
                if let Some(path) = disease_map_file {
                    sources.disgenet.disease_map_file = Some(path.clone());
                }
            },
            Command::GeneOrthologs { organisms, .. } if !organisms.is_empty() => {
                sources.gene_orthologs.organisms = organisms.clone();
            },
            _ => {},
        }
    }
}

fn execute(converter: &mut dyn Converter, input: Option<&Path>, sink: &mut dyn ItemSink) -> Result<RunReport> {
    let report = match input {
        Some(path) => run_file(converter, path, sink)
            .with_context(|| format!("Failed to convert {}", path.display()))?,
        None => run(converter, &mut std::io::empty(), sink)?,
    };
    Ok(report)
}

/// Load configuration, run the selected converter and write its report
pub async fn run_cli(cli: &Cli) -> Result<RunReport> {
    let mut config = ConvertConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);

    let kind = cli.command.kind();
    let input = cli.command.input();
    if kind.reads_file(&config) && input.is_none() {
        bail!("{} needs an input file", kind);
    }

    let mut converter = converters::build(kind, &config).await?;

    let report = match config.output.as_deref() {
        Some(path) if !config.writes_to_stdout() => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            let mut sink = JsonLinesSink::new(BufWriter::new(file));
            execute(converter.as_mut(), input, &mut sink)?
        },
        _ => {
            let stdout = std::io::stdout();
            let mut sink = JsonLinesSink::new(stdout.lock());
            execute(converter.as_mut(), input, &mut sink)?
        },
    };

    if let Some(path) = &config.report {
        report
            .write_to(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Wrote run report");
    }

    Ok(report)
}
