//! miRTarBase miRNA-target interactions
//!
//! Tab-separated rows: miRTarBase id, miRNA symbol, target gene id,
//! experiments, support type, PubMed id. miRNA symbols are translated to
//! accessions through an auxiliary table; one symbol may map to several
//! accessions, each getting its own interaction.

use crate::framework::{
    Converter, Delimiter, ItemContext, LookupTable, MalformedRowPolicy, Record, RecordReader, Resolver,
    RowSchema, UnknownLookupPolicy,
};
use bioconv_common::{ItemRef, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::info;

/// Gene id used by miRTarBase for targets without an Entrez id
const NO_GENE: &str = "0";

const DATA_SET: &str = "miRTarBase";
const DATA_SOURCE: &str = "miRTarBase";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirtarbaseOptions {
    /// Tab-separated `miRNA symbol, accession` table
    pub mirna_map: Option<PathBuf>,

    /// Header rows in the interaction file
    pub header_lines: usize,
}

impl Default for MirtarbaseOptions {
    fn default() -> Self {
        Self {
            mirna_map: None,
            header_lines: 1,
        }
    }
}

#[derive(Debug)]
struct TargetRow {
    source_id: String,
    symbol: String,
    gene_id: String,
    experiments: String,
    support_type: String,
    pubmed_id: String,
}

impl RowSchema for TargetRow {
    const COLUMNS: usize = 6;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            source_id: record.get(0).to_string(),
            symbol: record.required(1, "mirna_symbol")?,
            gene_id: record.required(2, "gene_id")?,
            experiments: record.get(3).to_string(),
            support_type: record.get(4).to_string(),
            pubmed_id: record.required(5, "pubmed_id")?,
        })
    }
}

/// Experiment names from a `//` or `;` separated list
fn split_experiments(value: &str) -> BTreeSet<&str> {
    if value == "-" {
        return BTreeSet::new();
    }
    value
        .split("//")
        .flat_map(|part| part.split(';'))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

pub struct MirtarbaseConverter {
    mirna_accessions: LookupTable,
    header_lines: usize,
    policy: MalformedRowPolicy,
    unknown: UnknownLookupPolicy,
    genes: Resolver<String>,
    mirnas: Resolver<String>,
    interactions: Resolver<String>,
    experiments: Resolver<String>,
    publications: Resolver<String>,
    unknown_symbols: BTreeSet<String>,
}

impl MirtarbaseConverter {
    pub fn new(mirna_accessions: LookupTable) -> Self {
        Self {
            mirna_accessions,
            header_lines: MirtarbaseOptions::default().header_lines,
            policy: MalformedRowPolicy::Fail,
            unknown: UnknownLookupPolicy::Skip,
            genes: Resolver::keyed("Gene", "primaryIdentifier"),
            mirnas: Resolver::keyed("MiRNA", "primaryIdentifier"),
            interactions: Resolver::keyed("MiRNAInteraction", "identifier"),
            experiments: Resolver::keyed("MiRNAExperiment", "name"),
            publications: Resolver::keyed("Publication", "pubMedId"),
            unknown_symbols: BTreeSet::new(),
        }
    }

    pub fn with_header_lines(mut self, lines: usize) -> Self {
        self.header_lines = lines;
        self
    }

    pub fn with_policy(mut self, policy: MalformedRowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_unknown_lookups(mut self, policy: UnknownLookupPolicy) -> Self {
        self.unknown = policy;
        self
    }

    fn interaction(&mut self, ctx: &mut ItemContext<'_>, accession: &str, row: &TargetRow) -> Result<ItemRef> {
        let key = format!("{}-{}", accession, row.gene_id);
        if let Some(existing) = self.interactions.get(key.as_str()) {
            return Ok(existing.clone());
        }

        let gene = self.genes.resolve_with(ctx, row.gene_id.as_str(), |_, gene| {
            gene.set_attribute("ncbiGeneId", row.gene_id.as_str());
            Ok(())
        })?;
        let mirna = self.mirnas.resolve(ctx, accession)?;

        self.interactions.resolve_with(ctx, key.as_str(), |ctx, interaction| {
            interaction.add_to_collection("dataSets", ctx.data_set(DATA_SET, DATA_SOURCE)?);
            interaction.set_attribute("sourceId", row.source_id.as_str());
            interaction.set_attribute("supportType", row.support_type.as_str());
            interaction.set_reference("targetGene", gene);
            interaction.set_reference("miRNA", mirna);
            Ok(())
        })
    }

    fn evidence(&mut self, ctx: &mut ItemContext<'_>, accession: &str, row: &TargetRow) -> Result<()> {
        let interaction = self.interaction(ctx, accession, row)?;
        let publication = self.publications.resolve(ctx, row.pubmed_id.as_str())?;

        let mut experiments = Vec::new();
        for name in split_experiments(&row.experiments) {
            experiments.push(self.experiments.resolve(ctx, name)?);
        }

        let mut evidence = ctx.create_item("MiRNAEvidence");
        evidence.set_reference("interaction", interaction);
        evidence.set_reference("publication", publication);
        for experiment in experiments {
            evidence.add_to_collection("experiments", experiment);
        }
        ctx.store(evidence)
    }
}

impl Converter for MirtarbaseConverter {
    fn name(&self) -> &'static str {
        "mirtarbase"
    }

    fn process(&mut self, input: &mut dyn BufRead, ctx: &mut ItemContext<'_>) -> Result<()> {
        let mut rows = RecordReader::new(input, Delimiter::Tab)
            .skip_header_lines(self.header_lines)
            .typed::<TargetRow>(self.policy);
        let mut evidence = 0usize;

        for row in rows.by_ref() {
            let row = row?;
            if row.gene_id == NO_GENE {
                continue;
            }

            let accessions = self.mirna_accessions.get_all(&row.symbol).to_vec();
            if accessions.is_empty() {
                self.unknown.miss("miRNA symbol", &row.symbol)?;
                self.unknown_symbols.insert(row.symbol);
                continue;
            }

            for accession in &accessions {
                self.evidence(ctx, accession, &row)?;
                evidence += 1;
            }
        }

        ctx.record_rows(rows.read(), rows.skipped());
        info!(
            evidence,
            interactions = self.interactions.created(),
            unknown_symbols = self.unknown_symbols.len(),
            "Processed miRTarBase targets"
        );
        Ok(())
    }
}
