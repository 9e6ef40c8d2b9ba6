//! Predicted protein-protein interactions
//!
//! Comma-separated `protein A, protein B, score` rows. Proteins are mapped to
//! genes through an auxiliary table; pairs whose proteins map to no gene, to
//! several genes, or to the same gene are dropped. Each unordered gene pair is
//! emitted once in both orientations, carrying the prediction score.

use crate::framework::{
    symmetric_pairs, Converter, Delimiter, ItemContext, LookupTable, MalformedRowPolicy, PairTracker,
    Record, RecordReader, Resolver, RowSchema, UnknownLookupPolicy,
};
use bioconv_common::Result;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictedPpiOptions {
    /// Tab-separated `protein accession, gene id` table
    pub gene_map: Option<PathBuf>,

    /// Header rows in the gene map
    pub gene_map_header_lines: usize,
}

#[derive(Debug)]
struct PredictionRow {
    protein_a: String,
    protein_b: String,
    score: String,
}

impl RowSchema for PredictionRow {
    const COLUMNS: usize = 3;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            protein_a: record.required(0, "protein_a")?,
            protein_b: record.required(1, "protein_b")?,
            score: record.get(2).to_string(),
        })
    }
}

pub struct PredictedPpiConverter {
    protein_genes: LookupTable,
    policy: MalformedRowPolicy,
    unknown: UnknownLookupPolicy,
    genes: Resolver<String>,
    seen: PairTracker<String>,
    unmapped: usize,
    ambiguous: usize,
    same_gene: usize,
}

impl PredictedPpiConverter {
    pub fn new(protein_genes: LookupTable) -> Self {
        Self {
            protein_genes,
            policy: MalformedRowPolicy::Fail,
            unknown: UnknownLookupPolicy::Skip,
            genes: Resolver::keyed("Gene", "primaryIdentifier"),
            seen: PairTracker::new(),
            unmapped: 0,
            ambiguous: 0,
            same_gene: 0,
        }
    }

    pub fn with_policy(mut self, policy: MalformedRowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_unknown_lookups(mut self, policy: UnknownLookupPolicy) -> Self {
        self.unknown = policy;
        self
    }

    /// The single gene a protein maps to
    fn mapped_gene(&mut self, protein: &str) -> Result<Option<String>> {
        match self.protein_genes.get_all(protein) {
            [] => {
                self.unknown.miss("protein accession", protein)?;
                self.unmapped += 1;
                Ok(None)
            },
            [gene] => Ok(Some(gene.clone())),
            _ => {
                debug!(protein, "Protein maps to several genes");
                self.ambiguous += 1;
                Ok(None)
            },
        }
    }

    fn interaction(&mut self, ctx: &mut ItemContext<'_>, gene_a: &str, gene_b: &str, score: &str) -> Result<()> {
        if !self.seen.first_sight(&gene_a.to_string(), &gene_b.to_string()) {
            debug!(gene_a, gene_b, "Duplicated pair");
            return Ok(());
        }

        for (gene1, gene2) in symmetric_pairs(gene_a, gene_b) {
            let gene1 = self.genes.resolve(ctx, gene1)?;
            let gene2 = self.genes.resolve(ctx, gene2)?;

            let mut interaction = ctx.create_item("Interaction");
            interaction.set_reference("gene1", gene1);
            interaction.set_reference("gene2", gene2);
            interaction.set_attribute("psopiaScore", score);
            ctx.store(interaction)?;
        }
        Ok(())
    }
}

impl Converter for PredictedPpiConverter {
    fn name(&self) -> &'static str {
        "predicted-ppi"
    }

    fn process(&mut self, input: &mut dyn BufRead, ctx: &mut ItemContext<'_>) -> Result<()> {
        let mut rows = RecordReader::new(input, Delimiter::Comma).typed::<PredictionRow>(self.policy);

        for row in rows.by_ref() {
            let row = row?;
            let gene_a = self.mapped_gene(&row.protein_a)?;
            let gene_b = self.mapped_gene(&row.protein_b)?;
            let (Some(gene_a), Some(gene_b)) = (gene_a, gene_b) else {
                continue;
            };
            if gene_a == gene_b {
                self.same_gene += 1;
                continue;
            }
            self.interaction(ctx, &gene_a, &gene_b, &row.score)?;
        }

        ctx.record_rows(rows.read(), rows.skipped());
        info!(
            pairs = self.seen.len(),
            unmapped_proteins = self.unmapped,
            ambiguous_proteins = self.ambiguous,
            same_gene = self.same_gene,
            "Processed predicted interactions"
        );
        Ok(())
    }
}
