//! CCSB human interactome
//!
//! Tab-separated binary interactions with one header row; gene A in column 0
//! and gene B in column 2. Each undirected pair becomes an `Interaction` in
//! both directions, each with an `InteractionConfidence` (HCDP) and an
//! `InteractionDetail` (physical).

use crate::framework::{
    composite_key, symmetric_pairs, Converter, Delimiter, ItemContext, MalformedRowPolicy, Record,
    RecordReader, Resolver, RowSchema,
};
use bioconv_common::{ItemRef, Result};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use tracing::{debug, info};

pub const DEFAULT_TAXON_ID: &str = "9606";

const DATA_SET: &str = "Human Interactome Database";
const DATA_SOURCE: &str = "CCSB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcsbOptions {
    /// Organism of every gene in the file
    pub taxon_id: String,
}

impl Default for CcsbOptions {
    fn default() -> Self {
        Self {
            taxon_id: DEFAULT_TAXON_ID.to_string(),
        }
    }
}

#[derive(Debug)]
struct CcsbRow {
    gene_a: String,
    gene_b: String,
}

impl RowSchema for CcsbRow {
    const COLUMNS: usize = 3;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            gene_a: record.required(0, "gene_a")?,
            gene_b: record.required(2, "gene_b")?,
        })
    }
}

pub struct CcsbConverter {
    options: CcsbOptions,
    policy: MalformedRowPolicy,
    genes: Resolver<String>,
    interactions: Resolver<String>,
}

impl CcsbConverter {
    pub fn new(options: CcsbOptions) -> Self {
        Self {
            options,
            policy: MalformedRowPolicy::Fail,
            genes: Resolver::keyed("Gene", "primaryIdentifier"),
            interactions: Resolver::new("Interaction"),
        }
    }

    pub fn with_policy(mut self, policy: MalformedRowPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn gene(&mut self, ctx: &mut ItemContext<'_>, gene_id: &str) -> Result<ItemRef> {
        let taxon_id = &self.options.taxon_id;
        self.genes.resolve_with(ctx, gene_id, |ctx, gene| {
            gene.set_attribute("ncbiGeneId", gene_id);
            gene.set_reference("organism", ctx.organism(taxon_id)?);
            Ok(())
        })
    }

    fn interaction(
        &mut self,
        ctx: &mut ItemContext<'_>,
        source: (&str, &ItemRef),
        target: (&str, &ItemRef),
        interactors: [&ItemRef; 2],
    ) -> Result<()> {
        let key = composite_key(source.0, target.0);
        if self.interactions.get(key.as_str()).is_some() {
            debug!(%key, "Interaction already created");
            return Ok(());
        }

        let interaction = self.interactions.resolve_with(ctx, key.as_str(), |ctx, item| {
            item.add_to_collection("dataSets", ctx.data_set(DATA_SET, DATA_SOURCE)?);
            item.set_reference("gene1", source.1.clone());
            item.set_reference("gene2", target.1.clone());
            Ok(())
        })?;

        let mut confidence = ctx.create_item("InteractionConfidence");
        confidence.set_attribute("type", "HCDP");
        confidence.set_reference("interaction", interaction.clone());
        ctx.store(confidence)?;

        let mut detail = ctx.create_item("InteractionDetail");
        detail.set_attribute("type", "physical");
        detail.set_attribute("name", format!("CCSB:{}-{}", source.0, target.0));
        for interactor in interactors {
            detail.add_to_collection("allInteractors", interactor.clone());
        }
        detail.set_reference("interaction", interaction);
        ctx.store(detail)
    }
}

impl Converter for CcsbConverter {
    fn name(&self) -> &'static str {
        "ccsb"
    }

    fn process(&mut self, input: &mut dyn BufRead, ctx: &mut ItemContext<'_>) -> Result<()> {
        let mut rows = RecordReader::new(input, Delimiter::Tab)
            .skip_header_lines(1)
            .typed::<CcsbRow>(self.policy);

        for row in rows.by_ref() {
            let row = row?;
            let gene_a = self.gene(ctx, &row.gene_a)?;
            let gene_b = self.gene(ctx, &row.gene_b)?;

            let pairs = symmetric_pairs((row.gene_a.as_str(), &gene_a), (row.gene_b.as_str(), &gene_b));
            for (source, target) in pairs {
                self.interaction(ctx, source, target, [&gene_a, &gene_b])?;
            }
        }

        ctx.record_rows(rows.read(), rows.skipped());
        info!(
            genes = self.genes.created(),
            interactions = self.interactions.created(),
            "Processed CCSB interactions"
        );
        Ok(())
    }
}
