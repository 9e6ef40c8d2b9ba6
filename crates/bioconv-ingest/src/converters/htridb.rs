//! HTRIdb transcriptional regulations
//!
//! Semicolon-delimited export with one header row. Columns used: 1 TF gene,
//! 3 target gene, 5 detection technique, 6 PubMed id.

use crate::framework::{
    composite_key, Converter, Delimiter, ItemContext, MalformedRowPolicy, PendingResolver, Record,
    RecordReader, Resolver, RowSchema,
};
use bioconv_common::{ItemRef, Result};
use std::io::BufRead;
use tracing::info;

#[derive(Debug)]
struct RegulationRow {
    tf_gene: String,
    target_gene: String,
    technique: String,
    pubmed_id: String,
}

impl RowSchema for RegulationRow {
    const COLUMNS: usize = 7;

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            tf_gene: record.required(1, "tf_gene")?,
            target_gene: record.required(3, "target_gene")?,
            technique: record.get(5).to_string(),
            pubmed_id: record.required(6, "pubmed_id")?,
        })
    }
}

pub struct HtridbConverter {
    policy: MalformedRowPolicy,
    genes: Resolver<String>,
    publications: Resolver<String>,
    experiments: Resolver<String>,
    regulations: PendingResolver<String>,
}

impl Default for HtridbConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl HtridbConverter {
    pub fn new() -> Self {
        Self {
            policy: MalformedRowPolicy::Fail,
            genes: Resolver::keyed("Gene", "primaryIdentifier"),
            publications: Resolver::keyed("Publication", "pubMedId"),
            experiments: Resolver::new("TFRegulationExperiment"),
            regulations: PendingResolver::new("TranscriptionalRegulation"),
        }
    }

    pub fn with_policy(mut self, policy: MalformedRowPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn gene(&mut self, ctx: &mut ItemContext<'_>, gene_id: &str) -> Result<ItemRef> {
        self.genes.resolve_with(ctx, gene_id, |_, gene| {
            gene.set_attribute("ncbiGeneId", gene_id);
            Ok(())
        })
    }

    fn experiment(&mut self, ctx: &mut ItemContext<'_>, title: &str, pubmed_id: &str) -> Result<ItemRef> {
        let key = format!("{}-{}", title, pubmed_id);
        if let Some(existing) = self.experiments.get(key.as_str()) {
            return Ok(existing.clone());
        }

        let publication = self.publications.resolve(ctx, pubmed_id)?;
        self.experiments.resolve_with(ctx, key.as_str(), |_, experiment| {
            experiment.set_attribute("title", title);
            experiment.set_reference("publication", publication);
            Ok(())
        })
    }
}

impl Converter for HtridbConverter {
    fn name(&self) -> &'static str {
        "htridb"
    }

    fn process(&mut self, input: &mut dyn BufRead, ctx: &mut ItemContext<'_>) -> Result<()> {
        let mut rows = RecordReader::new(input, Delimiter::Semicolon)
            .skip_header_lines(1)
            .typed::<RegulationRow>(self.policy);

        for row in rows.by_ref() {
            let row = row?;
            let experiment = self.experiment(ctx, &row.technique, &row.pubmed_id)?;

            let key = composite_key(&row.tf_gene, &row.target_gene);
            if self.regulations.get(key.as_str()).is_none() {
                let tf = self.gene(ctx, &row.tf_gene)?;
                let target = self.gene(ctx, &row.target_gene)?;
                self.regulations.resolve_with(ctx, key.as_str(), |_, regulation| {
                    regulation.set_attribute("name", key.as_str());
                    regulation.set_reference("transcriptionFactor", tf);
                    regulation.set_reference("targetGene", target);
                    Ok(())
                })?;
            }

            if let Some(regulation) = self.regulations.get_mut(key.as_str()) {
                regulation.add_to_collection("experiments", experiment);
            }
        }

        ctx.record_rows(rows.read(), rows.skipped());
        Ok(())
    }

    fn close(&mut self, ctx: &mut ItemContext<'_>) -> Result<()> {
        let regulations = self.regulations.flush(ctx)?;
        info!(
            regulations,
            experiments = self.experiments.created(),
            genes = self.genes.created(),
            "Stored transcriptional regulations"
        );
        Ok(())
    }
}
