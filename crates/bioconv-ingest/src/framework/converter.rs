//! Converter trait and run driver

use super::context::ItemContext;
use super::reader::open_input;
use super::sink::ItemSink;
use bioconv_common::checksum::file_sha256;
use bioconv_common::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use tracing::{info, info_span};

/// One data-import converter
///
/// A run calls `process` once with the whole input, then `close` once.
/// Caches live on the converter instance and are dropped with it.
pub trait Converter {
    /// Short name used in logs and reports (e.g. "ccsb")
    fn name(&self) -> &'static str;

    /// Single linear pass over the input
    fn process(&mut self, input: &mut dyn BufRead, ctx: &mut ItemContext<'_>) -> Result<()>;

    /// Store items held back during `process`
    fn close(&mut self, _ctx: &mut ItemContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub converter: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub items_by_class: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_sha256: Option<String>,
}

impl RunReport {
    pub fn total_items(&self) -> usize {
        self.items_by_class.values().sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Run a converter over an already-open input
pub fn run(
    converter: &mut dyn Converter,
    input: &mut dyn BufRead,
    sink: &mut dyn ItemSink,
) -> Result<RunReport> {
    let name = converter.name();
    let span = info_span!("convert", converter = name);
    let _enter = span.enter();

    let started_at = Utc::now();
    info!("Starting conversion");

    let mut ctx = ItemContext::new(sink);
    converter.process(input, &mut ctx)?;
    converter.close(&mut ctx)?;
    ctx.finish()?;

    let report = RunReport {
        converter: name.to_string(),
        started_at,
        finished_at: Utc::now(),
        rows_read: ctx.rows_read(),
        rows_skipped: ctx.rows_skipped(),
        items_by_class: ctx.items_by_class().clone(),
        input_sha256: None,
    };

    info!(
        rows_read = report.rows_read,
        rows_skipped = report.rows_skipped,
        items = report.total_items(),
        "Conversion complete"
    );
    Ok(report)
}

/// Run a converter over a file, recording its fingerprint in the report
pub fn run_file(
    converter: &mut dyn Converter,
    path: impl AsRef<Path>,
    sink: &mut dyn ItemSink,
) -> Result<RunReport> {
    let path = path.as_ref();
    let checksum = file_sha256(path)?;
    let mut input = open_input(path)?;

    let mut report = run(converter, &mut input, sink)?;
    report.input_sha256 = Some(checksum);
    Ok(report)
}
