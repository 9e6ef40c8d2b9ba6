//! Bio-data import converters
//!
//! Every converter follows the same pipeline: a [`framework::RecordReader`]
//! turns the source into rows, [`framework::Resolver`]s make sure each
//! natural key becomes exactly one item, relationship helpers expand and
//! deduplicate pairs, and finished items flow to an
//! [`framework::ItemSink`].
//!
//! # Supported Data Sources
//!
//! - **CCSB**: human interactome pairs
//! - **Predicted PPI**: predicted protein interactions mapped to genes
//! - **HTRIdb**: transcription factor regulations
//! - **miRTarBase**: miRNA targets
//! - **ATC**: anatomical therapeutic chemical classification
//! - **ChEMBL**: molecule parent hierarchy
//! - **Protein orthologs**, **NCI pathways**, **DisGeNET**, **DO MeSH
//!   mappings** and **NCBI gene orthologs**
//!
//! # Example
//!
//! ```no_run
//! use bioconv_ingest::converters::AtcConverter;
//! use bioconv_ingest::framework::{run_file, MemorySink};
//!
//! fn main() -> bioconv_common::Result<()> {
//!     let mut sink = MemorySink::new();
//!     let report = run_file(&mut AtcConverter::new(), "atc_codes.txt", &mut sink)?;
//!     println!("{} items", report.total_items());
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod cli;
pub mod config;
pub mod converters;
#[cfg(feature = "database")]
pub mod database;
pub mod framework;
