//! bioconv Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared item model, error handling and logging for the bioconv converters.
//!
//! # Overview
//!
//! - **Items**: the typed records every converter emits ([`types::Item`])
//! - **Error Handling**: [`ConvertError`] and the [`Result`] alias
//! - **Checksums**: input fingerprints recorded in run reports
//! - **Logging**: `tracing` subscriber setup shared by all binaries
//!
//! # Example
//!
//! ```
//! use bioconv_common::types::{Item, ItemRef};
//!
//! let mut gene = Item::new("Gene", ItemRef::new("1_1"));
//! gene.set_attribute("primaryIdentifier", "7157");
//! gene.set_reference("organism", ItemRef::new("1_0"));
//! assert_eq!(gene.attribute("primaryIdentifier"), Some("7157"));
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{ConvertError, Result};
pub use types::{Item, ItemRef};
