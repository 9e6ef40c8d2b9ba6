//! Entity-resolution framework shared by all converters
//!
//! Reader → resolvers → relationship builders → sink. Everything here is
//! synchronous and owned by a single run.

pub mod context;
pub mod converter;
pub mod hierarchy;
pub mod lookup;
pub mod reader;
pub mod relation;
pub mod resolver;
pub mod sink;

// Re-export commonly used types
pub use context::ItemContext;
pub use converter::{run, run_file, Converter, RunReport};
pub use hierarchy::{Hierarchy, HierarchyNode};
pub use lookup::{LookupTable, UnknownLookupPolicy};
pub use reader::{open_input, Delimiter, MalformedRowPolicy, Record, RecordReader, RowSchema, TypedRows};
pub use relation::{composite_key, symmetric_pairs, PairTracker};
pub use resolver::{PendingResolver, Resolver};
pub use sink::{ItemSink, JsonLinesSink, MemorySink};
