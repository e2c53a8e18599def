//! Data file input: decompression, line splitting and path lookup.

pub mod compression;
pub mod lines;
pub mod resolve;

pub use lines::{open_records, FixedWidthLines, Line, LineSplitter};
pub use resolve::{GlobResolver, MapResolver, PathResolver, ResolverChain};
