//! Posts: parsing source posts files and merging them.
//!
//! * [`parser`] turns one source's raw text into [`Record`]s.
//! * [`merge`] sorts records from every source into a [`MergedDocument`]
//!   and serializes it back to the same delimiter-block format.

pub mod merge;
pub mod parser;
mod record;

pub use merge::{MergedDocument, SiteMeta};
pub use parser::parse_document;
pub use record::Record;
