//! The thin pipeline stages around the enrichment core.
//!
//! Each stage is a full-table read, an in-memory rewrite, and a table
//! write. They are sequenced by the CLI `run` command; there is no
//! scheduler.

mod extract;
mod load;
mod transform;
mod validate;

pub use extract::extract_raw;
pub use load::publish_curated;
pub use transform::transform_clean;
pub use validate::{validate_enriched, ValidateSummary};
