//! SQLite persistence layer for the chart pipeline.
//!
//! Stage tables have no statically known schema (the raw chart dump
//! carries arbitrary business columns), so all table I/O goes through a
//! dynamic [`Frame`] of [`CellValue`]s backed by SQLite (via rusqlite
//! with the bundled feature).

pub mod frame;
pub mod schema;
pub mod tables;

pub use frame::{CellValue, Frame};
pub use schema::{open_database, open_memory, table_exists, SchemaError};
pub use tables::{append_table, read_table, replace_table, row_count, DbError};

/// Raw chart dump as delivered upstream.
pub const RAW_TABLE: &str = "tracks_raw";
/// Cleaned working copy consumed by the enrichment stage.
pub const CLEAN_TABLE: &str = "tracks_clean";
/// Enriched rows, appended batch by batch.
pub const ENRICHED_TABLE: &str = "tracks_enriched";
/// Validated subset of the enriched table.
pub const VALIDATED_TABLE: &str = "tracks_validated";
/// Final curated table published to consumers.
pub const CURATED_TABLE: &str = "tracks_curated";
