//! Input processing module
//! Resolves raw job and taxonomy tables into typed records

pub mod loader;
pub mod schema;

pub use loader::{load_jobs, load_taxonomy, JobTable, LoadReport, TaxonomyTable};
pub use schema::{JobRecord, TaxonomyRecord};
