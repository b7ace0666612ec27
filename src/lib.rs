// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod ingest;
pub mod job;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::ingest::types::{FetchOptions, PageFetcher, PageSession, ResultRecord, Source};
pub use crate::job::{run_job, RunReport};
pub use crate::store::{MemoryStore, ResultStore};
