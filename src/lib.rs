//! drop-ingest: turn dropped or picked files and folders into an upload selection
//!
//! Raw drop payloads (entry handles with paginated directory listings plus a
//! flat fallback list) and native picker results are reduced to one
//! deduplicated, artifact-free selection owned by an ingestion session.

pub mod cli;
pub mod config;
pub mod domain;
pub mod ingest;
pub mod render;
pub mod session;
pub mod upload;
pub mod utils;
