//! Output rendering (JSON, JSONL, text manifests)

pub mod manifest;

pub use manifest::{render_manifest, ManifestFormat};
