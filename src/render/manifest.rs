//! Manifest rendering (JSON, JSONL, plain text).

use crate::domain::{UploadMode, MANIFEST_SCHEMA_VERSION};
use crate::ingest::selection::SelectionSet;
use crate::utils::stable_id;
use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestFormat {
    #[default]
    Json,
    Jsonl,
    Text,
}

impl FromStr for ManifestFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ManifestFormat::Json),
            "jsonl" => Ok(ManifestFormat::Jsonl),
            "text" | "txt" => Ok(ManifestFormat::Text),
            other => anyhow::bail!("Invalid manifest format '{}': expected json, jsonl or text", other),
        }
    }
}

impl fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ManifestFormat::Json => "json",
            ManifestFormat::Jsonl => "jsonl",
            ManifestFormat::Text => "text",
        })
    }
}

pub fn render_manifest(
    selection: &SelectionSet,
    mode: UploadMode,
    format: ManifestFormat,
    include_timestamp: bool,
) -> Result<String> {
    match format {
        ManifestFormat::Json => render_json(selection, mode, include_timestamp),
        ManifestFormat::Jsonl => Ok(render_jsonl(selection)),
        ManifestFormat::Text => Ok(render_text(selection)),
    }
}

fn file_entry(key: &str, name: &str, path: Option<&str>, size_bytes: u64) -> BTreeMap<&'static str, Value> {
    // BTreeMap keeps keys sorted in the serialized output.
    let mut entry = BTreeMap::new();
    entry.insert("id", Value::String(stable_id(key)));
    entry.insert("key", Value::String(key.to_string()));
    entry.insert("name", Value::String(name.to_string()));
    entry.insert("path", path.map(|p| Value::String(p.to_string())).unwrap_or(Value::Null));
    entry.insert("size_bytes", Value::Number(size_bytes.into()));
    entry
}

pub fn render_json(selection: &SelectionSet, mode: UploadMode, include_timestamp: bool) -> Result<String> {
    let files = selection
        .iter()
        .map(|d| {
            serde_json::to_value(file_entry(
                d.identity_key(),
                &d.name,
                d.relative_path.as_deref(),
                d.size_bytes,
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut manifest = Map::new();
    manifest
        .insert("schema_version".to_string(), Value::String(MANIFEST_SCHEMA_VERSION.to_string()));
    if include_timestamp {
        manifest.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    manifest.insert("mode".to_string(), Value::String(mode.to_string()));
    manifest.insert(
        "stats".to_string(),
        json!({ "files": selection.len(), "total_bytes": selection.total_bytes() }),
    );
    manifest.insert("files".to_string(), Value::Array(files));

    Ok(serde_json::to_string_pretty(&Value::Object(manifest))?)
}

pub fn render_jsonl(selection: &SelectionSet) -> String {
    let mut lines = Vec::with_capacity(selection.len());
    for d in selection {
        let entry = file_entry(d.identity_key(), &d.name, d.relative_path.as_deref(), d.size_bytes);
        if let Ok(line) = serde_json::to_string(&entry) {
            lines.push(line);
        }
    }
    if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    }
}

pub fn render_text(selection: &SelectionSet) -> String {
    selection.keys().map(|k| format!("{}\n", k)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentHandle, FileDescriptor};

    fn sample() -> SelectionSet {
        vec![
            FileDescriptor::standalone("a.txt", 3, ContentHandle::bytes("aaa"))
                .with_relative_path("proj/a.txt"),
            FileDescriptor::standalone("loose.md", 2, ContentHandle::bytes("md")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn json_manifest_lists_files_in_selection_order() {
        let out = render_json(&sample(), UploadMode::Folder, false).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["schema_version"], MANIFEST_SCHEMA_VERSION);
        assert!(value.get("generated_at").is_none());
        assert_eq!(value["mode"], "folder");
        assert_eq!(value["stats"]["files"], 2);
        assert_eq!(value["stats"]["total_bytes"], 5);
        assert_eq!(value["files"][0]["key"], "proj/a.txt");
        assert_eq!(value["files"][1]["path"], Value::Null);
    }

    #[test]
    fn jsonl_has_one_sorted_object_per_line() {
        let out = render_jsonl(&sample());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("{\"id\":"));
        assert!(render_jsonl(&SelectionSet::new()).is_empty());
    }

    #[test]
    fn text_lists_identity_keys() {
        assert_eq!(render_text(&sample()), "proj/a.txt\nloose.md\n");
    }

    #[test]
    fn format_parses() {
        assert_eq!("JSONL".parse::<ManifestFormat>().unwrap(), ManifestFormat::Jsonl);
        assert!("yaml".parse::<ManifestFormat>().is_err());
    }
}
