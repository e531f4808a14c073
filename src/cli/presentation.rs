//! CLI presentation: render documents and container info as text, tables or JSON.

use crate::cli::parse::ListFormat;
use crate::engine::{AccessMode, Document};
use crate::error::StoreError;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One document, decoded for display.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRow {
    pub name: String,
    pub content: String,
    pub bytes: usize,
    pub modified: String,
    pub metadata: BTreeMap<String, String>,
}

impl DocumentRow {
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let content = doc.content()?.to_string();
        Ok(Self {
            name: doc.name()?.to_string(),
            bytes: content.len(),
            content,
            modified: doc.modified()?.to_rfc3339(),
            metadata: doc.metadata()?.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerInfo {
    pub path: PathBuf,
    pub alias: String,
    pub mode: AccessMode,
    pub documents: u64,
}

pub fn format_documents(rows: &[DocumentRow], format: ListFormat) -> Result<String, StoreError> {
    match format {
        ListFormat::Json => to_json(rows),
        ListFormat::Names => Ok(rows
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join("\n")),
        ListFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Name", "Bytes", "Modified"]);
            for r in rows {
                table.add_row(vec![r.name.clone(), r.bytes.to_string(), r.modified.clone()]);
            }
            Ok(table.to_string())
        }
        ListFormat::Text => Ok(rows
            .iter()
            .map(|r| format!("{}\n{}", r.name.bold(), r.content))
            .collect::<Vec<_>>()
            .join("\n\n")),
    }
}

pub fn format_document(row: &DocumentRow, format: &str) -> Result<String, StoreError> {
    if format == "json" {
        return to_json(row);
    }
    Ok(row.content.clone())
}

pub fn format_info(info: &ContainerInfo, format: &str) -> Result<String, StoreError> {
    if format == "json" {
        return to_json(info);
    }
    let mode = match info.mode {
        AccessMode::ReadWrite => info.mode.to_string().green().to_string(),
        AccessMode::ReadOnly => info.mode.to_string().yellow().to_string(),
    };
    Ok(format!(
        "{}\n  path:      {}\n  alias:     {}\n  mode:      {}\n  documents: {}",
        "Container".bold().underline(),
        info.path.display(),
        info.alias,
        mode,
        info.documents
    ))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| StoreError::Codec(format!("Failed to render JSON: {}", e)))
}
