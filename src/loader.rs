//! Loading element definitions and string tables from disk
//!
//! Definition documents are JSON objects with an `elements` list, one raw
//! record per element (the shape of the game's `StreamingAssets/elements`
//! files). A data directory may hold any number of them.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::element::{ElementDef, UNKNOWN_ELEMENT};
use crate::elements::Elements;
use crate::error::{FieldError, LoadError};
use crate::strings::StringTable;

/// Built-in Ice/Water/Steam definitions, usable without game data.
pub const SAMPLE_DOCUMENT: &str = include_str!("sample.json");

/// Build definitions from every record of a parsed document.
///
/// Fails on the first bad record.
pub fn load_definitions(document: &Value) -> Result<Vec<ElementDef>, LoadError> {
    let records = document
        .get("elements")
        .and_then(Value::as_array)
        .ok_or(LoadError::MissingCollection)?;

    records
        .iter()
        .map(|record| -> Result<ElementDef, LoadError> {
            let fields = record.as_object().ok_or_else(|| LoadError::BadDefinition {
                element: UNKNOWN_ELEMENT.to_string(),
                source: FieldError::NotAMapping,
            })?;
            let def = ElementDef::from_raw_fields(fields)?;
            trace!(element = %def.name, "loaded definition");
            Ok(def)
        })
        .collect()
}

pub fn load_definitions_file(path: &Path) -> Result<Vec<ElementDef>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let defs = load_definitions(&document)?;
    debug!(path = %path.display(), count = defs.len(), "loaded definitions file");
    Ok(defs)
}

/// Find all `*.json` files under `dir`, sorted by path.
pub fn find_definition_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// Read a gettext template into a string table.
pub fn load_strings(path: &Path) -> Result<StringTable, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let strings = StringTable::from_pot(&text);
    debug!(path = %path.display(), count = strings.len(), "loaded string table");
    Ok(strings)
}

/// Load every definitions file under `dir` into one collection.
pub fn load_directory(dir: &Path, strings: &StringTable) -> Result<Elements, LoadError> {
    let mut defs = Vec::new();
    for path in find_definition_files(dir) {
        defs.extend(load_definitions_file(&path)?);
    }
    Ok(Elements::new(defs, strings)?)
}

/// The built-in sample collection.
pub fn load_sample() -> Result<Elements, LoadError> {
    let document: Value = serde_json::from_str(SAMPLE_DOCUMENT).map_err(|source| LoadError::Json {
        path: PathBuf::from("<sample>"),
        source,
    })?;
    let strings = StringTable::from_iter([
        ("STRINGS.ELEMENTS.ICE.NAME", "<link=\"ICE\">Ice</link>"),
        ("STRINGS.ELEMENTS.WATER.NAME", "<link=\"WATER\">Water</link>"),
        ("STRINGS.ELEMENTS.STEAM.NAME", "<link=\"STEAM\">Steam</link>"),
    ]);
    Ok(Elements::new(load_definitions(&document)?, &strings)?)
}
