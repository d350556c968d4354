use anyhow::{Context, Result};
use schemars::{Schema, schema_for};
use serde_valid::Validate;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::models::Script;
use crate::error::Error;

/// File extension used for saved scripts.
pub const SCRIPT_EXTENSION: &str = "ghostclick";

/// Parse a script document from a string slice.
pub fn load_from_str(s: &str) -> crate::Result<Script> {
    let script: Script = serde_json::from_str(s)?;
    validate_script(&script)?;
    Ok(script)
}

/// Parse a script document from raw bytes.
pub fn load_from_slice(bytes: &[u8]) -> crate::Result<Script> {
    let script: Script = serde_json::from_slice(bytes)?;
    validate_script(&script)?;
    Ok(script)
}

/// Parse a script document from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> crate::Result<Script> {
    let script: Script = serde_json::from_reader(reader)?;
    validate_script(&script)?;
    Ok(script)
}

/// Load a script from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Script> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open script {}", path_ref.display()))?;
    let script = load_from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse script {}", path_ref.display()))?;
    debug!(target: "ghostclick::script", steps = script.len(), "Loaded script from {}", path_ref.display());
    Ok(script)
}

/// Load a script from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<Script> {
    let path_ref = path.as_ref();
    let bytes = tokio::fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read script {}", path_ref.display()))?;
    let script = load_from_slice(&bytes)
        .with_context(|| format!("Failed to parse script {}", path_ref.display()))?;
    debug!(target: "ghostclick::script", steps = script.len(), "Loaded script from {}", path_ref.display());
    Ok(script)
}

/// Serialize a script as pretty-printed JSON.
pub fn to_string_pretty(script: &Script) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(script)?)
}

/// Write a script to any writer as pretty-printed JSON.
pub fn save_to_writer<W: Write>(script: &Script, mut writer: W) -> crate::Result<()> {
    serde_json::to_writer_pretty(&mut writer, script)?;
    writer.flush()?;
    Ok(())
}

/// Save a script to `path`, appending the `.ghostclick` extension when missing.
/// Returns the path actually written.
pub fn save_to_path<P: AsRef<Path>>(script: &Script, path: P) -> Result<PathBuf> {
    let path = with_script_extension(path.as_ref());
    let file = File::create(&path)
        .with_context(|| format!("Failed to create script file {}", path.display()))?;
    save_to_writer(script, file)
        .with_context(|| format!("Failed to write script file {}", path.display()))?;
    debug!(target: "ghostclick::script", steps = script.len(), "Saved script to {}", path.display());
    Ok(path)
}

/// Append the script extension unless the path already ends with it.
pub fn with_script_extension(path: &Path) -> PathBuf {
    let has_ext = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SCRIPT_EXTENSION));
    if has_ext {
        path.to_path_buf()
    } else {
        let mut raw = path.as_os_str().to_os_string();
        raw.push(".");
        raw.push(SCRIPT_EXTENSION);
        PathBuf::from(raw)
    }
}

/// Generate the JSON Schema for the script document (for external validation or tooling).
pub fn generate_schema() -> Schema {
    schema_for!(Script)
}

/// Write the JSON Schema for the script document to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}

/// Check field ranges that the JSON types alone cannot express.
pub fn validate_script(script: &Script) -> crate::Result<()> {
    script
        .validate()
        .map_err(|errs| Error::Config(errs.to_string()))
}
