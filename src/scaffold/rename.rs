//! Rewrites the template's package identity to the new project name

use crate::core::StepError;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

pub const MANIFEST: &str = "package.json";

/// What the rename touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameReport {
    /// Package name found in the template manifest
    pub previous: String,
    pub name: String,
    /// Files whose contents were rewritten, relative to the project root
    pub rewritten: Vec<PathBuf>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Whether a file's contents take part in the identifier rewrite
pub fn should_rewrite(file_name: &str, extensions: &[String]) -> bool {
    if file_name.starts_with('.') || file_name == MANIFEST || file_name.starts_with("README") {
        return false;
    }
    extensions.iter().any(|ext| file_name.ends_with(ext.as_str()))
}

/// Replace every occurrence of `seek` with `replace_with` below `root`
pub fn rewrite_identifiers(
    root: &Path,
    seek: &str,
    replace_with: &str,
    extensions: &[String],
) -> Result<Vec<PathBuf>, StepError> {
    if seek.is_empty() || seek == replace_with {
        return Ok(Vec::new());
    }

    let pattern = Regex::new(&regex::escape(seek))
        .map_err(|e| StepError::msg(format!("invalid package name pattern: {}", e)))?;
    let mut rewritten = Vec::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = entry.map_err(|e| StepError::msg(format!("cannot walk {}: {}", root.display(), e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if !should_rewrite(&file_name, extensions) {
            continue;
        }

        let contents = match fs::read_to_string(entry.path()) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                debug!("Skipping non UTF-8 file {}", entry.path().display());
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if pattern.is_match(&contents) {
            let replaced = pattern.replace_all(&contents, regex::NoExpand(replace_with));
            fs::write(entry.path(), replaced.as_bytes())?;
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            rewritten.push(relative.to_path_buf());
        }
    }

    rewritten.sort();
    Ok(rewritten)
}

/// Set the manifest's name and reset its version, returning the previous name
pub fn update_manifest(root: &Path, name: &str) -> Result<String, StepError> {
    let path = root.join(MANIFEST);
    if !path.is_file() {
        return Err(StepError::msg(format!(
            "{} missing from the template, giving up",
            MANIFEST
        )));
    }

    let mut manifest: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let object = manifest
        .as_object_mut()
        .ok_or_else(|| StepError::msg(format!("{} is not a JSON object", MANIFEST)))?;

    let previous = object
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    object.insert("name".to_string(), Value::from(name));
    object.insert("version".to_string(), Value::from("1.0.0"));

    fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
    Ok(previous)
}

pub fn write_readme(root: &Path, name: &str) -> Result<(), StepError> {
    fs::write(root.join("README.md"), format!("# {}\n\nHello", name))?;
    Ok(())
}

/// Rename the project at `root`: rewrite identifiers, then the manifest and README
pub fn rename_project(root: &Path, name: &str, extensions: &[String]) -> Result<RenameReport, StepError> {
    let manifest: Value = match fs::read_to_string(root.join(MANIFEST)) {
        Ok(content) => serde_json::from_str(&content)?,
        Err(_) => Value::Null,
    };
    let previous = manifest
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let rewritten = rewrite_identifiers(root, &previous, name, extensions)?;
    update_manifest(root, name)?;
    write_readme(root, name)?;

    info!(
        "Renamed '{}' to '{}' ({} files rewritten)",
        previous,
        name,
        rewritten.len()
    );

    Ok(RenameReport {
        previous,
        name: name.to_string(),
        rewritten,
    })
}
