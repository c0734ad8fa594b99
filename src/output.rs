use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

/// Write `data` to `path` as pretty-printed JSON.
///
/// With `append` set and an existing file, the current content is read as a
/// JSON list (a non-list value is wrapped into one), `data` is pushed and the
/// whole list rewritten. Otherwise the file is overwritten.
pub fn to_json<T: Serialize>(data: &T, path: impl AsRef<Path>, append: bool) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let value = serde_json::to_value(data).context("Failed to serialize data to json.")?;
    let to_write = if append && path.exists() {
        let existing = fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<Value>(&content).ok());
        let mut items = match existing {
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
            None => Vec::new(),
        };
        items.push(value);
        Value::Array(items)
    } else {
        value
    };

    fs::write(path, serde_json::to_string_pretty(&to_write)?)
        .context(format!("Failed to write {:?}", path))?;
    Ok(())
}

/// Write `rows` to `path` as CSV, the header inferred from the row type.
///
/// With `append` set and an existing file, rows are appended without
/// rewriting the header. Empty input writes nothing.
pub fn to_csv<T: Serialize>(rows: &[T], path: impl AsRef<Path>, append: bool) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let path = path.as_ref();
    ensure_parent(path)?;

    let appending = append && path.exists();
    let file = if appending {
        fs::OpenOptions::new().append(true).open(path)
    } else {
        fs::File::create(path)
    }
    .context(format!("Failed to open {:?}", path))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(!appending)
        .from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).context(format!("Failed to create {:?}", parent))?;
        }
    }
    Ok(())
}
