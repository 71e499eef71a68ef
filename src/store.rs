//! JSON and text persistence. Every file is opened for a single read or write.

use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| Error::io(path, e))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = read_text(path)?;
    serde_json::from_str(&raw).map_err(|e| Error::json(path, e))
}

/// Pretty-printed with two-space indentation; non-ASCII text is written as-is.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut body = serde_json::to_string_pretty(value).map_err(|e| Error::json(path, e))?;
    body.push('\n');
    write_text(path, &body)
}
