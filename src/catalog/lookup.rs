//! Parcellation key files mapping numeric codes to region names

use crate::io::error::{Result, WithPath, invalid_data};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// One region of a parcellation key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelEntry {
    /// Region name
    pub name: String,
    /// Label token from the first key column
    pub label: String,
    /// Numeric parcel code
    pub code: i64,
}

/// Code-to-region lookup parsed from a key file
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: BTreeMap<i64, LabelEntry>,
}

impl LabelMap {
    /// Build a lookup from entries with unique codes
    ///
    /// # Errors
    ///
    /// Returns an error if two entries share a code
    pub fn from_entries(entries: impl IntoIterator<Item = LabelEntry>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for entry in entries {
            let code = entry.code;
            if map.insert(code, entry).is_some() {
                return Err(invalid_data(&format!("duplicate parcel code {code} in key")));
            }
        }
        Ok(Self { entries: map })
    }

    /// Read a tab-delimited key file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a row is malformed
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_path(path)?;
        let map = Self::parse(&text)?;
        debug!("read {} labels from '{}'", map.len(), path.display());
        Ok(map)
    }

    /// Parse key text: label token, unused, parcel code, descriptor
    ///
    /// The region name is the second space-separated token of the descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first malformed line, or on duplicate codes
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            entries.push(parse_line(line).map_err(|reason| {
                invalid_data(&format!("key line {}: {reason}", index + 1))
            })?);
        }
        Self::from_entries(entries)
    }

    /// Region with this code
    pub fn get(&self, code: i64) -> Option<&LabelEntry> {
        self.entries.get(&code)
    }

    /// Region named by a matrix header cell, if it holds a known code
    pub fn lookup(&self, header: &str) -> Option<&LabelEntry> {
        header.trim().parse().ok().and_then(|code| self.get(code))
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the key has no regions
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_line(line: &str) -> std::result::Result<LabelEntry, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    let (Some(label), Some(code), Some(descriptor)) = (fields.first(), fields.get(2), fields.get(3))
    else {
        return Err(format!("expected 4 tab-separated fields, found {}", fields.len()));
    };
    let code = code
        .trim()
        .parse()
        .map_err(|e| format!("parcel code '{}' is not an integer: {e}", code.trim()))?;
    let name = descriptor
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| format!("descriptor '{}' has no name token", descriptor.trim()))?;
    Ok(LabelEntry {
        name: name.to_owned(),
        label: label.trim().to_owned(),
        code,
    })
}
