//! Label manifest and trimmed matrix built from a labelled connectivity CSV
//!
//! The manifest's first entry is a sentinel for the diagonal; every other
//! entry describes one matrix column, in column order.

use crate::catalog::lookup::{LabelEntry, LabelMap};
use crate::catalog::subcortical::{SUBCORTICAL_TAIL, resolve_tail};
use crate::io::configuration::DIAGONAL_SENTINEL_DESC;
use crate::io::error::{PipelineError, Result, WithPath, fs_error, invalid_data, invalid_parameter};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// What to do with matrix columns that have no key entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingLabelPolicy {
    /// Remove the column and its row so manifest and matrix stay aligned
    #[default]
    Drop,
    /// Leave the matrix untouched; the manifest ends up shorter
    Keep,
    /// Abort the catalog
    Fail,
}

impl MissingLabelPolicy {
    /// Name accepted on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::Keep => "keep",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for MissingLabelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MissingLabelPolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "drop" => Ok(Self::Drop),
            "keep" => Ok(Self::Keep),
            "fail" => Ok(Self::Fail),
            other => Err(invalid_parameter("missing", &other, &"expected drop, keep or fail")),
        }
    }
}

/// One record of `label.json`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestEntry {
    /// A matrix column
    Region {
        /// Region name
        name: String,
        /// Label token
        label: String,
        /// Parcel code
        parcellation: i64,
    },
    /// Leading entry standing for the matrix diagonal
    Diagonal {
        /// Always null
        name: Option<String>,
        /// Sentinel description
        desc: String,
    },
}

impl ManifestEntry {
    /// The diagonal sentinel
    pub fn diagonal() -> Self {
        Self::Diagonal {
            name: None,
            desc: DIAGONAL_SENTINEL_DESC.to_owned(),
        }
    }
}

impl From<&LabelEntry> for ManifestEntry {
    fn from(entry: &LabelEntry) -> Self {
        Self::Region {
            name: entry.name.clone(),
            label: entry.label.clone(),
            parcellation: entry.code,
        }
    }
}

/// Labelled matrix CSV kept as text, exactly as written
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatrixCsv {
    /// Header cells after the leading identifier cell
    pub columns: Vec<String>,
    /// Data rows, each starting with its identifier cell
    pub rows: Vec<Vec<String>>,
}

impl MatrixCsv {
    /// Read a labelled matrix file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or has no header
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).with_path(path)?;
        Self::from_reader(file).with_path(path)
    }

    /// Parse a labelled matrix from any reader
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV is malformed or empty
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut records = reader.records();
        let header = records
            .next()
            .ok_or_else(|| invalid_data(&"matrix file is empty"))??;
        let columns = header.iter().skip(1).map(|c| c.trim().to_owned()).collect();
        let rows = records
            .map(|record| Ok(record?.iter().map(str::to_owned).collect()))
            .collect::<Result<Vec<Vec<String>>>>()?;
        Ok(Self { columns, rows })
    }
}

/// Options for [`catalog_matrix`]
#[derive(Clone, Copy, Debug, Default)]
pub struct CatalogOptions {
    /// Handling of columns without a key entry
    pub policy: MissingLabelPolicy,
    /// Resolve the last fourteen columns as aseg structures
    pub subcortical_tail: bool,
}

/// Manifest plus the matrix it describes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    /// Sentinel followed by one entry per matched column
    pub manifest: Vec<ManifestEntry>,
    /// Matrix rows without header or identifier cells
    pub matrix: Vec<Vec<String>>,
    /// Header cells that had no key entry
    pub unmatched: Vec<String>,
}

/// Files written by [`Catalog::write`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogPaths {
    /// Trimmed matrix
    pub matrix: PathBuf,
    /// Label manifest
    pub manifest: PathBuf,
}

impl CatalogPaths {
    /// `cm.csv` and `label.json` inside `dir`
    pub fn new(dir: &Path) -> Self {
        Self {
            matrix: dir.join("cm.csv"),
            manifest: dir.join("label.json"),
        }
    }
}

/// Match matrix columns to key entries and trim the matrix
///
/// # Errors
///
/// Returns an error if the subcortical tail does not fit the header, or if a
/// column is unmatched under [`MissingLabelPolicy::Fail`]
pub fn catalog_matrix(
    labels: &LabelMap,
    matrix: &MatrixCsv,
    options: &CatalogOptions,
) -> Result<Catalog> {
    let split = if options.subcortical_tail {
        matrix
            .columns
            .len()
            .checked_sub(SUBCORTICAL_TAIL.len())
            .ok_or_else(|| {
                invalid_data(&format!(
                    "matrix has {} columns, fewer than the {} subcortical structures",
                    matrix.columns.len(),
                    SUBCORTICAL_TAIL.len()
                ))
            })?
    } else {
        matrix.columns.len()
    };
    let (cortical, tail) = matrix.columns.split_at(split);

    let mut resolved: Vec<Option<LabelEntry>> = cortical
        .iter()
        .map(|column| labels.lookup(column).cloned())
        .collect();
    if options.subcortical_tail {
        resolved.extend(resolve_tail(tail)?.into_iter().map(Some));
    }

    let unmatched: Vec<String> = matrix
        .columns
        .iter()
        .zip(&resolved)
        .filter(|(_, entry)| entry.is_none())
        .map(|(column, _)| column.clone())
        .collect();
    for column in &unmatched {
        warn!("no {column} in key");
    }

    if !unmatched.is_empty() {
        match options.policy {
            MissingLabelPolicy::Fail => {
                return Err(invalid_data(&format!(
                    "{} matrix columns have no key entry: {}",
                    unmatched.len(),
                    unmatched.join(", ")
                )));
            }
            MissingLabelPolicy::Keep => warn!(
                "manifest lists {} regions but the matrix keeps {} columns",
                resolved.len() - unmatched.len(),
                resolved.len()
            ),
            MissingLabelPolicy::Drop => info!(
                "dropping {} unmatched columns and rows from the matrix",
                unmatched.len()
            ),
        }
    }

    let keep_index = |index: &usize| {
        options.policy != MissingLabelPolicy::Drop
            || resolved.get(*index).is_some_and(Option::is_some)
    };
    let trimmed = matrix
        .rows
        .iter()
        .enumerate()
        .filter(|(index, _)| keep_index(index))
        .map(|(_, row)| {
            row.iter()
                .skip(1)
                .enumerate()
                .filter(|(index, _)| keep_index(index))
                .map(|(_, cell)| cell.trim().to_owned())
                .collect()
        })
        .collect();

    let manifest = std::iter::once(ManifestEntry::diagonal())
        .chain(resolved.iter().flatten().map(ManifestEntry::from))
        .collect();

    Ok(Catalog {
        manifest,
        matrix: trimmed,
        unmatched,
    })
}

impl Catalog {
    /// Write `cm.csv` and `label.json` into `dir`, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or either file cannot be written
    pub fn write(&self, dir: &Path) -> Result<CatalogPaths> {
        std::fs::create_dir_all(dir).map_err(|e| fs_error(dir, "create directory", e))?;
        let paths = CatalogPaths::new(dir);

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&paths.matrix)
            .with_path(&paths.matrix)?;
        for row in &self.matrix {
            writer.write_record(row).with_path(&paths.matrix)?;
        }
        writer.flush().with_path(&paths.matrix)?;

        let file = File::create(&paths.manifest).with_path(&paths.manifest)?;
        let mut out = BufWriter::new(file);
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        self.manifest
            .serialize(&mut serializer)
            .with_path(&paths.manifest)?;
        out.flush().with_path(&paths.manifest)?;

        info!(
            "wrote {} and {}",
            paths.matrix.display(),
            paths.manifest.display()
        );
        Ok(paths)
    }
}
