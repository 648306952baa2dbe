//! Selection of anatomical CompCor columns from a confounds table

use crate::confounds::schema::ConfoundSchema;
use crate::io::configuration::{COMBINED_MASK, MAX_COMPCOR_COLUMNS, SELECTED_COMPCOR_COLUMNS};
use crate::io::error::{Result, WithPath, missing_column};
use crate::io::table::Table;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Metadata of one regressor in a confounds JSON sidecar
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ComponentInfo {
    /// Tissue mask the component was computed in
    #[serde(rename = "Mask", default)]
    pub mask: Option<String>,
    /// Fraction of variance explained by the component
    #[serde(rename = "VarianceExplained", default)]
    pub variance_explained: Option<f64>,
}

/// Confounds JSON sidecar keyed by column name
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ComponentSidecar {
    entries: BTreeMap<String, ComponentInfo>,
}

impl ComponentSidecar {
    /// Read a sidecar file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object of objects
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_path(path)?;
        let sidecar = Self::parse(&text).with_path(path)?;
        info!("read confounds json '{}'", path.display());
        Ok(sidecar)
    }

    /// Parse sidecar JSON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object of objects
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Combined-mask components with the largest variance explained, ascending
    pub fn top_combined(&self, count: usize) -> Vec<String> {
        let mut combined: Vec<(&String, f64)> = self
            .entries
            .iter()
            .filter(|(_, info)| info.mask.as_deref() == Some(COMBINED_MASK))
            .map(|(name, info)| (name, info.variance_explained.unwrap_or(0.0)))
            .collect();
        combined.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        let skip = combined.len().saturating_sub(count);
        combined
            .into_iter()
            .skip(skip)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Pick the CompCor columns used as regressors
///
/// Up to ten matching columns are used as they are. Beyond that five are
/// selected, by variance explained when a sidecar is given and by column
/// name order otherwise.
///
/// # Errors
///
/// Returns an error if no component column exists or a selected one is absent
pub fn select_components(
    table: &Table,
    schema: ConfoundSchema,
    sidecar: Option<&ComponentSidecar>,
) -> Result<Table> {
    let pattern = schema.compcor_pattern();
    let components = table.filter_columns(pattern);
    if components.n_cols() == 0 {
        return Err(missing_column(
            &format!("{pattern}*"),
            &"CompCor strategies",
        ));
    }
    if components.n_cols() <= MAX_COMPCOR_COLUMNS {
        return Ok(components);
    }

    let names = match sidecar {
        Some(sidecar) => sidecar.top_combined(SELECTED_COMPCOR_COLUMNS),
        None => {
            let mut names = components.columns().to_vec();
            names.sort();
            names.truncate(SELECTED_COMPCOR_COLUMNS);
            names
        }
    };
    components.select(&names, "CompCor component selection")
}
