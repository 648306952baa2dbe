//! FreeSurfer aseg structures appended after cortical parcels

use crate::catalog::lookup::LabelEntry;
use crate::io::error::{Result, invalid_data};
use tracing::warn;

/// A subcortical structure with its aseg code
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Structure {
    /// aseg structure name
    pub name: &'static str,
    /// aseg label code
    pub code: i64,
}

const fn structure(name: &'static str, code: i64) -> Structure {
    Structure { name, code }
}

/// Subcortical structures in the order they trail a combined parcellation
pub const SUBCORTICAL_TAIL: [Structure; 14] = [
    structure("Left-Thalamus-Proper", 10),
    structure("Left-Caudate", 11),
    structure("Left-Putamen", 12),
    structure("Left-Pallidum", 13),
    structure("Left-Hippocampus", 17),
    structure("Left-Amygdala", 18),
    structure("Left-Accumbens-area", 26),
    structure("Right-Thalamus-Proper", 49),
    structure("Right-Caudate", 50),
    structure("Right-Putamen", 51),
    structure("Right-Pallidum", 52),
    structure("Right-Hippocampus", 53),
    structure("Right-Amygdala", 54),
    structure("Right-Accumbens-area", 58),
];

/// Resolve the last header cells positionally against [`SUBCORTICAL_TAIL`]
///
/// A header cell that does not hold the expected aseg code is logged; the
/// structure is still assigned by position.
///
/// # Errors
///
/// Returns an error if there are fewer header cells than tail structures
pub fn resolve_tail<S: AsRef<str>>(tail: &[S]) -> Result<Vec<LabelEntry>> {
    if tail.len() != SUBCORTICAL_TAIL.len() {
        return Err(invalid_data(&format!(
            "subcortical tail needs {} columns, found {}",
            SUBCORTICAL_TAIL.len(),
            tail.len()
        )));
    }
    Ok(tail
        .iter()
        .zip(SUBCORTICAL_TAIL)
        .map(|(header, structure)| {
            let header = header.as_ref().trim();
            if header.parse::<i64>().ok() != Some(structure.code) {
                warn!(
                    "column '{header}' mapped to {} (expected code {})",
                    structure.name, structure.code
                );
            }
            LabelEntry {
                name: structure.name.to_owned(),
                label: header.to_owned(),
                code: structure.code,
            }
        })
        .collect())
}
