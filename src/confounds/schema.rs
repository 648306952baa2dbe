//! Column naming conventions of confound tables

use crate::io::error::{PipelineError, Result};
use crate::io::table::Table;
use std::fmt;

/// Naming scheme of a confounds table, detected from its global signal column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfoundSchema {
    /// CamelCase names (`GlobalSignal`, `RotX`, `aCompCor00`)
    Legacy,
    /// snake_case names (`global_signal`, `rot_x`, `a_comp_cor_00`)
    Current,
}

impl ConfoundSchema {
    /// Detect the scheme from the presence of a global signal column
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SchemaNotDetected`] if neither name is present
    pub fn detect(table: &Table) -> Result<Self> {
        [Self::Legacy, Self::Current]
            .into_iter()
            .find(|schema| table.has_column(schema.global_signal()))
            .ok_or(PipelineError::SchemaNotDetected {
                available: table.n_cols(),
            })
    }

    /// The six rigid-body motion parameters
    pub const fn motion(self) -> [&'static str; 6] {
        match self {
            Self::Legacy => ["X", "Y", "Z", "RotX", "RotY", "RotZ"],
            Self::Current => ["trans_x", "trans_y", "trans_z", "rot_x", "rot_y", "rot_z"],
        }
    }

    /// Cerebrospinal fluid, white matter and global signal, in that order
    pub const fn tissue(self) -> [&'static str; 3] {
        match self {
            Self::Legacy => ["CSF", "WhiteMatter", "GlobalSignal"],
            Self::Current => ["csf", "white_matter", "global_signal"],
        }
    }

    /// Tissue signals followed by motion parameters
    pub fn nine_parameters(self) -> Vec<&'static str> {
        self.tissue().into_iter().chain(self.motion()).collect()
    }

    /// Global signal column
    pub const fn global_signal(self) -> &'static str {
        match self {
            Self::Legacy => "GlobalSignal",
            Self::Current => "global_signal",
        }
    }

    /// Substring shared by anatomical CompCor columns
    pub const fn compcor_pattern(self) -> &'static str {
        match self {
            Self::Legacy => "aCompCor",
            Self::Current => "a_comp_cor_",
        }
    }

    /// Framewise displacement column
    pub const fn framewise_displacement(self) -> &'static str {
        match self {
            Self::Legacy => "FramewiseDisplacement",
            Self::Current => "framewise_displacement",
        }
    }
}

impl fmt::Display for ConfoundSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("old"),
            Self::Current => f.write_str("new"),
        }
    }
}
