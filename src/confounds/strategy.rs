//! Closed set of nuisance regression strategies

use crate::io::error::PipelineError;
use std::fmt;
use std::str::FromStr;

/// Motion-based parameter sets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionModel {
    /// Six rigid-body parameters
    Six,
    /// Six motion parameters plus CSF, white matter and global signal
    Nine,
    /// Nine parameters, their derivatives, and squares of both
    ThirtySix,
}

/// Motion terms accompanying the CompCor components
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompCorModel {
    /// Six motion parameters and their derivatives
    TwelveP,
    /// The twelve parameters and their squares
    TwentyFourP,
    /// The twenty-four parameters plus the expanded global signal
    TwentyFourPGsr,
}

impl CompCorModel {
    /// Whether the motion terms include squares
    pub const fn quadratic(self) -> bool {
        !matches!(self, Self::TwelveP)
    }

    /// Whether the expanded global signal terms are appended
    pub const fn global_signal(self) -> bool {
        matches!(self, Self::TwentyFourPGsr)
    }
}

/// Confound strategy, each variant carrying its construction parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Motion (and tissue) parameter sets
    Motion(MotionModel),
    /// Global signal alone, or with derivative and squares (GSR4)
    GlobalSignal {
        /// Add derivative and quadratic terms
        expanded: bool,
    },
    /// Anatomical CompCor components alongside motion parameters
    CompCor(CompCorModel),
    /// Linear trend only
    Linear,
}

impl Strategy {
    /// Every strategy in command-line order
    pub const ALL: [Self; 9] = [
        Self::Motion(MotionModel::ThirtySix),
        Self::Motion(MotionModel::Nine),
        Self::Motion(MotionModel::Six),
        Self::CompCor(CompCorModel::TwelveP),
        Self::CompCor(CompCorModel::TwentyFourP),
        Self::CompCor(CompCorModel::TwentyFourPGsr),
        Self::GlobalSignal { expanded: false },
        Self::GlobalSignal { expanded: true },
        Self::Linear,
    ];

    /// Command-line name of the strategy
    pub const fn name(self) -> &'static str {
        match self {
            Self::Motion(MotionModel::ThirtySix) => "36P",
            Self::Motion(MotionModel::Nine) => "9P",
            Self::Motion(MotionModel::Six) => "6P",
            Self::CompCor(CompCorModel::TwelveP) => "aCompCor",
            Self::CompCor(CompCorModel::TwentyFourP) => "24aCompCor",
            Self::CompCor(CompCorModel::TwentyFourPGsr) => "24aCompCorGsr",
            Self::GlobalSignal { expanded: false } => "globalsig",
            Self::GlobalSignal { expanded: true } => "globalsig4",
            Self::Linear => "linear",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| PipelineError::UnknownStrategy {
                name: s.to_string(),
            })
    }
}
