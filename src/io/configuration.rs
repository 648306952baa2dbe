//! Pipeline constants and runtime configuration defaults

// Defaults for the regress subcommand
/// Default confound strategy name
pub const DEFAULT_STRATEGY: &str = "36P";
/// Default framewise displacement threshold for spike regression
pub const DEFAULT_SPIKE_THRESHOLD: f64 = 0.5;
/// Default smoothing kernel full width at half maximum (mm)
pub const DEFAULT_FWHM: f64 = 6.0;
/// Default number of leading volumes to discard after cleaning
pub const DEFAULT_DISCARD_VOLUMES: usize = 4;
/// Default high-pass cutoff (Hz)
pub const DEFAULT_HIGHPASS: &str = "0.008";
/// Default low-pass cutoff (Hz)
pub const DEFAULT_LOWPASS: f64 = 0.08;

/// Sentinel accepted in place of a numeric high-pass cutoff
pub const COSINE_SENTINEL: &str = "cosine";

// A disabled spike regression still counts usable volumes against this
/// Threshold that no framewise displacement value reaches
pub const NEVER_TRIGGER_THRESHOLD: f64 = 99_999.0;

// CompCor column selection
/// Component columns tolerated before a subset is selected
pub const MAX_COMPCOR_COLUMNS: usize = 10;
/// Number of component columns kept when a subset is selected
pub const SELECTED_COMPCOR_COLUMNS: usize = 5;
/// Mask value identifying combined-tissue components in the confounds sidecar
pub const COMBINED_MASK: &str = "combined";

// Derived column naming
/// Suffix of temporal derivative columns
pub const DERIVATIVE_SUFFIX: &str = "_der";
/// Suffix of quadratic expansion columns
pub const QUADRATIC_SUFFIX: &str = "_2";
/// Name of the linear trend column
pub const LINEAR_TREND_COLUMN: &str = "lin";
/// Prefix of spike regressor columns
pub const OUTLIER_PREFIX: &str = "outlier";
/// Substring identifying discrete cosine basis columns
pub const COSINE_PATTERN: &str = "cosine";

/// Butterworth filter order used by the band-pass stage
pub const BUTTERWORTH_ORDER: usize = 5;

/// Gaussian smoothing kernels are truncated at this many standard deviations
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

// Symmetry check tolerance, matching the usual allclose defaults
/// Relative tolerance of the symmetry check
pub const SYMMETRY_RTOL: f64 = 1e-5;
/// Absolute tolerance of the symmetry check
pub const SYMMETRY_ATOL: f64 = 1e-8;

// Past this many missing regions the mismatch is likely spatial, not anatomical
/// Missing-region count above which a spatial mismatch is suspected
pub const MISSING_REGION_MARGIN: usize = 9;

/// Significant digits written to labelled connectivity matrices
pub const MATRIX_SIGNIFICANT_DIGITS: usize = 6;

// Defaults for the compcor subcommand
/// Percentile of highest-variance voxels kept
pub const DEFAULT_COMPCOR_PERCENTILE: f64 = 2.0;
/// Number of components extracted
pub const DEFAULT_COMPCOR_COMPONENTS: usize = 5;
/// Column prefix of extracted components
pub const COMPCOR_COLUMN_PREFIX: &str = "a_comp_cor_";

// Catalog outputs
/// Default output directory of the catalog subcommand
pub const DEFAULT_CATALOG_DIR: &str = "cm";
/// Description attached to the diagonal sentinel entry
pub const DIAGONAL_SENTINEL_DESC: &str = "index-0 is the diagonal";

/// Default output base name
pub const DEFAULT_OUTPUT_BASE: &str = "output";
/// Default logging level
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
