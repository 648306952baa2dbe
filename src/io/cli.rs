//! Command-line interface for the batch transforms

use crate::catalog::{
    CatalogOptions, LabelMap, MatrixCsv, MissingLabelPolicy, catalog_matrix, resolve_key,
};
use crate::compcor::{CompCorOptions, high_variance_confounds};
use crate::confounds::components::ComponentSidecar;
use crate::confounds::{ConfoundOptions, Strategy, build_confounds};
use crate::connectivity::extract::read_region_names;
use crate::connectivity::{
    ConnectivityOptions, ExtractOptions, OutputPaths, ResamplingTarget, build_connectivity,
};
use crate::denoise::{DenoiseOptions, Denoiser, FilterSettings, HighPass};
use crate::io::configuration::{
    DEFAULT_CATALOG_DIR, DEFAULT_COMPCOR_COMPONENTS, DEFAULT_COMPCOR_PERCENTILE,
    DEFAULT_DISCARD_VOLUMES, DEFAULT_FWHM, DEFAULT_HIGHPASS, DEFAULT_LOG_LEVEL, DEFAULT_LOWPASS,
    DEFAULT_OUTPUT_BASE, DEFAULT_SPIKE_THRESHOLD, DEFAULT_STRATEGY,
};
use crate::io::error::{PipelineError, Result};
use crate::io::nifti::Volume;
use crate::io::progress::ProgressManager;
use crate::io::table::Table;
use crate::signal::covariance::Measure;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

/// Parse a value through its `FromStr` impl, rendering the error for clap
fn parse_with<T: FromStr<Err = PipelineError>>(value: &str) -> std::result::Result<T, String> {
    value.parse().map_err(|e: PipelineError| e.to_string())
}

#[derive(Parser, Debug)]
#[command(name = "fcpipe")]
#[command(
    author,
    version,
    about = "fMRI denoising, connectivity matrices and label catalogs"
)]
/// Command-line arguments shared by every transform
pub struct Cli {
    /// Logging verbosity (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Transform to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// The batch transforms
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build confound regressors and denoise a functional image
    Regress(RegressArgs),
    /// Extract region series and compute connectivity matrices
    Makemat(MakematArgs),
    /// Package a labelled matrix with region names
    Catalog(CatalogArgs),
    /// Extract high-variance components as extra regressors
    Compcor(CompcorArgs),
}

/// Arguments of `regress`
#[derive(Args, Debug)]
pub struct RegressArgs {
    /// Functional image to denoise
    #[arg(value_name = "FMRI")]
    pub fmri: PathBuf,

    /// Confounds table (tab-separated)
    #[arg(value_name = "CONFOUNDS")]
    pub confounds: PathBuf,

    /// Brain mask on the functional grid
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Repetition time in seconds; 0 reads it from the image header
    #[arg(long, default_value_t = 0.0)]
    pub tr: f64,

    /// Confound strategy
    #[arg(long, default_value = DEFAULT_STRATEGY, value_parser = parse_with::<Strategy>)]
    pub strategy: Strategy,

    /// Framewise displacement spike threshold; 0 disables spike regression
    #[arg(long, default_value_t = DEFAULT_SPIKE_THRESHOLD)]
    pub spikethr: f64,

    /// Smoothing kernel FWHM in millimetres
    #[arg(long, default_value_t = DEFAULT_FWHM)]
    pub fwhm: f64,

    /// Leading volumes to discard
    #[arg(long, default_value_t = DEFAULT_DISCARD_VOLUMES)]
    pub discardvols: usize,

    /// High-pass cutoff in Hz, or "cosine" to regress the cosine basis
    #[arg(long, default_value = DEFAULT_HIGHPASS, value_parser = parse_with::<HighPass>)]
    pub highpass: HighPass,

    /// Low-pass cutoff in Hz; 0 disables it
    #[arg(long, default_value_t = DEFAULT_LOWPASS)]
    pub lowpass: f64,

    /// Confounds JSON sidecar with CompCor metadata
    #[arg(long)]
    pub confjson: Option<PathBuf>,

    /// Additional regressors (tab- or comma-separated) appended to the design
    #[arg(long)]
    pub add_regressors: Option<PathBuf>,

    /// Output base name
    #[arg(long, default_value = DEFAULT_OUTPUT_BASE)]
    pub out: String,
}

/// Arguments of `makemat`
// Each flag toggles an independent output or processing step
#[allow(clippy::struct_excessive_bools)]
#[derive(Args, Debug)]
pub struct MakematArgs {
    /// Functional image
    #[arg(value_name = "FMRI")]
    pub fmri: PathBuf,

    /// Brain mask on the functional grid
    #[arg(value_name = "MASK")]
    pub mask: PathBuf,

    /// Parcellation images, one matrix each
    #[arg(long, required = true, num_args = 1..)]
    pub parcs: Vec<PathBuf>,

    /// Single-column file of region names
    #[arg(long)]
    pub regionnames: Option<PathBuf>,

    /// Grid the signals are computed on
    #[arg(long, default_value = "labels", value_parser = parse_with::<ResamplingTarget>)]
    pub space: ResamplingTarget,

    /// Connectivity measure
    #[arg(long = "type", default_value = "correlation", value_parser = parse_with::<Measure>)]
    pub measure: Measure,

    /// Detrend region series
    #[arg(long)]
    pub detrend: bool,

    /// Z-score region series
    #[arg(long)]
    pub standardize: bool,

    /// Write region series as a compressed table
    #[arg(long)]
    pub timeseries: bool,

    /// Skip the connectivity matrix
    #[arg(long)]
    pub nomat: bool,

    /// Output base name
    #[arg(long, default_value = DEFAULT_OUTPUT_BASE)]
    pub out: String,
}

/// Arguments of `catalog`
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Labelled connectivity matrix CSV
    #[arg(value_name = "MATRIX_CSV")]
    pub matrix: PathBuf,

    /// Parcellation key file (tab-separated)
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// JSON config with a "key" field
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = DEFAULT_CATALOG_DIR)]
    pub outdir: PathBuf,

    /// Resolve the last fourteen columns as aseg subcortical structures
    #[arg(long)]
    pub subcortical_tail: bool,

    /// Handling of columns without a key entry
    #[arg(long, default_value = "drop", value_parser = parse_with::<MissingLabelPolicy>)]
    pub missing: MissingLabelPolicy,
}

/// Arguments of `compcor`
#[derive(Args, Debug)]
pub struct CompcorArgs {
    /// Functional image
    #[arg(value_name = "FMRI")]
    pub fmri: PathBuf,

    /// Brain mask on the functional grid
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Percentage of highest-variance voxels kept
    #[arg(long, default_value_t = DEFAULT_COMPCOR_PERCENTILE)]
    pub prcnt: f64,

    /// Number of components
    #[arg(long, default_value_t = DEFAULT_COMPCOR_COMPONENTS)]
    pub ncomponents: usize,

    /// Skip detrending before the variance threshold
    #[arg(long)]
    pub nodetrend: bool,

    /// Tag inserted into the component column names
    #[arg(long)]
    pub compcorstr: Option<String>,

    /// Output base name
    #[arg(long, default_value = DEFAULT_OUTPUT_BASE)]
    pub out: String,
}

/// Runs the selected transform and writes its outputs
pub struct FileProcessor {
    cli: Cli,
}

impl FileProcessor {
    /// Create a processor for parsed arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected transform
    ///
    /// # Errors
    ///
    /// Returns an error if reading inputs, computing, or writing outputs fails
    pub fn process(&self) -> Result<()> {
        let start_time = Instant::now();
        info!("arguments: {:?}", self.cli.command);
        match &self.cli.command {
            Command::Regress(args) => run_regress(args)?,
            Command::Makemat(args) => run_makemat(args, self.cli.should_show_progress())?,
            Command::Catalog(args) => run_catalog(args)?,
            Command::Compcor(args) => run_compcor(args)?,
        }
        info!("finished in {:.1?}", start_time.elapsed());
        Ok(())
    }
}

/// `<base><suffix>` as a path
pub fn output_path(base: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{base}{suffix}"))
}

/// Confound construction and denoising
///
/// # Errors
///
/// Returns an error if any input is invalid or an output cannot be written
pub fn run_regress(args: &RegressArgs) -> Result<()> {
    let filter = FilterSettings::new(args.highpass, args.lowpass)?;

    let table = Table::read_tsv(&args.confounds)?;
    let mut options = ConfoundOptions::new(args.strategy);
    options.spike_threshold = (args.spikethr > 0.0).then_some(args.spikethr);
    options.sidecar = args
        .confjson
        .as_deref()
        .map(ComponentSidecar::read)
        .transpose()?;
    options.cosine_basis = filter.uses_cosine_basis();
    options.extra_regressors = args
        .add_regressors
        .as_deref()
        .map(Table::read_regressors)
        .transpose()?;
    let model = build_confounds(&table, &options)?;
    info!(
        "design matrix has {} regressors for strategy {}",
        model.design.n_cols(),
        args.strategy
    );

    let image = Volume::load(&args.fmri)?;
    let mask = args.mask.as_deref().map(Volume::load).transpose()?;
    let denoiser = Denoiser::new(DenoiseOptions {
        filter,
        repetition_time: (args.tr != 0.0).then_some(args.tr),
        smoothing_fwhm: args.fwhm,
        discard_volumes: args.discardvols,
    });
    let output = denoiser.run(&image, mask.as_ref(), model)?;

    output
        .image
        .save(&output_path(&args.out, "_nuisance.nii.gz"))?;
    output
        .confounds
        .write_indexed_csv(&output_path(&args.out, "_outlierdf.csv"))?;
    output
        .summary
        .write_csv(&output_path(&args.out, "_outlierstat.csv"))?;
    info!("wrote outputs with base '{}'", args.out);
    Ok(())
}

/// Connectivity matrices for every parcellation
///
/// # Errors
///
/// Returns an error if any input is invalid or an output cannot be written
pub fn run_makemat(args: &MakematArgs, show_progress: bool) -> Result<()> {
    let image = Volume::load(&args.fmri)?;
    let mask = Volume::load(&args.mask)?;
    let region_names = args
        .regionnames
        .as_deref()
        .map(read_region_names)
        .transpose()?;
    let options = ConnectivityOptions {
        extract: ExtractOptions {
            space: args.space,
            detrend: args.detrend,
            standardize: args.standardize,
        },
        measure: args.measure,
        skip_matrix: args.nomat,
        keep_series: args.timeseries,
        region_names,
    };

    let progress = show_progress.then(|| ProgressManager::new(args.parcs.len()));
    for parcellation in &args.parcs {
        if let Some(pm) = &progress {
            pm.start(parcellation);
        }
        info!("making connectivity matrices for {}", parcellation.display());
        process_parcellation(&image, &mask, parcellation, &options, &args.out)?;
        if let Some(pm) = &progress {
            pm.complete();
        }
    }
    if let Some(pm) = &progress {
        pm.finish();
    }
    Ok(())
}

fn process_parcellation(
    image: &Volume,
    mask: &Volume,
    parcellation: &Path,
    options: &ConnectivityOptions,
    base: &str,
) -> Result<()> {
    let labels = Volume::load(parcellation)?;
    let connectivity = build_connectivity(image, Some(mask), &labels, options)?;
    connectivity.write(&OutputPaths::new(base, parcellation))
}

/// Label manifest and trimmed matrix
///
/// # Errors
///
/// Returns an error if the key or matrix is invalid or an output cannot be written
pub fn run_catalog(args: &CatalogArgs) -> Result<()> {
    let key = resolve_key(args.key.as_deref(), args.config.as_deref())?;
    let labels = LabelMap::read(&key)?;
    let matrix = MatrixCsv::read(&args.matrix)?;
    let catalog = catalog_matrix(
        &labels,
        &matrix,
        &CatalogOptions {
            policy: args.missing,
            subcortical_tail: args.subcortical_tail,
        },
    )?;
    catalog.write(&args.outdir)?;
    Ok(())
}

/// High-variance component table
///
/// # Errors
///
/// Returns an error if the image or mask is invalid or the table cannot be written
pub fn run_compcor(args: &CompcorArgs) -> Result<()> {
    let image = Volume::load(&args.fmri)?;
    let mask = args.mask.as_deref().map(Volume::load).transpose()?;
    let options = CompCorOptions {
        percentile: args.prcnt,
        components: args.ncomponents,
        detrend: !args.nodetrend,
        tag: args.compcorstr.clone(),
    };
    let components = high_variance_confounds(&image, mask.as_ref(), &options)?;
    let path = output_path(&args.out, "acompcor.csv");
    components.write_csv(&path)?;
    info!("wrote {}", path.display());
    Ok(())
}
