//! Assembly of the nuisance design matrix for a strategy

use crate::confounds::components::{ComponentSidecar, select_components};
use crate::confounds::schema::ConfoundSchema;
use crate::confounds::spikes::{OutlierSummary, spike_regressors};
use crate::confounds::strategy::{MotionModel, Strategy};
use crate::io::configuration::{
    COSINE_PATTERN, DERIVATIVE_SUFFIX, LINEAR_TREND_COLUMN, NEVER_TRIGGER_THRESHOLD,
    QUADRATIC_SUFFIX,
};
use crate::io::error::{Result, invalid_data, missing_column};
use crate::io::table::Table;
use ndarray::Array1;
use tracing::info;

/// Everything besides the confounds table that shapes the design matrix
#[derive(Clone, Debug)]
pub struct ConfoundOptions {
    /// Which regressor set to build
    pub strategy: Strategy,
    /// Framewise displacement threshold; `None` disables spike regression
    pub spike_threshold: Option<f64>,
    /// Variance-explained metadata for CompCor selection
    pub sidecar: Option<ComponentSidecar>,
    /// Append the table's discrete cosine basis columns
    pub cosine_basis: bool,
    /// Extra regressors appended as they are
    pub extra_regressors: Option<Table>,
}

impl ConfoundOptions {
    /// Options for a strategy with every optional input disabled
    pub const fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            spike_threshold: None,
            sidecar: None,
            cosine_basis: false,
            extra_regressors: None,
        }
    }
}

/// Design matrix together with the motion bookkeeping that produced it
#[derive(Clone, Debug, PartialEq)]
pub struct ConfoundModel {
    /// Time-by-regressor design matrix
    pub design: Table,
    /// Retained versus outlier volume counts
    pub summary: OutlierSummary,
    /// Per-volume outlier flags
    pub outlier_flags: Vec<bool>,
    /// Naming scheme detected in the source table
    pub schema: ConfoundSchema,
}

// Motion and signal parameter sets derived from one table
struct ParameterSets<'a> {
    table: &'a Table,
    schema: ConfoundSchema,
    context: String,
}

impl ParameterSets<'_> {
    fn p6(&self) -> Result<Table> {
        self.table.select(&self.schema.motion(), &self.context)
    }

    fn p9(&self) -> Result<Table> {
        self.table.select(&self.schema.nine_parameters(), &self.context)
    }

    fn p12(&self) -> Result<Table> {
        with_derivative(&self.p6()?)
    }

    fn p24(&self) -> Result<Table> {
        with_quadratic(&self.p12()?)
    }

    fn p18(&self) -> Result<Table> {
        with_derivative(&self.p9()?)
    }

    fn p36(&self) -> Result<Table> {
        with_quadratic(&self.p18()?)
    }

    fn global_signal(&self) -> Result<Table> {
        self.table.select(&[self.schema.global_signal()], &self.context)
    }

    fn gsr4(&self) -> Result<Table> {
        let gs = self.global_signal()?;
        let derivative = gs.derivative(DERIVATIVE_SUFFIX);
        Table::hstack(&[
            &gs,
            &gs.squared(QUADRATIC_SUFFIX),
            &derivative,
            &derivative.squared(QUADRATIC_SUFFIX),
        ])
    }
}

fn with_derivative(base: &Table) -> Result<Table> {
    Table::hstack(&[base, &base.derivative(DERIVATIVE_SUFFIX)])
}

fn with_quadratic(base: &Table) -> Result<Table> {
    Table::hstack(&[base, &base.squared(QUADRATIC_SUFFIX)])
}

/// Linear trend 1..=n
pub fn linear_trend(n: usize) -> Array1<f64> {
    Array1::from_iter((1..=n).map(|t| t as f64))
}

/// Build the design matrix for `options.strategy` from a confounds table
///
/// Column order: strategy regressors, linear trend, cosine basis, extra
/// regressors, spike indicators.
///
/// # Errors
///
/// Returns an error if the naming scheme cannot be detected, a required
/// column is missing, or appended regressors have the wrong length
pub fn build_confounds(table: &Table, options: &ConfoundOptions) -> Result<ConfoundModel> {
    let schema = ConfoundSchema::detect(table)?;
    info!("detected {schema} confounds names");

    let sets = ParameterSets {
        table,
        schema,
        context: format!("strategy {}", options.strategy),
    };
    let n = table.n_rows();

    let mut design = match options.strategy {
        Strategy::Motion(MotionModel::Six) => sets.p6()?,
        Strategy::Motion(MotionModel::Nine) => sets.p9()?,
        Strategy::Motion(MotionModel::ThirtySix) => sets.p36()?,
        Strategy::GlobalSignal { expanded: false } => sets.global_signal()?,
        Strategy::GlobalSignal { expanded: true } => sets.gsr4()?,
        Strategy::CompCor(model) => {
            let components = select_components(table, schema, options.sidecar.as_ref())?;
            let motion = if model.quadratic() {
                sets.p24()?
            } else {
                sets.p12()?
            };
            let mut parts = vec![motion, components];
            if model.global_signal() {
                parts.push(sets.gsr4()?);
            }
            Table::hstack(&parts.iter().collect::<Vec<_>>())?
        }
        Strategy::Linear => Table::empty(n),
    };
    design = design.push_column(LINEAR_TREND_COLUMN, linear_trend(n))?;

    if options.cosine_basis {
        let cosine = table.filter_columns(COSINE_PATTERN);
        info!("adding {} cosine basis columns", cosine.n_cols());
        design = Table::hstack(&[&design, &cosine])?;
    }

    if let Some(extra) = &options.extra_regressors {
        if extra.n_rows() != n {
            return Err(invalid_data(&format!(
                "additional regressors have {} rows, confounds have {n}",
                extra.n_rows()
            )));
        }
        design = Table::hstack(&[&design, extra])?;
    }

    let displacement = table
        .column(schema.framewise_displacement())
        .ok_or_else(|| missing_column(schema.framewise_displacement(), &"spike detection"))?
        .to_vec();
    let threshold = options
        .spike_threshold
        .filter(|&t| t > 0.0)
        .unwrap_or(NEVER_TRIGGER_THRESHOLD);
    let spikes = spike_regressors(&displacement, threshold);

    if options.spike_threshold.is_some_and(|t| t > 0.0) {
        info!(
            "spike regression flagged {} of {n} volumes",
            spikes.summary.outliers
        );
        design = Table::hstack(&[&design, &spikes.regressors])?;
    }

    Ok(ConfoundModel {
        design,
        summary: spikes.summary,
        outlier_flags: spikes.flags,
        schema,
    })
}
