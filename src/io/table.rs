//! Named-column numeric tables backed by delimited text files
//!
//! Every delimited input of the pipeline (confound tables, auxiliary
//! regressors, written design matrices) is read into a [`Table`]: a list of
//! unique column names over an `Array2<f64>` with one row per time point.

use crate::io::error::{PipelineError, Result, WithPath, invalid_data, missing_column};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use ndarray::{Array1, Array2, ArrayView1, Axis, concatenate};
use std::io::{Read, Write};
use std::path::Path;

/// Cell spellings treated as missing values
const MISSING_MARKERS: [&str; 4] = ["", "n/a", "NA", "nan"];

/// Column-labelled numeric table with one row per time point
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    data: Array2<f64>,
}

impl Table {
    /// Create a table from column names and a rows-by-columns array
    ///
    /// # Errors
    ///
    /// Returns an error if the name count differs from the array width or a
    /// column name is repeated
    pub fn new(columns: Vec<String>, data: Array2<f64>) -> Result<Self> {
        if columns.len() != data.ncols() {
            return Err(invalid_data(&format!(
                "{} column names for {} data columns",
                columns.len(),
                data.ncols()
            )));
        }
        for (i, name) in columns.iter().enumerate() {
            if columns.iter().skip(i + 1).any(|other| other == name) {
                return Err(invalid_data(&format!("duplicate column name '{name}'")));
            }
        }
        Ok(Self { columns, data })
    }

    /// Create a table with `rows` rows and no columns
    pub fn empty(rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            data: Array2::zeros((rows, 0)),
        }
    }

    /// Read a tab-delimited table with a header row
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a cell is not numeric
    pub fn read_tsv(path: &Path) -> Result<Self> {
        Self::read_delimited(path, b'\t', false)
    }

    /// Read a comma-delimited table whose first column is a row index
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a cell is not numeric
    pub fn read_indexed_csv(path: &Path) -> Result<Self> {
        Self::read_delimited(path, b',', true)
    }

    /// Read an auxiliary regressor table, tab- or comma-delimited
    ///
    /// The delimiter is taken from the header line: tab when it holds one,
    /// comma otherwise. Tables written by [`Table::write_csv`] read back as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a cell is not numeric
    pub fn read_regressors(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_path(path)?;
        let header = text.lines().next().unwrap_or_default();
        let delimiter = if header.contains('\t') { b'\t' } else { b',' };
        Self::from_reader(text.as_bytes(), delimiter, false).with_path(path)
    }

    fn read_delimited(path: &Path, delimiter: u8, indexed: bool) -> Result<Self> {
        let file = std::fs::File::open(path).with_path(path)?;
        Self::from_reader(file, delimiter, indexed).with_path(path)
    }

    /// Parse a delimited table from any reader
    ///
    /// When `indexed` is set, the first column is treated as a row index and dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a rectangular numeric table
    pub fn from_reader<R: Read>(reader: R, delimiter: u8, indexed: bool) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(Trim::All)
            .from_reader(reader);

        let skip = usize::from(indexed);
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .skip(skip)
            .map(str::to_string)
            .collect();

        let mut values = Vec::new();
        let mut rows = 0;
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() != columns.len() + skip {
                return Err(invalid_data(&format!(
                    "row {row} has {} fields, expected {}",
                    record.len(),
                    columns.len() + skip
                )));
            }
            for (col, cell) in record.iter().skip(skip).enumerate() {
                values.push(parse_cell(cell).ok_or_else(|| {
                    invalid_data(&format!(
                        "non-numeric value '{cell}' in row {row}, column '{}'",
                        columns.get(col).map_or("?", String::as_str)
                    ))
                })?);
            }
            rows += 1;
        }

        let data = Array2::from_shape_vec((rows, columns.len()), values)
            .map_err(|e| invalid_data(&e))?;
        Self::new(columns, data)
    }

    /// Write the table as CSV with a leading unnamed row index column
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn write_indexed_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).with_path(path)?;
        self.to_writer(file, true).with_path(path)
    }

    /// Write the table as CSV without a row index
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).with_path(path)?;
        self.to_writer(file, false).with_path(path)
    }

    /// Serialize the table as CSV into any writer
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails
    pub fn to_writer<W: Write>(&self, writer: W, indexed: bool) -> Result<()> {
        let mut writer = WriterBuilder::new().from_writer(writer);

        let mut header: Vec<&str> = Vec::with_capacity(self.columns.len() + 1);
        if indexed {
            header.push("");
        }
        header.extend(self.columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        for (index, row) in self.data.axis_iter(Axis(0)).enumerate() {
            let mut record: Vec<String> = Vec::with_capacity(row.len() + 1);
            if indexed {
                record.push(index.to_string());
            }
            record.extend(row.iter().map(|v| format_cell(*v)));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Number of rows (time points)
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Underlying rows-by-columns array
    pub const fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Consume the table and return its array
    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    /// Whether a column with this exact name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// View of a single column by name
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.data.column(index))
    }

    /// Select named columns in the given order
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingColumn`] naming the first absent column
    pub fn select<S: AsRef<str>>(&self, names: &[S], context: &str) -> Result<Self> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let index = self
                .columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| missing_column(name, &context))?;
            indices.push(index);
        }
        Ok(Self {
            columns: names.iter().map(|n| n.as_ref().to_string()).collect(),
            data: self.data.select(Axis(1), &indices),
        })
    }

    /// All columns whose name contains `pattern`, in table order
    pub fn filter_columns(&self, pattern: &str) -> Self {
        let indices: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| name.contains(pattern))
            .map(|(i, _)| i)
            .collect();
        Self {
            columns: indices
                .iter()
                .filter_map(|&i| self.columns.get(i).cloned())
                .collect(),
            data: self.data.select(Axis(1), &indices),
        }
    }

    /// First difference of every column, first row filled with zero
    pub fn derivative(&self, suffix: &str) -> Self {
        let mut data = Array2::zeros(self.data.raw_dim());
        for (mut out, col) in data
            .axis_iter_mut(Axis(1))
            .zip(self.data.axis_iter(Axis(1)))
        {
            for (t, value) in out.iter_mut().enumerate().skip(1) {
                let current = col.get(t).copied().unwrap_or(f64::NAN);
                let previous = col.get(t - 1).copied().unwrap_or(f64::NAN);
                let diff = current - previous;
                *value = if diff.is_nan() { 0.0 } else { diff };
            }
        }
        Self {
            columns: self.renamed(suffix),
            data,
        }
    }

    /// Element-wise square of every column
    pub fn squared(&self, suffix: &str) -> Self {
        Self {
            columns: self.renamed(suffix),
            data: self.data.mapv(|v| v * v),
        }
    }

    fn renamed(&self, suffix: &str) -> Vec<String> {
        self.columns.iter().map(|c| format!("{c}{suffix}")).collect()
    }

    /// Concatenate tables side by side
    ///
    /// # Errors
    ///
    /// Returns an error if row counts differ or column names collide
    pub fn hstack(parts: &[&Self]) -> Result<Self> {
        let Some(first) = parts.first() else {
            return Ok(Self::empty(0));
        };
        let rows = first.n_rows();
        if let Some(bad) = parts.iter().find(|p| p.n_rows() != rows) {
            return Err(invalid_data(&format!(
                "cannot concatenate tables with {rows} and {} rows",
                bad.n_rows()
            )));
        }
        let views: Vec<_> = parts.iter().map(|p| p.data.view()).collect();
        let data = concatenate(Axis(1), &views).map_err(|e| invalid_data(&e))?;
        let columns = parts.iter().flat_map(|p| p.columns.clone()).collect();
        Self::new(columns, data)
    }

    /// Append a single named column
    ///
    /// # Errors
    ///
    /// Returns an error if the length differs from the row count or the name exists
    pub fn push_column(self, name: &str, values: Array1<f64>) -> Result<Self> {
        if values.len() != self.n_rows() {
            return Err(invalid_data(&format!(
                "column '{name}' has {} values for {} rows",
                values.len(),
                self.n_rows()
            )));
        }
        let column = Self {
            columns: vec![name.to_string()],
            data: values.insert_axis(Axis(1)),
        };
        Self::hstack(&[&self, &column])
    }
}

impl TryFrom<(Vec<&str>, Array2<f64>)> for Table {
    type Error = PipelineError;

    fn try_from((columns, data): (Vec<&str>, Array2<f64>)) -> Result<Self> {
        Self::new(columns.into_iter().map(str::to_string).collect(), data)
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    if MISSING_MARKERS.contains(&cell) {
        return Some(f64::NAN);
    }
    match cell {
        "True" | "true" => Some(1.0),
        "False" | "false" => Some(0.0),
        _ => cell.parse().ok(),
    }
}

// Display output is the shortest string that parses back to the same value
fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}
