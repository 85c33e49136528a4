//! The owned bundle of matrix data and parallel metadata tables.

use crate::data::{OperationInfo, TimeSeriesInfo};
use crate::error::{NormalizeError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Provenance fields recorded upstream and passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Whether the matrix was imported from an external source.
    pub from_external: bool,
    /// Optional version-control descriptor of the producing code.
    pub source_version: Option<String>,
}

/// A feature-by-observation matrix with its parallel structures.
///
/// Rows are observations (time series), columns are features (operations).
/// Missing entries are `f64::NAN`; a strictly positive quality code marks an
/// entry invalid regardless of its stored value. Every subsetting operation
/// returns a new owned set with the data matrix, quality codes, timings, and
/// both descriptor tables trimmed in lock-step, so the shape invariant
/// (`nrows == time_series.len()`, `ncols == operations.len()`) holds at every
/// pipeline stage.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// Feature values (observations × features).
    data: DMatrix<f64>,
    /// Parallel quality codes; > 0 means invalid.
    quality: DMatrix<u32>,
    /// Per-observation descriptors, row-aligned.
    time_series: Vec<TimeSeriesInfo>,
    /// Per-feature descriptors, column-aligned.
    operations: Vec<OperationInfo>,
    /// Optional per-entry calculation timings, same shape as `data`.
    timings: Option<DMatrix<f64>>,
    /// Pass-through provenance fields.
    provenance: Provenance,
}

impl FeatureSet {
    /// Create a new FeatureSet, validating that all structures align.
    pub fn new(
        data: DMatrix<f64>,
        quality: DMatrix<u32>,
        time_series: Vec<TimeSeriesInfo>,
        operations: Vec<OperationInfo>,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if quality.shape() != (nrows, ncols) {
            return Err(NormalizeError::DimensionMismatch {
                expected: nrows * ncols,
                actual: quality.nrows() * quality.ncols(),
            });
        }
        if time_series.len() != nrows {
            return Err(NormalizeError::DimensionMismatch {
                expected: nrows,
                actual: time_series.len(),
            });
        }
        if operations.len() != ncols {
            return Err(NormalizeError::DimensionMismatch {
                expected: ncols,
                actual: operations.len(),
            });
        }
        Ok(Self {
            data,
            quality,
            time_series,
            operations,
            timings: None,
            provenance: Provenance::default(),
        })
    }

    /// Create a set with all quality codes zero (every entry trusted).
    pub fn without_quality(
        data: DMatrix<f64>,
        time_series: Vec<TimeSeriesInfo>,
        operations: Vec<OperationInfo>,
    ) -> Result<Self> {
        let quality = DMatrix::zeros(data.nrows(), data.ncols());
        Self::new(data, quality, time_series, operations)
    }

    /// Attach a timing matrix (must match the data shape).
    pub fn with_timings(mut self, timings: DMatrix<f64>) -> Result<Self> {
        if timings.shape() != self.data.shape() {
            return Err(NormalizeError::DimensionMismatch {
                expected: self.data.nrows() * self.data.ncols(),
                actual: timings.nrows() * timings.ncols(),
            });
        }
        self.timings = Some(timings);
        Ok(self)
    }

    /// Drop the timing matrix, if any.
    pub fn clear_timings(&mut self) {
        self.timings = None;
    }

    /// Attach provenance fields.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Number of observations (rows).
    #[inline]
    pub fn n_observations(&self) -> usize {
        self.data.nrows()
    }

    /// Number of features (columns).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    /// The feature matrix.
    #[inline]
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// The quality code matrix.
    #[inline]
    pub fn quality(&self) -> &DMatrix<u32> {
        &self.quality
    }

    /// Per-observation descriptors.
    #[inline]
    pub fn time_series(&self) -> &[TimeSeriesInfo] {
        &self.time_series
    }

    /// Per-feature descriptors.
    #[inline]
    pub fn operations(&self) -> &[OperationInfo] {
        &self.operations
    }

    /// Optional timing matrix.
    #[inline]
    pub fn timings(&self) -> Option<&DMatrix<f64>> {
        self.timings.as_ref()
    }

    /// Pass-through provenance.
    #[inline]
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// One observation (row) as a dense vector.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().copied().collect()
    }

    /// One feature (column) as a dense vector.
    pub fn column(&self, col: usize) -> Vec<f64> {
        self.data.column(col).iter().copied().collect()
    }

    /// Replace the feature matrix with one of identical shape.
    ///
    /// Used by the masking and normalization stages, which rewrite values but
    /// never change the shape.
    pub fn replace_data(&mut self, data: DMatrix<f64>) -> Result<()> {
        if data.shape() != self.data.shape() {
            return Err(NormalizeError::DimensionMismatch {
                expected: self.data.nrows() * self.data.ncols(),
                actual: data.nrows() * data.ncols(),
            });
        }
        self.data = data;
        Ok(())
    }

    /// Subset to the given observations (by row index), keeping all parallel
    /// structures in lock-step.
    pub fn subset_rows(&self, indices: &[usize]) -> Result<Self> {
        for &i in indices {
            if i >= self.n_observations() {
                return Err(NormalizeError::DimensionMismatch {
                    expected: self.n_observations(),
                    actual: i,
                });
            }
        }
        let data = self.data.select_rows(indices);
        let quality = self.quality.select_rows(indices);
        let timings = self.timings.as_ref().map(|t| t.select_rows(indices));
        let time_series = indices
            .iter()
            .map(|&i| self.time_series[i].clone())
            .collect();
        Ok(Self {
            data,
            quality,
            time_series,
            operations: self.operations.clone(),
            timings,
            provenance: self.provenance.clone(),
        })
    }

    /// Subset to the given features (by column index), keeping all parallel
    /// structures in lock-step.
    pub fn subset_columns(&self, indices: &[usize]) -> Result<Self> {
        for &j in indices {
            if j >= self.n_features() {
                return Err(NormalizeError::DimensionMismatch {
                    expected: self.n_features(),
                    actual: j,
                });
            }
        }
        let data = self.data.select_columns(indices);
        let quality = self.quality.select_columns(indices);
        let timings = self.timings.as_ref().map(|t| t.select_columns(indices));
        let operations = indices
            .iter()
            .map(|&j| self.operations[j].clone())
            .collect();
        Ok(Self {
            data,
            quality,
            time_series: self.time_series.clone(),
            operations,
            timings,
            provenance: self.provenance.clone(),
        })
    }

    /// Load a feature set from TSV files.
    ///
    /// The data file holds one observation per row: a name column followed by
    /// feature values, with operation names in the header. `NaN` (any case)
    /// and empty fields are read as missing. The optional quality file has
    /// the same layout with integer codes. The optional groups file maps
    /// `name\tgroup` for class labels.
    pub fn from_tsv_parts<P: AsRef<Path>>(
        data_path: P,
        quality_path: Option<P>,
        groups_path: Option<P>,
    ) -> Result<Self> {
        let (values, mut time_series, operations) = read_value_tsv(data_path.as_ref())?;
        let nrows = time_series.len();
        let ncols = operations.len();
        let data = DMatrix::from_fn(nrows, ncols, |i, j| values[i][j]);

        let quality = match quality_path {
            Some(path) => {
                let (qvalues, qrows, qcols) = read_value_tsv(path.as_ref())?;
                if qrows.len() != nrows || qcols.len() != ncols {
                    return Err(NormalizeError::DimensionMismatch {
                        expected: nrows * ncols,
                        actual: qrows.len() * qcols.len(),
                    });
                }
                DMatrix::from_fn(nrows, ncols, |i, j| {
                    let v = qvalues[i][j];
                    if v.is_nan() || v < 0.0 {
                        0
                    } else {
                        v as u32
                    }
                })
            }
            None => DMatrix::zeros(nrows, ncols),
        };

        if let Some(path) = groups_path {
            let labels = read_group_tsv(path.as_ref())?;
            for info in &mut time_series {
                if let Some(group) = labels.iter().find(|(n, _)| n == &info.name) {
                    info.group = Some(group.1.clone());
                }
            }
        }

        Self::new(data, quality, time_series, operations)
    }

    /// Write the feature matrix to a TSV file in the layout accepted by
    /// `from_tsv_parts`.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "name")?;
        for op in &self.operations {
            write!(writer, "\t{}", op.name)?;
        }
        writeln!(writer)?;

        for (i, info) in self.time_series.iter().enumerate() {
            write!(writer, "{}", info.name)?;
            for j in 0..self.n_features() {
                let v = self.data[(i, j)];
                if v.is_nan() {
                    write!(writer, "\tNaN")?;
                } else {
                    write!(writer, "\t{}", v)?;
                }
            }
            writeln!(writer)?;
        }

        Ok(())
    }
}

/// Parse a name-plus-values TSV into rows, observation descriptors, and
/// operation descriptors.
#[allow(clippy::type_complexity)]
fn read_value_tsv(path: &Path) -> Result<(Vec<Vec<f64>>, Vec<TimeSeriesInfo>, Vec<OperationInfo>)> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header_line = lines
        .next()
        .ok_or_else(|| NormalizeError::EmptyData("Empty TSV file".to_string()))??;
    let header: Vec<&str> = header_line.split('\t').collect();
    if header.len() < 2 {
        return Err(NormalizeError::EmptyData(
            "TSV must have at least one feature column".to_string(),
        ));
    }
    let operations: Vec<OperationInfo> = header[1..]
        .iter()
        .enumerate()
        .map(|(j, name)| OperationInfo::new(name.trim(), j))
        .collect();
    let n_features = operations.len();

    let mut values: Vec<Vec<f64>> = Vec::new();
    let mut time_series: Vec<TimeSeriesInfo> = Vec::new();

    for (row_idx, line_result) in lines.enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        time_series.push(TimeSeriesInfo::new(fields[0].trim()));

        let mut row = vec![f64::NAN; n_features];
        for (col_idx, raw) in fields[1..].iter().enumerate() {
            if col_idx >= n_features {
                break;
            }
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
                continue;
            }
            row[col_idx] = trimmed
                .parse::<f64>()
                .map_err(|_| NormalizeError::InvalidValue {
                    value: trimmed.to_string(),
                    row: row_idx,
                    col: col_idx,
                })?;
        }
        values.push(row);
    }

    if values.is_empty() {
        return Err(NormalizeError::EmptyData("No observations in TSV".to_string()));
    }

    Ok((values, time_series, operations))
}

/// Parse a `name\tgroup` TSV (header line skipped).
fn read_group_tsv(path: &Path) -> Result<Vec<(String, String)>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut labels = Vec::new();
    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if idx == 0 || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() >= 2 {
            labels.push((fields[0].trim().to_string(), fields[1].trim().to_string()));
        }
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn create_test_set() -> FeatureSet {
        // 3 observations × 4 features
        let data = DMatrix::from_row_slice(
            3,
            4,
            &[
                1.0, 2.0, 3.0, 4.0, //
                5.0, f64::NAN, 7.0, 8.0, //
                9.0, 10.0, 11.0, 12.0,
            ],
        );
        let mut quality = DMatrix::zeros(3, 4);
        quality[(2, 3)] = 1;
        let time_series = vec![
            TimeSeriesInfo::new("ts_1"),
            TimeSeriesInfo::new("ts_2"),
            TimeSeriesInfo::new("ts_3"),
        ];
        let operations = (0..4)
            .map(|j| OperationInfo::new(format!("op_{}", j), j))
            .collect();
        FeatureSet::new(data, quality, time_series, operations).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let set = create_test_set();
        assert_eq!(set.n_observations(), 3);
        assert_eq!(set.n_features(), 4);
    }

    #[test]
    fn test_misaligned_metadata_rejected() {
        let data = DMatrix::zeros(2, 2);
        let quality = DMatrix::zeros(2, 2);
        let time_series = vec![TimeSeriesInfo::new("only_one")];
        let operations = vec![OperationInfo::new("a", 0), OperationInfo::new("b", 1)];
        assert!(FeatureSet::new(data, quality, time_series, operations).is_err());
    }

    #[test]
    fn test_subset_rows_lockstep() {
        let set = create_test_set();
        let subset = set.subset_rows(&[0, 2]).unwrap();

        assert_eq!(subset.n_observations(), 2);
        assert_eq!(subset.n_features(), 4);
        assert_eq!(subset.time_series()[1].name, "ts_3");
        assert_eq!(subset.data()[(1, 0)], 9.0);
        assert_eq!(subset.quality()[(1, 3)], 1);
    }

    #[test]
    fn test_subset_columns_lockstep() {
        let set = create_test_set();
        let subset = set.subset_columns(&[1, 3]).unwrap();

        assert_eq!(subset.n_observations(), 3);
        assert_eq!(subset.n_features(), 2);
        assert_eq!(subset.operations()[0].name, "op_1");
        assert_eq!(subset.data()[(0, 1)], 4.0);
        assert_eq!(subset.quality()[(2, 1)], 1);
    }

    #[test]
    fn test_subset_out_of_bounds() {
        let set = create_test_set();
        assert!(set.subset_rows(&[5]).is_err());
        assert!(set.subset_columns(&[9]).is_err());
    }

    #[test]
    fn test_timings_follow_subsets() {
        let timings = DMatrix::from_fn(3, 4, |i, j| (i * 4 + j) as f64);
        let set = create_test_set().with_timings(timings).unwrap();

        let subset = set.subset_rows(&[1]).unwrap().subset_columns(&[0, 2]).unwrap();
        let t = subset.timings().unwrap();
        assert_eq!(t.shape(), (1, 2));
        assert_eq!(t[(0, 0)], 4.0);
        assert_eq!(t[(0, 1)], 6.0);
    }

    #[test]
    fn test_replace_data_shape_checked() {
        let mut set = create_test_set();
        assert!(set.replace_data(DMatrix::zeros(2, 2)).is_err());
        assert!(set.replace_data(DMatrix::zeros(3, 4)).is_ok());
    }

    #[test]
    fn test_tsv_roundtrip() {
        let set = create_test_set();

        let temp_file = NamedTempFile::new().unwrap();
        set.to_tsv(temp_file.path()).unwrap();

        let loaded = FeatureSet::from_tsv_parts(temp_file.path(), None, None).unwrap();
        assert_eq!(loaded.n_observations(), 3);
        assert_eq!(loaded.n_features(), 4);
        assert_eq!(loaded.operations()[2].name, "op_2");
        assert_eq!(loaded.data()[(0, 0)], 1.0);
        assert!(loaded.data()[(1, 1)].is_nan());
    }

    #[test]
    fn test_group_labels_attached() {
        let set = create_test_set();
        let data_file = NamedTempFile::new().unwrap();
        set.to_tsv(data_file.path()).unwrap();

        let mut group_file = NamedTempFile::new().unwrap();
        writeln!(group_file, "name\tgroup").unwrap();
        writeln!(group_file, "ts_1\tnoisy").unwrap();
        writeln!(group_file, "ts_3\tperiodic").unwrap();
        group_file.flush().unwrap();

        let loaded =
            FeatureSet::from_tsv_parts(data_file.path(), None, Some(group_file.path())).unwrap();
        assert_eq!(loaded.time_series()[0].group.as_deref(), Some("noisy"));
        assert_eq!(loaded.time_series()[1].group, None);
        assert_eq!(loaded.time_series()[2].group.as_deref(), Some("periodic"));
    }
}
