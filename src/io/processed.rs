//! Already computed beta values published on GEO.
//!
//! Samples without IDAT files often carry a processed table on their card,
//! an `ID_REF / VALUE` block between `!sample_table_begin` and
//! `!sample_table_end`. Series may instead publish one matrix for all their
//! samples as a supplementary CSV: a probe column, then one column per
//! sample labelled by accession or by sample title.

use std::io::Cursor;
use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use log::{
    debug,
    info,
};
use polars::io::mmap::MmapBytesReader;
use polars::prelude::*;

use crate::data_structs::typedef::{
    BetaType,
    ProbeId,
};
use crate::data_structs::BetaTable;
use crate::error::Error;
use crate::io::compression::read_file_bytes;

pub const TABLE_BEGIN: &str = "!sample_table_begin";
pub const TABLE_END: &str = "!sample_table_end";
pub const ID_COLUMN: &str = "ID_REF";
pub const VALUE_COLUMN: &str = "VALUE";

/// Cell spellings read as a missing value.
const MISSING_VALUES: &[&str] = &["", "null", "na", "nan"];

fn parse_value(
    raw: Option<&str>,
    at: impl FnOnce() -> String,
) -> Result<Option<BetaType>, Error> {
    let Some(raw) = raw.map(str::trim)
    else {
        return Ok(None);
    };
    if MISSING_VALUES.iter().any(|m| raw.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }
    raw.parse::<BetaType>()
        .map(Some)
        .map_err(|_| Error::Table(format!("{}: invalid value '{}'", at(), raw)))
}

/// `(probe, value)` rows of a sample's processed table, in table order.
///
/// Rows start after the tab separated header naming `ID_REF` and `VALUE`
/// and stop at `!sample_table_end`. Other columns are ignored.
pub fn parse_sample_table(text: &str) -> Result<Vec<(ProbeId, Option<BetaType>)>, Error> {
    let mut lines = text.lines().map(|line| line.trim_end_matches('\r')).enumerate();

    let value_idx = lines
        .find_map(|(_, line)| {
            let header = line.split('\t').map(str::trim).collect_vec();
            match header.first() {
                Some(&ID_COLUMN) => header.iter().position(|col| *col == VALUE_COLUMN),
                _ => None,
            }
        })
        .ok_or_else(|| {
            Error::Table(format!("no '{}\\t{}' header line", ID_COLUMN, VALUE_COLUMN))
        })?;

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        if line.trim().eq_ignore_ascii_case(TABLE_END) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let fields = line.split('\t').collect_vec();
        let probe = fields[0].trim();
        if probe.is_empty() {
            debug!("Skipping processed row {} without probe id", line_no + 1);
            continue;
        }
        let value = parse_value(fields.get(value_idx).copied(), || {
            format!("line {}", line_no + 1)
        })?;
        rows.push((ProbeId::from(probe), value));
    }
    Ok(rows)
}

/// Series-wide matrix of processed beta values.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesMatrix {
    probes:  Vec<ProbeId>,
    columns: IndexMap<String, Vec<Option<BetaType>>>,
}

impl SeriesMatrix {
    /// Fails when a column length differs from the probe count.
    pub fn try_new(
        probes: Vec<ProbeId>,
        columns: IndexMap<String, Vec<Option<BetaType>>>,
    ) -> Result<Self, Error> {
        if let Some((label, values)) = columns.iter().find(|(_, v)| v.len() != probes.len()) {
            return Err(Error::Table(format!(
                "column '{}' has {} values for {} probes",
                label,
                values.len(),
                probes.len()
            )));
        }
        Ok(Self { probes, columns })
    }

    pub fn probes(&self) -> &[ProbeId] {
        &self.probes
    }

    /// Sample column labels in file order.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(
        &self,
        label: &str,
    ) -> Option<&[Option<BetaType>]> {
        self.columns.get(label).map(Vec::as_slice)
    }

    /// First column labelled with any of `labels`.
    pub fn find_column<'a, I>(
        &self,
        labels: I,
    ) -> Option<&str>
    where
        I: IntoIterator<Item = &'a str>, {
        labels
            .into_iter()
            .find_map(|label| self.columns.get_key_value(label.trim()))
            .map(|(label, _)| label.as_str())
    }

    /// Beta table of one column. Missing or out of range values are dropped.
    pub fn table(
        &self,
        label: &str,
        array_type: &str,
    ) -> Option<BetaTable> {
        let values = self.columns.get(label)?;
        Some(BetaTable::from_values(
            array_type.to_string(),
            self.probes.iter().cloned().zip(values.iter().copied()),
        ))
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

fn read_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
}

/// Reads a series matrix CSV from an in-memory or file handle.
///
/// The first column holds probe ids whatever its header; every other column
/// is one sample.
pub fn read_series_matrix<R: MmapBytesReader>(handle: R) -> Result<SeriesMatrix, Error> {
    let frame = read_options().into_reader_with_file_handle(handle).finish()?;
    matrix_from_frame(&frame)
}

/// Reads a possibly gzipped series matrix CSV from disk.
pub fn load_series_matrix<P: AsRef<Path>>(path: P) -> Result<SeriesMatrix, Error> {
    let path = path.as_ref();
    let bytes = read_file_bytes(path)?;
    let matrix = read_series_matrix(Cursor::new(bytes))?;
    info!(
        "Read series matrix of {} probes x {} samples from {}",
        matrix.len(),
        matrix.width(),
        path.display()
    );
    Ok(matrix)
}

fn matrix_from_frame(frame: &DataFrame) -> Result<SeriesMatrix, Error> {
    let [probe_col, sample_cols @ ..] = frame.get_columns()
    else {
        return Err(Error::Table("empty series matrix".to_string()));
    };
    if sample_cols.is_empty() {
        return Err(Error::Table(format!(
            "series matrix has no sample column besides '{}'",
            probe_col.name()
        )));
    }

    let probe_ids = probe_col.as_materialized_series().str()?;
    let mut keep = Vec::with_capacity(frame.height());
    let mut probes = Vec::with_capacity(frame.height());
    for (row, probe) in probe_ids.into_iter().enumerate() {
        if let Some(probe) = probe.map(str::trim).filter(|p| !p.is_empty()) {
            keep.push(row);
            probes.push(ProbeId::from(probe));
        }
    }

    let mut columns = IndexMap::with_capacity(sample_cols.len());
    for col in sample_cols {
        let values = col.as_materialized_series().str()?;
        let parsed = keep
            .iter()
            .map(|row| {
                parse_value(values.get(*row), || format!("column '{}', row {}", col.name(), row + 1))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        columns.insert(col.name().to_string(), parsed);
    }
    SeriesMatrix::try_new(probes, columns)
}
