use std::path::Path;

use itertools::Itertools;
use log::{
    info,
    warn,
};
use polars::io::mmap::MmapBytesReader;
use polars::prelude::*;

use crate::data_structs::typedef::AddressType;
use crate::data_structs::{
    ArrayManifest,
    Channel,
    ManifestProbe,
    ProbeDesign,
};
use crate::error::Error;

/// Accepted probe identifier column names.
pub const PROBE_ID_COLS: &[&str] = &["probe_id", "IlmnID", "Name"];
/// Column layouts: `(methylated, unmethylated, design columns required)`.
///
/// Illumina's own manifests list the unmethylated bead as `AddressA_ID` and
/// the methylated one as `AddressB_ID`. Infinium II probes leave
/// `AddressB_ID` empty and read `AddressA_ID` in both scans. Which scan a
/// row is read in depends on its design, so that layout needs
/// [`DESIGN_TYPE_COLS`] (and [`COLOR_CHANNEL_COLS`] for Infinium I rows).
pub const ADDRESS_COL_LAYOUTS: &[(&str, &str, bool)] = &[
    ("methylated_address", "unmethylated_address", false),
    ("AddressB_ID", "AddressA_ID", true),
];
/// Infinium design type (`I` or `II`) column names.
pub const DESIGN_TYPE_COLS: &[&str] = &["Infinium_Design_Type", "design_type"];
/// Scan color (`Red` or `Grn`) of Infinium I probes.
pub const COLOR_CHANNEL_COLS: &[&str] = &["Color_Channel", "color_channel"];

fn read_options() -> CsvReadOptions {
    // Every column as string; addresses are parsed with row-level errors.
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
}

/// Loads a manifest CSV from disk.
pub fn load_manifest_csv<P: AsRef<Path>>(
    array_type: &str,
    path: P,
) -> Result<ArrayManifest, Error> {
    let path = path.as_ref();
    let frame = read_options()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    info!("Read manifest '{}' from {}", array_type, path.display());
    manifest_from_frame(array_type, &frame)
}

/// Loads a manifest CSV from an in-memory or file handle.
pub fn read_manifest_csv<R: MmapBytesReader>(
    array_type: &str,
    handle: R,
) -> Result<ArrayManifest, Error> {
    let frame = read_options().into_reader_with_file_handle(handle).finish()?;
    manifest_from_frame(array_type, &frame)
}

fn string_column<'a>(
    frame: &'a DataFrame,
    candidates: &[&str],
) -> Option<&'a StringChunked> {
    candidates
        .iter()
        .find_map(|name| frame.column(name).ok())
        .and_then(|col| col.as_materialized_series().str().ok())
}

/// Trimmed, non-empty value of `col` at `row`.
fn cell(
    col: Option<&StringChunked>,
    row: usize,
) -> Option<&str> {
    col.and_then(|c| c.get(row))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Builds a manifest from a frame with one of the supported column layouts.
pub fn manifest_from_frame(
    array_type: &str,
    frame: &DataFrame,
) -> Result<ArrayManifest, Error> {
    let invalid = |reason: String| {
        Error::Manifest {
            array_type: array_type.to_string(),
            reason,
        }
    };

    let probe_ids = string_column(frame, PROBE_ID_COLS).ok_or_else(|| {
        invalid(format!(
            "no probe id column (one of {}) in [{}]",
            PROBE_ID_COLS.join(", "),
            frame.get_column_names().iter().join(", ")
        ))
    })?;
    let (meth_col, unmeth_col, design_required) = ADDRESS_COL_LAYOUTS
        .iter()
        .find_map(|(meth, unmeth, required)| {
            let meth = string_column(frame, &[*meth]);
            let unmeth = string_column(frame, &[*unmeth]);
            match (meth, unmeth) {
                (None, None) => None,
                (meth, unmeth) => Some((meth, unmeth, *required)),
            }
        })
        .ok_or_else(|| invalid("no address columns".to_string()))?;
    let design_col = string_column(frame, DESIGN_TYPE_COLS);
    let color_col = string_column(frame, COLOR_CHANNEL_COLS);
    if design_required && design_col.is_none() {
        return Err(invalid(format!(
            "AddressA_ID/AddressB_ID layout needs a design type column (one of {})",
            DESIGN_TYPE_COLS.join(", ")
        )));
    }

    let parse = |row: usize, value: Option<&str>| -> Result<Option<AddressType>, Error> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(v) => {
                v.parse::<AddressType>()
                    .map(Some)
                    .map_err(|_| invalid(format!("row {}: invalid address '{}'", row, v)))
            },
        }
    };

    let design_of = |row: usize| -> Result<ProbeDesign, Error> {
        match cell(design_col, row) {
            None if design_required => {
                Err(invalid(format!("row {}: missing design type", row)))
            },
            None => Ok(ProbeDesign::TwoChannel),
            Some("II") | Some("2") => Ok(ProbeDesign::TwoChannel),
            Some("I") | Some("1") => {
                cell(color_col, row)
                    .and_then(Channel::from_color_suffix)
                    .map(ProbeDesign::SingleChannel)
                    .ok_or_else(|| {
                        invalid(format!(
                            "row {}: Infinium I probe without Red/Grn color channel",
                            row
                        ))
                    })
            },
            Some(other) => Err(invalid(format!("row {}: unknown design type '{}'", row, other))),
        }
    };

    let mut probes = Vec::with_capacity(frame.height());
    let mut skipped = 0usize;
    for row in 0..frame.height() {
        let Some(probe_id) = probe_ids.get(row).map(str::trim).filter(|p| !p.is_empty())
        else {
            skipped += 1;
            continue;
        };
        let meth = parse(row, meth_col.and_then(|c| c.get(row)))?;
        let unmeth = parse(row, unmeth_col.and_then(|c| c.get(row)))?;
        let design = design_of(row)?;
        let (meth, unmeth) = match (meth, unmeth, design) {
            (Some(m), Some(u), _) => (m, u),
            (Some(single), None, ProbeDesign::TwoChannel)
            | (None, Some(single), ProbeDesign::TwoChannel) => (single, single),
            (None, None, _) => {
                return Err(invalid(format!(
                    "row {}: probe '{}' has no address",
                    row, probe_id
                )))
            },
            _ => {
                return Err(invalid(format!(
                    "row {}: Infinium I probe '{}' needs both addresses",
                    row, probe_id
                )))
            },
        };
        probes.push(ManifestProbe::new(probe_id, meth, unmeth).with_design(design));
    }
    if skipped > 0 {
        warn!(
            "Manifest '{}': skipped {} rows without probe id",
            array_type, skipped
        );
    }

    ArrayManifest::try_new(array_type, probes)
}
