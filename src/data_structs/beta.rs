use indexmap::map::Entry;
use indexmap::IndexMap;
use log::warn;
use polars::prelude::*;

use super::typedef::{
    BetaType,
    IntensityType,
    ProbeId,
};
use crate::utils::frame_from_columns;

/// Beta value of one probe with the intensities it was computed from.
///
/// Intensities are `None` for values taken from a processed table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaRecord {
    pub beta:         BetaType,
    pub methylated:   Option<IntensityType>,
    pub unmethylated: Option<IntensityType>,
}

/// Probe → beta value table of one sample, in manifest order, or in table
/// order for processed values.
#[derive(Debug, Clone, PartialEq)]
pub struct BetaTable {
    array_type:         String,
    records:            IndexMap<ProbeId, BetaRecord>,
    /// Probes left out for a missing address or an invalid processed value.
    dropped_probes:     usize,
    /// Raw addresses that no manifest probe references.
    unmapped_addresses: usize,
}

impl BetaTable {
    pub fn from_parts(
        array_type: String,
        records: IndexMap<ProbeId, BetaRecord>,
        dropped_probes: usize,
        unmapped_addresses: usize,
    ) -> Self {
        Self {
            array_type,
            records,
            dropped_probes,
            unmapped_addresses,
        }
    }

    /// Table of already computed beta values, e.g. a sample's processed
    /// `ID_REF / VALUE` table or one column of a series matrix.
    ///
    /// Missing values, values outside `[0, 1]` and repeated probe ids are
    /// left out and counted in [`BetaTable::dropped_probes`].
    pub fn from_values<I, P>(
        array_type: String,
        values: I,
    ) -> Self
    where
        I: IntoIterator<Item = (P, Option<BetaType>)>,
        P: Into<ProbeId>, {
        let mut records = IndexMap::new();
        let mut dropped = 0usize;
        for (probe, value) in values {
            let Some(beta) = value.filter(|b| (0.0..=1.0).contains(b))
            else {
                dropped += 1;
                continue;
            };
            match records.entry(probe.into()) {
                Entry::Vacant(entry) => {
                    entry.insert(BetaRecord {
                        beta,
                        methylated: None,
                        unmethylated: None,
                    });
                },
                Entry::Occupied(_) => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(
                "{}: {} processed values missing, out of range or repeated",
                array_type, dropped
            );
        }
        Self::from_parts(array_type, records, dropped, 0)
    }

    pub fn array_type(&self) -> &str {
        &self.array_type
    }

    pub fn dropped_probes(&self) -> usize {
        self.dropped_probes
    }

    pub fn unmapped_addresses(&self) -> usize {
        self.unmapped_addresses
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(
        &self,
        probe_id: &str,
    ) -> Option<&BetaRecord> {
        self.records.get(probe_id)
    }

    pub fn beta(
        &self,
        probe_id: &str,
    ) -> Option<BetaType> {
        self.get(probe_id).map(|r| r.beta)
    }

    pub fn contains(
        &self,
        probe_id: &str,
    ) -> bool {
        self.records.contains_key(probe_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProbeId, &BetaRecord)> + '_ {
        self.records.iter()
    }

    /// Ordered `(probe, beta)` pairs.
    pub fn betas(&self) -> impl Iterator<Item = (&str, BetaType)> + '_ {
        self.records.iter().map(|(p, r)| (p.as_str(), r.beta))
    }

    /// Columns: `probe`, `beta`, `methylated`, `unmethylated`.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let probes: Vec<&str> = self.records.keys().map(ProbeId::as_str).collect();
        let betas: Vec<BetaType> = self.records.values().map(|r| r.beta).collect();
        let meth: Vec<Option<u32>> = self
            .records
            .values()
            .map(|r| r.methylated.map(u32::from))
            .collect();
        let unmeth: Vec<Option<u32>> = self
            .records
            .values()
            .map(|r| r.unmethylated.map(u32::from))
            .collect();

        frame_from_columns(vec![
            Column::new("probe".into(), probes),
            Column::new("beta".into(), betas),
            Column::new("methylated".into(), meth),
            Column::new("unmethylated".into(), unmeth),
        ])
    }
}
