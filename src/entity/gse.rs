use std::fmt::Display;

use indexmap::{
    IndexMap,
    IndexSet,
};
use log::debug;
use polars::prelude::*;

use super::cache::Shared;
use super::gsm::GsmEntity;
use crate::data_structs::typedef::BetaType;
use crate::data_structs::{
    Accession,
    InfoAttributes,
    Section,
};
use crate::error::Error;
use crate::utils::frame_from_columns;

/// A GEO series: its card metadata and handles to its samples.
///
/// Sample handles come from the session's sample cache, so a sample listed
/// in several series is the same object in each of them.
#[derive(Debug)]
pub struct GseEntity {
    accession: Accession,
    info:      InfoAttributes,
    samples:   IndexMap<Accession, Shared<GsmEntity>>,
    no_data:   Vec<Accession>,
}

impl GseEntity {
    pub fn new(
        accession: Accession,
        info: InfoAttributes,
        samples: IndexMap<Accession, Shared<GsmEntity>>,
    ) -> Self {
        Self {
            accession,
            info,
            samples,
            no_data: Vec::new(),
        }
    }

    pub fn accession(&self) -> &Accession {
        &self.accession
    }

    pub fn info(&self) -> &InfoAttributes {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn contains(
        &self,
        sample: &Accession,
    ) -> bool {
        self.samples.contains_key(sample)
    }

    /// Handle of a member sample.
    pub fn get(
        &self,
        sample: &Accession,
    ) -> Result<Shared<GsmEntity>, Error> {
        self.samples.get(sample).cloned().ok_or_else(|| {
            Error::UnknownSample {
                series: self.accession.clone(),
                sample: sample.clone(),
            }
        })
    }

    /// Member samples in document order.
    pub fn samples(&self) -> impl Iterator<Item = (&Accession, &Shared<GsmEntity>)> + '_ {
        self.samples.iter()
    }

    pub fn accessions(&self) -> impl Iterator<Item = &Accession> + '_ {
        self.samples.keys()
    }

    /// Samples whose data phase failed during the last series-wide load.
    pub fn no_data(&self) -> &[Accession] {
        &self.no_data
    }

    pub(crate) fn set_no_data(
        &mut self,
        no_data: Vec<Accession>,
    ) {
        self.no_data = no_data;
    }

    /// Tabular view of the series.
    ///
    /// - [`Section::Info`]: a `key` column, then one string column per sample
    ///   with that sample's attribute values (null where absent).
    /// - [`Section::Data`]: a `probe` column, then one `f64` beta column per
    ///   loaded sample. Probes appear in first-seen order. Samples without
    ///   data are left out.
    pub fn to_frame(
        &self,
        section: Section,
    ) -> Result<DataFrame, Error> {
        match section {
            Section::Info => self.info_frame(),
            Section::Data => self.data_frame(),
        }
    }

    fn info_frame(&self) -> Result<DataFrame, Error> {
        let mut keys: IndexSet<String> = IndexSet::new();
        for (_, handle) in &self.samples {
            keys.extend(handle.borrow().info().keys().map(String::from));
        }

        let mut columns = Vec::with_capacity(self.samples.len() + 1);
        columns.push(Column::new(
            "key".into(),
            keys.iter().map(String::as_str).collect::<Vec<_>>(),
        ));
        for (accession, handle) in &self.samples {
            let gsm = handle.borrow();
            let values: Vec<Option<String>> =
                keys.iter().map(|key| gsm.info().get(key)).collect();
            columns.push(Column::new(accession.as_str().into(), values));
        }
        Ok(frame_from_columns(columns)?)
    }

    fn data_frame(&self) -> Result<DataFrame, Error> {
        let mut probes: IndexSet<String> = IndexSet::new();
        let mut loaded = Vec::new();
        for (accession, handle) in &self.samples {
            let gsm = handle.borrow();
            match gsm.betas() {
                Some(table) => {
                    probes.extend(table.iter().map(|(probe, _)| probe.to_string()));
                    loaded.push((accession, handle));
                },
                None => debug!("{}: {} has no data, not in frame", self.accession, accession),
            }
        }

        let mut columns = Vec::with_capacity(loaded.len() + 1);
        columns.push(Column::new(
            "probe".into(),
            probes.iter().map(String::as_str).collect::<Vec<_>>(),
        ));
        for (accession, handle) in loaded {
            let gsm = handle.borrow();
            let betas: Vec<Option<BetaType>> = match gsm.betas() {
                Some(table) => probes.iter().map(|probe| table.beta(probe)).collect(),
                None => vec![None; probes.len()],
            };
            columns.push(Column::new(accession.as_str().into(), betas));
        }
        Ok(frame_from_columns(columns)?)
    }
}

impl Display for GseEntity {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let loaded = self
            .samples
            .values()
            .filter(|handle| handle.borrow().is_loaded())
            .count();
        write!(
            f,
            "{} {} attributes, {} samples ({} with data, {} without)",
            self.accession,
            self.info.len(),
            self.samples.len(),
            loaded,
            self.no_data.len()
        )
    }
}
