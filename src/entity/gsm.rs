use std::fmt::Display;

use log::debug;

use super::source::{
    DataAvailability,
    SampleCard,
};
use crate::data_structs::{
    Accession,
    BetaTable,
    Characteristics,
    InfoAttributes,
};

/// Data state of a sample. The only transition is
/// `MetadataOnly -> Loaded`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GsmData {
    #[default]
    MetadataOnly,
    Loaded(BetaTable),
}

impl GsmData {
    pub fn is_loaded(&self) -> bool {
        matches!(self, GsmData::Loaded(_))
    }

    pub fn table(&self) -> Option<&BetaTable> {
        match self {
            GsmData::Loaded(table) => Some(table),
            GsmData::MetadataOnly => None,
        }
    }
}

/// A GEO sample: card metadata plus, once requested, its beta table.
#[derive(Debug, Clone, PartialEq)]
pub struct GsmEntity {
    accession:       Accession,
    gse:             Option<Accession>,
    platform:        Option<String>,
    availability:    DataAvailability,
    info:            InfoAttributes,
    characteristics: Characteristics,
    data:            GsmData,
}

impl GsmEntity {
    /// Metadata phase. Never touches channel files.
    pub fn from_card(card: SampleCard) -> Self {
        let characteristics = card
            .characteristics_text()
            .map(|text| Characteristics::parse(&text))
            .unwrap_or_default();
        let gse = card.series();
        let platform = card.platform().map(String::from);
        let availability = card.data_availability();
        let accession = card.accession().clone();
        debug!(
            "{}: {} characteristics, data on card: {:?}",
            accession,
            characteristics.len(),
            availability
        );

        Self {
            accession,
            gse,
            platform,
            availability,
            info: card.into_info(),
            characteristics,
            data: GsmData::MetadataOnly,
        }
    }

    pub fn accession(&self) -> &Accession {
        &self.accession
    }

    /// Parent series listed first on the card.
    pub fn gse(&self) -> Option<&Accession> {
        self.gse.as_ref()
    }

    /// Platform accession from the card, e.g. `GPL13534`.
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn availability(&self) -> DataAvailability {
        self.availability
    }

    pub fn info(&self) -> &InfoAttributes {
        &self.info
    }

    pub fn characteristics(&self) -> &Characteristics {
        &self.characteristics
    }

    pub fn data(&self) -> &GsmData {
        &self.data
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_loaded()
    }

    pub fn betas(&self) -> Option<&BetaTable> {
        self.data.table()
    }

    /// Data phase result. A table already attached is kept and `false` is
    /// returned.
    pub(crate) fn attach(
        &mut self,
        table: BetaTable,
    ) -> bool {
        if self.data.is_loaded() {
            return false;
        }
        self.data = GsmData::Loaded(table);
        true
    }
}

impl Display for GsmEntity {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {} attributes, {} characteristics, ",
            self.accession,
            self.platform.as_deref().unwrap_or("unknown platform"),
            self.info.len(),
            self.characteristics.len()
        )?;
        match &self.data {
            GsmData::MetadataOnly => write!(f, "metadata only"),
            GsmData::Loaded(table) => {
                write!(f, "{} probes ({})", table.len(), table.array_type())
            },
        }
    }
}
