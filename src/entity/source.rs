//! Boundary with the collaborators that fetch GEO cards and download files.
//!
//! Collaborators report failures as [`anyhow::Error`]; the session attaches
//! the accession and wraps them into [`Error::Source`](crate::Error::Source).

use hashbrown::HashMap;

use crate::data_structs::{
    Accession,
    AccessionKind,
    InfoAttributes,
};
use crate::error::Error;
use crate::io::idat::ChannelFiles;
use crate::io::soft::{
    parse_sample_soft,
    parse_series_soft,
};

/// Sample card attribute holding the characteristics lines.
pub const CHARACTERISTICS_KEY: &str = "characteristics_ch1";

/// What a sample card says about downloadable data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataAvailability {
    /// IDAT supplementary files are attached.
    Idat,
    /// Only a processed table is shown on the card.
    Table,
    /// Neither; loading data fails with [`Error::NoData`].
    None,
}

/// Metadata of one sample as delivered by a [`MetadataSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleCard {
    accession: Accession,
    info:      InfoAttributes,
}

impl SampleCard {
    pub fn new(
        accession: Accession,
        info: InfoAttributes,
    ) -> Self {
        Self { accession, info }
    }

    pub fn accession(&self) -> &Accession {
        &self.accession
    }

    pub fn info(&self) -> &InfoAttributes {
        &self.info
    }

    pub fn into_info(self) -> InfoAttributes {
        self.info
    }

    /// Characteristics lines joined with `\n`.
    pub fn characteristics_text(&self) -> Option<String> {
        self.info.get(CHARACTERISTICS_KEY)
    }

    /// First listed parent series.
    pub fn series(&self) -> Option<Accession> {
        self.info
            .values("series_id")
            .iter()
            .find_map(|value| Accession::series(value).ok())
    }

    /// Platform accession, e.g. `GPL13534`.
    pub fn platform(&self) -> Option<&str> {
        self.info.first("platform_id")
    }

    pub fn data_availability(&self) -> DataAvailability {
        let idat_files = self
            .info
            .values("supplementary_file")
            .iter()
            .filter(|file| file.to_lowercase().contains(".idat"))
            .count();
        let table_rows = self
            .info
            .first("data_row_count")
            .and_then(|rows| rows.parse::<usize>().ok())
            .unwrap_or(0);

        if idat_files >= 2 {
            DataAvailability::Idat
        }
        else if table_rows > 0 {
            DataAvailability::Table
        }
        else {
            DataAvailability::None
        }
    }
}

/// Metadata of one series and its member samples in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesCard {
    accession: Accession,
    info:      InfoAttributes,
    samples:   Vec<Accession>,
}

impl SeriesCard {
    pub fn new(
        accession: Accession,
        info: InfoAttributes,
        samples: Vec<Accession>,
    ) -> Self {
        Self {
            accession,
            info,
            samples,
        }
    }

    pub fn accession(&self) -> &Accession {
        &self.accession
    }

    pub fn info(&self) -> &InfoAttributes {
        &self.info
    }

    pub fn samples(&self) -> &[Accession] {
        &self.samples
    }

    pub fn into_parts(self) -> (Accession, InfoAttributes, Vec<Accession>) {
        (self.accession, self.info, self.samples)
    }
}

/// Delivers sample and series cards.
pub trait MetadataSource {
    fn sample_card(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<SampleCard>;

    fn series_card(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<SeriesCard>;

    /// Text holding the processed `ID_REF / VALUE` table of a sample whose
    /// card reports [`DataAvailability::Table`], e.g. the card's full SOFT
    /// text.
    fn sample_table(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<String> {
        anyhow::bail!("no processed table available for {}", accession)
    }
}

/// Delivers local paths of a sample's two channel files.
pub trait ChannelFileSource {
    fn channel_files(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<ChannelFiles>;
}

impl<T: MetadataSource + ?Sized> MetadataSource for &T {
    fn sample_card(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<SampleCard> {
        (**self).sample_card(accession)
    }

    fn series_card(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<SeriesCard> {
        (**self).series_card(accession)
    }

    fn sample_table(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<String> {
        (**self).sample_table(accession)
    }
}

impl<T: ChannelFileSource + ?Sized> ChannelFileSource for &T {
    fn channel_files(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<ChannelFiles> {
        (**self).channel_files(accession)
    }
}

impl ChannelFileSource for HashMap<Accession, ChannelFiles> {
    fn channel_files(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<ChannelFiles> {
        self.get(accession)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no channel files registered"))
    }
}

/// SOFT card texts already fetched by the caller.
///
/// A sample text that includes its `!sample_table_begin` block also serves
/// as that sample's processed table.
#[derive(Debug, Clone, Default)]
pub struct SoftTextSource {
    samples: HashMap<Accession, String>,
    series:  HashMap<Accession, String>,
}

impl SoftTextSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the card text of a sample or series accession.
    pub fn insert<S: Into<String>>(
        &mut self,
        accession: &str,
        text: S,
    ) -> Result<(), Error> {
        let accession = Accession::new(accession)?;
        match accession.kind() {
            AccessionKind::Sample => {
                self.samples.insert(accession, text.into());
            },
            AccessionKind::Series => {
                self.series.insert(accession, text.into());
            },
            AccessionKind::Platform => {
                return Err(Error::InvalidAccession(format!(
                    "{} is a platform, not a sample or series",
                    accession
                )))
            },
        }
        Ok(())
    }

    pub fn with_card<S: Into<String>>(
        mut self,
        accession: &str,
        text: S,
    ) -> Result<Self, Error> {
        self.insert(accession, text)?;
        Ok(self)
    }
}

impl MetadataSource for SoftTextSource {
    fn sample_card(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<SampleCard> {
        let text = self
            .samples
            .get(accession)
            .ok_or_else(|| anyhow::anyhow!("no SOFT text for {}", accession))?;
        Ok(parse_sample_soft(accession, text)?)
    }

    fn series_card(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<SeriesCard> {
        let text = self
            .series
            .get(accession)
            .ok_or_else(|| anyhow::anyhow!("no SOFT text for {}", accession))?;
        Ok(parse_series_soft(accession, text)?)
    }

    fn sample_table(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<String> {
        self.samples
            .get(accession)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no SOFT text for {}", accession))
    }
}
