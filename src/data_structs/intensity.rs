use std::path::PathBuf;

use hashbrown::HashMap;

use super::enums::Channel;
use super::typedef::{
    AddressType,
    BeadCountType,
    DeviationType,
    IntensityType,
};
use crate::error::FormatError;

/// One scanner run entry of the IDAT `RunInfo` block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunInfo {
    pub run_time:     String,
    pub block_type:   String,
    pub block_pars:   String,
    pub block_code:   String,
    pub code_version: String,
}

/// File-level metadata of one decoded IDAT file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdatMetadata {
    pub version:     i64,
    pub probe_count: usize,
    /// Chip type string as written by the scanner (e.g. `BeadChip 12x1`).
    pub array_type:  Option<String>,
    /// Sentrix barcode, identifying the physical chip the sample ran on.
    pub sample_id:   Option<String>,
    pub red_green:   Option<i32>,
    pub run_info:    Vec<RunInfo>,
}

/// Ordered `(address, intensity)` records of one channel.
///
/// `deviations` and `bead_counts` are either empty (not present in the file)
/// or as long as `addresses`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelReads {
    pub addresses:   Vec<AddressType>,
    pub means:       Vec<IntensityType>,
    pub deviations:  Vec<DeviationType>,
    pub bead_counts: Vec<BeadCountType>,
}

impl ChannelReads {
    pub fn new(
        addresses: Vec<AddressType>,
        means: Vec<IntensityType>,
    ) -> Self {
        Self {
            addresses,
            means,
            deviations: Vec::new(),
            bead_counts: Vec::new(),
        }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (AddressType, IntensityType)>, {
        let (addresses, means) = pairs.into_iter().unzip();
        Self::new(addresses, means)
    }

    pub fn with_deviations(
        mut self,
        deviations: Vec<DeviationType>,
    ) -> Self {
        self.deviations = deviations;
        self
    }

    pub fn with_bead_counts(
        mut self,
        bead_counts: Vec<BeadCountType>,
    ) -> Self {
        self.bead_counts = bead_counts;
        self
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AddressType, IntensityType)> + '_ {
        self.addresses.iter().copied().zip(self.means.iter().copied())
    }

    /// Address → intensity lookup.
    pub fn index(&self) -> HashMap<AddressType, IntensityType> {
        self.iter().collect()
    }
}

/// Both channels of one physical array run.
///
/// Constructed through [`RawIntensityPair::try_new`], which enforces that the
/// two channels reference the same address set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIntensityPair {
    methylated:   ChannelReads,
    unmethylated: ChannelReads,
    metadata:     IdatMetadata,
}

impl RawIntensityPair {
    /// `source` names the file pair in errors.
    pub fn try_new(
        methylated: ChannelReads,
        unmethylated: ChannelReads,
        metadata: IdatMetadata,
        source: impl Into<PathBuf>,
    ) -> Result<Self, FormatError> {
        let source = source.into();
        let meth_index = methylated.index();
        let unmeth_index = unmethylated.index();

        if meth_index.len() != methylated.len() {
            return Err(FormatError::new(
                source,
                "IlluminaID",
                "unique addresses in methylated channel",
                format!("{} duplicated", methylated.len() - meth_index.len()),
            ));
        }
        if unmeth_index.len() != unmethylated.len() {
            return Err(FormatError::new(
                source,
                "IlluminaID",
                "unique addresses in unmethylated channel",
                format!("{} duplicated", unmethylated.len() - unmeth_index.len()),
            ));
        }

        let only_meth = meth_index
            .keys()
            .filter(|a| !unmeth_index.contains_key(*a))
            .count();
        let only_unmeth = unmeth_index
            .keys()
            .filter(|a| !meth_index.contains_key(*a))
            .count();
        if only_meth + only_unmeth > 0 {
            return Err(FormatError::new(
                source,
                "IlluminaID",
                "identical address sets in both channels",
                format!(
                    "{} addresses only in methylated, {} only in unmethylated",
                    only_meth, only_unmeth
                ),
            ));
        }

        Ok(Self {
            methylated,
            unmethylated,
            metadata,
        })
    }

    pub fn channel(
        &self,
        channel: Channel,
    ) -> &ChannelReads {
        match channel {
            Channel::Methylated => &self.methylated,
            Channel::Unmethylated => &self.unmethylated,
        }
    }

    pub fn methylated(&self) -> &ChannelReads {
        &self.methylated
    }

    pub fn unmethylated(&self) -> &ChannelReads {
        &self.unmethylated
    }

    pub fn metadata(&self) -> &IdatMetadata {
        &self.metadata
    }

    /// Number of addresses read (equal in both channels).
    pub fn probe_count(&self) -> usize {
        self.methylated.len()
    }

    pub fn into_parts(self) -> (ChannelReads, ChannelReads, IdatMetadata) {
        (self.methylated, self.unmethylated, self.metadata)
    }
}
