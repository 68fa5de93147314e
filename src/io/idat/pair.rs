use std::path::{
    Path,
    PathBuf,
};

use log::info;

use super::read::read_idat;
use crate::data_structs::{
    Channel,
    RawIntensityPair,
};
use crate::error::{
    Error,
    FormatError,
};

/// Local channel files of one sample, as handed over by a
/// [`ChannelFileSource`](crate::entity::ChannelFileSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFiles {
    pub methylated:   PathBuf,
    pub unmethylated: PathBuf,
    /// Declared array type or platform accession (`450k`, `GPL13534`, …).
    pub array_type:   String,
}

impl ChannelFiles {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(
        methylated: P,
        unmethylated: P,
        array_type: S,
    ) -> Self {
        Self {
            methylated:   methylated.into(),
            unmethylated: unmethylated.into(),
            array_type:   array_type.into(),
        }
    }

    pub fn path(
        &self,
        channel: Channel,
    ) -> &Path {
        match channel {
            Channel::Methylated => &self.methylated,
            Channel::Unmethylated => &self.unmethylated,
        }
    }

    pub fn decode(&self) -> Result<RawIntensityPair, Error> {
        decode_pair(&self.methylated, &self.unmethylated)
    }
}

/// Decodes the two channel files of one array run.
///
/// Both files must carry the same address set and, when present, the same
/// barcode and chip type.
pub fn decode_pair<P: AsRef<Path>>(
    methylated: P,
    unmethylated: P,
) -> Result<RawIntensityPair, Error> {
    let (meth_path, unmeth_path) = (methylated.as_ref(), unmethylated.as_ref());
    let meth = read_idat(meth_path)?;
    let unmeth = read_idat(unmeth_path)?;

    let agree = |field: &str,
                 left: &Option<String>,
                 right: &Option<String>|
     -> Result<(), FormatError> {
        match (left, right) {
            (Some(l), Some(r)) if l != r => {
                Err(FormatError::new(
                    unmeth_path,
                    field,
                    format!("'{}' (as in {})", l, meth_path.display()),
                    format!("'{}'", r),
                ))
            },
            _ => Ok(()),
        }
    };
    agree("Barcode", &meth.metadata.sample_id, &unmeth.metadata.sample_id)?;
    agree("ChipType", &meth.metadata.array_type, &unmeth.metadata.array_type)?;

    let mut metadata = meth.metadata;
    metadata.sample_id = metadata.sample_id.or(unmeth.metadata.sample_id);
    metadata.array_type = metadata.array_type.or(unmeth.metadata.array_type);

    let pair = RawIntensityPair::try_new(meth.reads, unmeth.reads, metadata, unmeth_path)?;
    info!(
        "Decoded channel pair {} / {} ({} probes)",
        meth_path.display(),
        unmeth_path.display(),
        pair.probe_count()
    );
    Ok(pair)
}
