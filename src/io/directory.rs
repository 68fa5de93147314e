use std::fs;
use std::path::{
    Path,
    PathBuf,
};

use hashbrown::HashMap;
use log::{
    debug,
    warn,
};
use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::data_structs::{
    Accession,
    Channel,
};
use crate::entity::ChannelFileSource;
use crate::error::Error;
use crate::io::idat::ChannelFiles;

static IDAT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(GSM[0-9]+)_)?([0-9]+)_(R[0-9]{2}C[0-9]{2})_(Grn|Red)\.idat(?:\.gz)?$")
        .unwrap()
});

/// Parsed GEO IDAT file name:
/// `{GSM}_{SentrixID}_{SentrixPosition}_{Grn|Red}.idat[.gz]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdatFileName {
    pub sample:          Option<Accession>,
    pub sentrix_id:      String,
    pub sentrix_position: String,
    pub channel:         Channel,
}

impl IdatFileName {
    pub fn parse(name: &str) -> Option<Self> {
        let captures = IDAT_NAME_RE.captures(name)?;
        Some(Self {
            sample:           captures
                .get(1)
                .and_then(|m| Accession::sample(m.as_str()).ok()),
            sentrix_id:       captures[2].to_string(),
            sentrix_position: captures[3].to_string(),
            channel:          Channel::from_color_suffix(&captures[4])?,
        })
    }

    /// `{SentrixID}_{SentrixPosition}`, the physical array identifier.
    pub fn basename(&self) -> String {
        format!("{}_{}", self.sentrix_id, self.sentrix_position)
    }
}

#[derive(Debug, Default)]
struct PartialPair {
    methylated:   Option<PathBuf>,
    unmethylated: Option<PathBuf>,
}

/// Channel files of downloaded samples laid out in one directory.
///
/// Only files carrying the sample accession prefix are indexed; the
/// `Grn` file is the methylated channel and `Red` the unmethylated one.
#[derive(Debug, Clone)]
pub struct IdatDirectory {
    root:       PathBuf,
    array_type: String,
    pairs:      HashMap<Accession, (PathBuf, PathBuf)>,
}

impl IdatDirectory {
    /// Scans `root` (non-recursively). Incomplete pairs are skipped with a
    /// warning.
    pub fn scan<P: AsRef<Path>>(
        root: P,
        array_type: &str,
    ) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();
        let mut partial: HashMap<Accession, PartialPair> = HashMap::new();

        for entry in fs::read_dir(&root).map_err(|e| Error::io(&root, e))? {
            let path = entry.map_err(|e| Error::io(&root, e))?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(parsed) = IdatFileName::parse(name) else {
                debug!("Ignoring non-IDAT file {}", path.display());
                continue;
            };
            let Some(sample) = parsed.sample else {
                debug!("Ignoring IDAT without sample accession {}", path.display());
                continue;
            };
            let slot = partial.entry(sample).or_default();
            match parsed.channel {
                Channel::Methylated => slot.methylated = Some(path),
                Channel::Unmethylated => slot.unmethylated = Some(path),
            }
        }

        let mut pairs = HashMap::with_capacity(partial.len());
        for (sample, pair) in partial {
            match pair {
                PartialPair {
                    methylated: Some(meth),
                    unmethylated: Some(unmeth),
                } => {
                    pairs.insert(sample, (meth, unmeth));
                },
                _ => warn!("{}: incomplete channel pair in {}", sample, root.display()),
            }
        }
        debug!("Indexed {} sample pairs in {}", pairs.len(), root.display());

        Ok(Self {
            root,
            array_type: array_type.to_string(),
            pairs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(
        &self,
        accession: &Accession,
    ) -> Option<ChannelFiles> {
        self.pairs.get(accession).map(|(meth, unmeth)| {
            ChannelFiles::new(meth.clone(), unmeth.clone(), self.array_type.clone())
        })
    }

    /// Every indexed pair, sorted by accession.
    pub fn all(&self) -> Vec<(Accession, ChannelFiles)> {
        let mut out: Vec<_> = self
            .pairs
            .keys()
            .filter_map(|acc| self.get(acc).map(|files| (acc.clone(), files)))
            .collect();
        out.sort_by(|(a, _), (b, _)| a.cmp(b));
        out
    }
}

impl ChannelFileSource for IdatDirectory {
    fn channel_files(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<ChannelFiles> {
        self.get(accession).ok_or_else(|| {
            anyhow::anyhow!(
                "no channel pair for {} in {}",
                accession,
                self.root.display()
            )
        })
    }
}
