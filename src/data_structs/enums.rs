use std::fmt::Display;
use std::str::FromStr;

/// One of the two scans of an array run, named after the signal an
/// Infinium II probe reads in it.
///
/// Infinium I probes read both of their addresses in a single scan; see
/// [`ProbeDesign`](crate::data_structs::ProbeDesign).
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord)]
pub enum Channel {
    /// Green scan, methylated signal of Infinium II probes.
    Methylated,
    /// Red scan, unmethylated signal of Infinium II probes.
    Unmethylated,
}

impl Channel {
    /// Scanner color the channel is read from in GEO's IDAT naming
    /// (`_Grn.idat` / `_Red.idat`).
    pub const fn color_suffix(&self) -> &'static str {
        match self {
            Channel::Methylated => "Grn",
            Channel::Unmethylated => "Red",
        }
    }

    pub fn from_color_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_lowercase().as_str() {
            "grn" | "green" => Some(Channel::Methylated),
            "red" => Some(Channel::Unmethylated),
            _ => None,
        }
    }
}

impl Display for Channel {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Channel::Methylated => write!(f, "methylated"),
            Channel::Unmethylated => write!(f, "unmethylated"),
        }
    }
}

/// Part of a series exported by
/// [`GseEntity::to_frame`](crate::entity::GseEntity::to_frame).
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug)]
pub enum Section {
    /// Info attributes of every sample.
    Info,
    /// Beta values of every loaded sample.
    Data,
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Section::Info),
            "data" => Ok(Section::Data),
            other => Err(format!("unknown section '{}', use info / data", other)),
        }
    }
}

impl Display for Section {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Section::Info => write!(f, "info"),
            Section::Data => write!(f, "data"),
        }
    }
}
