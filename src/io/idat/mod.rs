//! Illumina IDAT (version 3) channel files.
//!
//! An IDAT file starts with the `IDAT` magic, a little-endian `i64` format
//! version and an `i32` field count, followed by a table of
//! `(u16 field code, i64 byte offset)` entries. Each field's payload lives at
//! its offset; fixed-width arrays extend up to the next field's offset.
//! Strings are length-prefixed with a 7-bit variable length integer.
//!
//! [`IdatReader`] decodes the fields listed in [`IdatField`] and ignores any
//! other code. [`decode_pair`] reads the two channel files of one sample into
//! a [`RawIntensityPair`](crate::data_structs::RawIntensityPair).
//! [`IdatWriter`] produces files the reader accepts.

use std::fmt::Display;

mod pair;
mod read;
mod write;


pub use pair::{
    decode_pair,
    ChannelFiles,
};
pub use read::{
    read_idat,
    IdatFile,
    IdatReader,
};
pub use write::IdatWriter;

pub const IDAT_MAGIC: &[u8; 4] = b"IDAT";
pub const IDAT_VERSION: i64 = 3;
/// Magic + version + field count.
pub const HEADER_LEN: usize = 4 + 8 + 4;
/// Code + offset.
pub const FIELD_ENTRY_LEN: usize = 2 + 8;

/// Field codes the decoder understands.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord)]
pub enum IdatField {
    /// `i32` number of addresses read.
    NumSnpsRead,
    /// `i32[n]` bead-type addresses.
    IlluminaId,
    /// `u16[n]` bead standard deviations.
    StdDev,
    /// `u16[n]` mean intensities.
    Mean,
    /// `u8[n]` bead counts.
    NumBeads,
    /// `i32` count followed by `i32[count]`.
    MidBlock,
    /// `i32` count followed by `count × 5` strings.
    RunInfo,
    /// `i32` scanner channel flag.
    RedGreen,
    MostlyNull,
    /// Sentrix barcode string.
    Barcode,
    /// Chip type string.
    ChipType,
    MostlyA,
}

impl IdatField {
    pub const ALL: [IdatField; 12] = [
        IdatField::NumSnpsRead,
        IdatField::IlluminaId,
        IdatField::StdDev,
        IdatField::Mean,
        IdatField::NumBeads,
        IdatField::MidBlock,
        IdatField::RunInfo,
        IdatField::RedGreen,
        IdatField::MostlyNull,
        IdatField::Barcode,
        IdatField::ChipType,
        IdatField::MostlyA,
    ];

    pub const fn code(&self) -> u16 {
        match self {
            IdatField::NumSnpsRead => 1000,
            IdatField::IlluminaId => 102,
            IdatField::StdDev => 103,
            IdatField::Mean => 104,
            IdatField::NumBeads => 107,
            IdatField::MidBlock => 200,
            IdatField::RunInfo => 300,
            IdatField::RedGreen => 400,
            IdatField::MostlyNull => 401,
            IdatField::Barcode => 402,
            IdatField::ChipType => 403,
            IdatField::MostlyA => 404,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    /// Byte width of one array element, for per-address array fields.
    pub const fn element_width(&self) -> Option<usize> {
        match self {
            IdatField::IlluminaId => Some(4),
            IdatField::StdDev | IdatField::Mean => Some(2),
            IdatField::NumBeads => Some(1),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            IdatField::NumSnpsRead => "nSNPsRead",
            IdatField::IlluminaId => "IlluminaID",
            IdatField::StdDev => "SD",
            IdatField::Mean => "Mean",
            IdatField::NumBeads => "NBeads",
            IdatField::MidBlock => "MidBlock",
            IdatField::RunInfo => "RunInfo",
            IdatField::RedGreen => "RedGreen",
            IdatField::MostlyNull => "MostlyNull",
            IdatField::Barcode => "Barcode",
            IdatField::ChipType => "ChipType",
            IdatField::MostlyA => "MostlyA",
        }
    }
}

impl Display for IdatField {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
