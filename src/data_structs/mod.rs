//! Core data types shared by the decoder, the beta computation and the
//! entity layer.
//!
//! - [`Accession`]: validated GEO identifiers (`GSM…`, `GSE…`, `GPL…`).
//! - [`ArrayManifest`] and [`ManifestRegistry`]: per-array-type probe ↔
//!   address tables, loaded once and shared read-only.
//! - [`RawIntensityPair`]: both decoded channels of one array run.
//! - [`BetaTable`]: probe → beta value table of one sample.
//! - [`InfoAttributes`] and [`Characteristics`]: ordered card metadata.
//! - [`typedef`]: aliases for addresses, intensities and beta values.

mod accession;
mod attributes;
mod beta;
mod characteristics;
mod enums;
mod intensity;
mod manifest;
pub mod typedef;


pub use accession::{
    find_accessions,
    Accession,
    AccessionKind,
};
pub use attributes::InfoAttributes;
pub use beta::{
    BetaRecord,
    BetaTable,
};
pub use characteristics::{
    Characteristics,
    CHARACTERISTICS_RAW_KEY,
};
pub use enums::{
    Channel,
    Section,
};
pub use intensity::{
    ChannelReads,
    IdatMetadata,
    RawIntensityPair,
    RunInfo,
};
pub use manifest::{
    normalize_array_type,
    ArrayManifest,
    ManifestProbe,
    ManifestRegistry,
    ProbeDesign,
    DEFAULT_PLATFORM_ALIASES,
};
