//! # methgeo
//!
//! `methgeo` turns Illumina methylation array runs published on GEO into
//! probe → beta value tables. It decodes IDAT channel files, maps raw bead
//! addresses to probes through array manifests, and keeps sample (GSM) and
//! series (GSE) records in a session cache so that no card is fetched and no
//! file is decoded twice.
//!
//! Fetching cards and downloading files is left to the caller: implement
//! [`MetadataSource`] and [`ChannelFileSource`], or use the provided
//! [`SoftTextSource`] and [`IdatDirectory`].
//!
//! Number of threads used by [`decode_and_compute_batch`] can be configured
//! with the `METHGEO_NUM_THREADS` environment variable.
//!
//! ## Structure
//!
//! * [`data_structs`]: accessions, manifests, decoded intensities, beta
//!   tables and card attributes.
//! * [`io`]: IDAT reading, manifest CSV loading, SOFT card parsing, processed
//!   table parsing and local file discovery. [`io::idat::IdatWriter`] writes
//!   synthetic IDAT files for fixtures.
//! * [`tools`]: beta value computation and the standalone decode entry
//!   points.
//! * [`entity`]: [`GsmEntity`], [`GseEntity`], the [`EntityCache`] and the
//!   [`GeoSession`] that ties them together.
//! * [`utils`]: the shared thread pool and helper macros.
//!
//! ## Usage
//!
//! ### Decoding a downloaded sample
//!
//! ```no_run
//! use methgeo::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut registry = ManifestRegistry::default();
//!     registry.insert(load_manifest_csv("450k", "manifests/450k.csv")?);
//!
//!     let files = ChannelFiles::new(
//!         "GSM1000001_200001_R01C01_Grn.idat.gz",
//!         "GSM1000001_200001_R01C01_Red.idat.gz",
//!         "450k",
//!     );
//!     let table = decode_and_compute(&files, "450k", &registry)?;
//!     for (probe, beta) in table.betas().take(5) {
//!         println!("{probe}\t{beta:.4}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Working with series
//!
//! ```no_run
//! use methgeo::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let cards = SoftTextSource::new()
//!         .with_card("GSE500001", std::fs::read_to_string("GSE500001.soft")?)?;
//!     let files = IdatDirectory::scan("idats", "GPL13534")?;
//!
//!     let mut registry = ManifestRegistry::default();
//!     registry.insert(load_manifest_csv("450k", "manifests/450k.csv")?);
//!
//!     let mut session = GeoSession::new(cards, files, registry);
//!     let series = session.load_gse_data(&Accession::series("GSE500001")?)?;
//!     let betas = series.borrow().to_frame(Section::Data)?;
//!     println!("{betas}");
//!     Ok(())
//! }
//! ```

pub mod data_structs;
pub mod entity;
pub mod error;
pub mod io;
pub mod prelude;
pub mod tools;
pub mod utils;

pub use data_structs::{
    Accession,
    ArrayManifest,
    BetaTable,
    ManifestRegistry,
    RawIntensityPair,
};
pub use entity::{
    ChannelFileSource,
    EntityCache,
    GeoSession,
    GseEntity,
    GsmData,
    GsmEntity,
    MetadataSource,
    SoftTextSource,
};
pub use error::{
    CharacteristicsParseWarning,
    Error,
    FormatError,
    ManifestMismatchError,
    Result,
};
pub use io::idat::ChannelFiles;
pub use io::{
    IdatDirectory,
    SeriesMatrix,
};
pub use tools::{
    decode_and_compute,
    decode_and_compute_batch,
    PipelineConfig,
};
