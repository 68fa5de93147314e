//! GEO sample and series entities, their cache and the session that builds
//! them.
//!
//! A [`GsmEntity`] is built in two phases. The metadata phase runs when the
//! sample is first requested and only reads its card. The data phase runs
//! when the caller asks for it through [`GeoSession::load_gsm_data`]. It
//! decodes the sample's channel files into a beta table, or reads the
//! processed table shown on the card. Series-wide matrices are attached
//! with [`GeoSession::attach_series_matrix`].

mod cache;
mod gse;
mod gsm;
mod session;
mod source;

#[cfg(test)]
mod tests;

pub use cache::{
    EntityCache,
    Shared,
};
pub use gse::GseEntity;
pub use gsm::{
    GsmData,
    GsmEntity,
};
pub use session::GeoSession;
pub use source::{
    ChannelFileSource,
    DataAvailability,
    MetadataSource,
    SampleCard,
    SeriesCard,
    SoftTextSource,
    CHARACTERISTICS_KEY,
};
