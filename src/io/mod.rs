pub mod compression;
pub mod directory;
pub mod idat;
pub mod manifest;
pub mod processed;
pub mod soft;

pub use directory::{
    IdatDirectory,
    IdatFileName,
};
pub use idat::{
    decode_pair,
    read_idat,
    ChannelFiles,
    IdatReader,
    IdatWriter,
};
pub use manifest::{
    load_manifest_csv,
    read_manifest_csv,
};
pub use processed::{
    load_series_matrix,
    parse_sample_table,
    read_series_matrix,
    SeriesMatrix,
};
