pub use crate::data_structs::typedef::{
    AddressType,
    BetaType,
    IntensityType,
    ProbeId,
};
pub use crate::data_structs::{
    Accession,
    AccessionKind,
    ArrayManifest,
    BetaRecord,
    BetaTable,
    Channel,
    ChannelReads,
    Characteristics,
    IdatMetadata,
    InfoAttributes,
    ManifestProbe,
    ManifestRegistry,
    ProbeDesign,
    RawIntensityPair,
    Section,
    CHARACTERISTICS_RAW_KEY,
};
pub use crate::entity::{
    ChannelFileSource,
    DataAvailability,
    EntityCache,
    GeoSession,
    GseEntity,
    GsmData,
    GsmEntity,
    MetadataSource,
    SampleCard,
    SeriesCard,
    Shared,
    SoftTextSource,
};
pub use crate::error::{
    CharacteristicsParseWarning,
    Error,
    FormatError,
    ManifestMismatchError,
};
pub use crate::io::compression::Compression;
pub use crate::io::idat::{
    decode_pair,
    read_idat,
    ChannelFiles,
    IdatReader,
    IdatWriter,
};
pub use crate::io::{
    load_manifest_csv,
    load_series_matrix,
    parse_sample_table,
    read_manifest_csv,
    read_series_matrix,
    IdatDirectory,
    SeriesMatrix,
};
pub use crate::tools::{
    compute_betas,
    decode_and_compute,
    decode_and_compute_batch,
    BetaComputer,
    PipelineConfig,
    BETA_OFFSET,
};
