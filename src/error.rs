//! Error types shared by the decoding, computation and entity layers.
//!
//! Decoding and computation failures are fatal to a single entity's data
//! phase only. They never reach the [`EntityCache`](crate::entity::EntityCache)
//! because entries are inserted after a successful construction.

use std::fmt::Display;
use std::path::PathBuf;

use polars::error::PolarsError;
use thiserror::Error;

use crate::data_structs::Accession;

pub type Result<T> = std::result::Result<T, Error>;

/// Malformed or unsupported IDAT structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: malformed field '{field}': expected {expected}, found {found}", .path.display())]
pub struct FormatError {
    pub path:     PathBuf,
    pub field:    String,
    pub expected: String,
    pub found:    String,
}

impl FormatError {
    pub fn new<P, F, E, D>(
        path: P,
        field: F,
        expected: E,
        found: D,
    ) -> Self
    where
        P: Into<PathBuf>,
        F: Display,
        E: Display,
        D: Display, {
        Self {
            path:     path.into(),
            field:    field.to_string(),
            expected: expected.to_string(),
            found:    found.to_string(),
        }
    }
}

/// Requested array type has no loaded manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no manifest loaded for array type '{array_type}' (known: {})", .known.join(", "))]
pub struct ManifestMismatchError {
    pub array_type: String,
    pub known:      Vec<String>,
}

/// A characteristics line without a `key: value` delimiter.
///
/// Not an error: the fragment is kept under
/// [`CHARACTERISTICS_RAW_KEY`](crate::data_structs::CHARACTERISTICS_RAW_KEY).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("characteristics fragment without ':' delimiter stored raw: '{fragment}'")]
pub struct CharacteristicsParseWarning {
    pub fragment: String,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    ManifestMismatch(#[from] ManifestMismatchError),

    #[error("invalid manifest for '{array_type}': {reason}")]
    Manifest { array_type: String, reason: String },

    #[error("invalid pipeline configuration: {0}")]
    Config(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("collaborator failed for {accession}: {source}")]
    Source {
        accession: Accession,
        #[source]
        source:    anyhow::Error,
    },

    #[error("{accession}: {source}")]
    Entity {
        accession: Accession,
        #[source]
        source:    Box<Error>,
    },

    #[error("invalid accession '{0}'")]
    InvalidAccession(String),

    #[error("{0}: no data available on the sample card")]
    NoData(Accession),

    #[error("invalid processed table: {0}")]
    Table(String),

    #[error("{sample} is not in {series}")]
    UnknownSample { series: Accession, sample: Accession },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl Error {
    pub(crate) fn io<P: Into<PathBuf>>(
        path: P,
        source: std::io::Error,
    ) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn collaborator(
        accession: &Accession,
        source: anyhow::Error,
    ) -> Self {
        Error::Source {
            accession: accession.clone(),
            source,
        }
    }

    /// Attaches the accession whose construction failed.
    pub(crate) fn for_entity(
        self,
        accession: &Accession,
    ) -> Self {
        Error::Entity {
            accession: accession.clone(),
            source:    Box::new(self),
        }
    }

    /// Underlying [`FormatError`], looking through entity context.
    pub fn as_format(&self) -> Option<&FormatError> {
        match self {
            Error::Format(e) => Some(e),
            Error::Entity { source, .. } => source.as_format(),
            _ => None,
        }
    }

    /// Underlying [`ManifestMismatchError`], looking through entity context.
    pub fn as_manifest_mismatch(&self) -> Option<&ManifestMismatchError> {
        match self {
            Error::ManifestMismatch(e) => Some(e),
            Error::Entity { source, .. } => source.as_manifest_mismatch(),
            _ => None,
        }
    }
}
