use std::fmt::Display;
use std::str::FromStr;

use arcstr::ArcStr;
use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::error::Error;

static ACCESSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(GSM|GSE|GPL)([0-9]+)$").unwrap());
static SAMPLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"GSM[0-9]+").unwrap());
static SERIES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"GSE[0-9]+").unwrap());
static PLATFORM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"GPL[0-9]+").unwrap());

/// Kind of GEO record an accession points at.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord)]
pub enum AccessionKind {
    /// `GSM…`, one physical array run.
    Sample,
    /// `GSE…`, a collection of samples.
    Series,
    /// `GPL…`, an array platform.
    Platform,
}

impl AccessionKind {
    pub const fn prefix(&self) -> &'static str {
        match self {
            AccessionKind::Sample => "GSM",
            AccessionKind::Series => "GSE",
            AccessionKind::Platform => "GPL",
        }
    }

    /// Unanchored pattern matching accessions of this kind.
    fn pattern(&self) -> &'static Regex {
        match self {
            AccessionKind::Sample => &SAMPLE_RE,
            AccessionKind::Series => &SERIES_RE,
            AccessionKind::Platform => &PLATFORM_RE,
        }
    }
}

/// Validated, upper-cased GEO accession (e.g. `GSM1234567`).
#[derive(Eq, Hash, PartialEq, Clone, Debug, PartialOrd, Ord)]
pub struct Accession {
    id:   ArcStr,
    kind: AccessionKind,
}

impl Accession {
    pub fn new(id: &str) -> Result<Self, Error> {
        let normalized = id.trim().to_uppercase();
        let captures = ACCESSION_RE
            .captures(&normalized)
            .ok_or_else(|| Error::InvalidAccession(id.to_string()))?;
        let kind = match &captures[1] {
            "GSM" => AccessionKind::Sample,
            "GSE" => AccessionKind::Series,
            _ => AccessionKind::Platform,
        };
        Ok(Self {
            id: ArcStr::from(normalized),
            kind,
        })
    }

    /// Parses and checks the accession kind.
    pub fn new_of_kind(
        id: &str,
        kind: AccessionKind,
    ) -> Result<Self, Error> {
        let accession = Self::new(id)?;
        if accession.kind != kind {
            return Err(Error::InvalidAccession(format!(
                "{} (expected {} accession)",
                id,
                kind.prefix()
            )));
        }
        Ok(accession)
    }

    pub fn sample(id: &str) -> Result<Self, Error> {
        Self::new_of_kind(id, AccessionKind::Sample)
    }

    pub fn series(id: &str) -> Result<Self, Error> {
        Self::new_of_kind(id, AccessionKind::Series)
    }

    pub fn kind(&self) -> AccessionKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl FromStr for Accession {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Accession {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

impl Display for Accession {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Extracts every distinct accession of `kind` mentioned in free text, in
/// order of first appearance.
pub fn find_accessions(
    text: &str,
    kind: AccessionKind,
) -> Vec<Accession> {
    let mut found: Vec<Accession> = Vec::new();
    for m in kind.pattern().find_iter(text) {
        if let Ok(accession) = Accession::new(m.as_str()) {
            if !found.contains(&accession) {
                found.push(accession);
            }
        }
    }
    found
}
