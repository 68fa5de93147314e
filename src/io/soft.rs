//! Parsing of GEO SOFT card text (`form=text`) into sample and series cards.
//!
//! Card lines look like `!Sample_title = blood 1`. The record prefix is
//! stripped, the remainder split on the first `=`, and repeated keys keep
//! every value in source order. Lines of other records and lines without a
//! `=` are skipped.

use log::debug;

use crate::data_structs::{
    Accession,
    AccessionKind,
    InfoAttributes,
};
use crate::entity::{
    SampleCard,
    SeriesCard,
};
use crate::error::Error;

pub const SAMPLE_PREFIX: &str = "!Sample_";
pub const SERIES_PREFIX: &str = "!Series_";
/// Series attribute listing member samples in document order.
pub const SERIES_SAMPLE_KEY: &str = "sample_id";

/// `(key, value)` pairs of every `prefix` line.
pub fn soft_attributes<'a>(
    text: &'a str,
    prefix: &'a str,
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    text.lines().filter_map(move |line| {
        let rest = line.trim_end_matches('\r').strip_prefix(prefix)?;
        match rest.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Some((key.trim(), value.trim()))
            },
            _ => {
                debug!("Skipping SOFT line without key: '{}'", line);
                None
            },
        }
    })
}

/// Parses a sample card. `accession` is used when the text lacks
/// `!Sample_geo_accession`.
pub fn parse_sample_soft(
    accession: &Accession,
    text: &str,
) -> Result<SampleCard, Error> {
    let info: InfoAttributes = soft_attributes(text, SAMPLE_PREFIX).collect();
    if let Some(declared) = info.first("geo_accession") {
        let declared = Accession::sample(declared)?;
        if &declared != accession {
            return Err(Error::InvalidAccession(format!(
                "card for {} declares {}",
                accession, declared
            )));
        }
    }
    Ok(SampleCard::new(accession.clone(), info))
}

/// Parses a series card; `!Series_sample_id` lines become the sample list.
pub fn parse_series_soft(
    accession: &Accession,
    text: &str,
) -> Result<SeriesCard, Error> {
    let mut info = InfoAttributes::new();
    let mut samples: Vec<Accession> = Vec::new();
    for (key, value) in soft_attributes(text, SERIES_PREFIX) {
        if key == SERIES_SAMPLE_KEY {
            let sample = Accession::new_of_kind(value, AccessionKind::Sample)?;
            if !samples.contains(&sample) {
                samples.push(sample);
            }
        }
        else {
            info.push(key, value);
        }
    }
    Ok(SeriesCard::new(accession.clone(), info, samples))
}
