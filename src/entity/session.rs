use indexmap::IndexMap;
use log::{
    info,
    warn,
};

use super::cache::{
    EntityCache,
    Shared,
};
use super::gse::GseEntity;
use super::gsm::GsmEntity;
use super::source::{
    ChannelFileSource,
    DataAvailability,
    MetadataSource,
};
use crate::data_structs::{
    Accession,
    AccessionKind,
    BetaTable,
    ManifestRegistry,
};
use crate::error::Error;
use crate::io::processed::{
    parse_sample_table,
    SeriesMatrix,
};
use crate::tools::PipelineConfig;

/// Orchestrates entity construction for one interactive session.
///
/// Owns both entity caches, the manifest registry and the two collaborators.
/// Every entity is built through its cache, so metadata is fetched once per
/// accession and a sample's data is decoded at most once.
pub struct GeoSession<M, F> {
    metadata: M,
    files:    F,
    registry: ManifestRegistry,
    config:   PipelineConfig,
    gsms:     EntityCache<GsmEntity>,
    gses:     EntityCache<GseEntity>,
}

fn check_kind(
    accession: &Accession,
    kind: AccessionKind,
) -> Result<(), Error> {
    if accession.kind() != kind {
        return Err(Error::InvalidAccession(format!(
            "{} is not a {} accession",
            accession,
            kind.prefix()
        )));
    }
    Ok(())
}

fn fetch_gsm<M: MetadataSource>(
    metadata: &M,
    gsms: &mut EntityCache<GsmEntity>,
    accession: &Accession,
) -> Result<Shared<GsmEntity>, Error> {
    check_kind(accession, AccessionKind::Sample)?;
    gsms.get_or_create(accession, || {
        let card = metadata
            .sample_card(accession)
            .map_err(|e| Error::collaborator(accession, e))?;
        Ok(GsmEntity::from_card(card))
    })
}

impl<M, F> GeoSession<M, F>
where
    M: MetadataSource,
    F: ChannelFileSource,
{
    pub fn new(
        metadata: M,
        files: F,
        registry: ManifestRegistry,
    ) -> Self {
        Self {
            metadata,
            files,
            registry,
            config: PipelineConfig::default(),
            gsms: EntityCache::new(),
            gses: EntityCache::new(),
        }
    }

    pub fn with_config(
        mut self,
        config: PipelineConfig,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn files(&self) -> &F {
        &self.files
    }

    pub fn registry(&self) -> &ManifestRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ManifestRegistry {
        &mut self.registry
    }

    pub fn gsm_cache(&self) -> &EntityCache<GsmEntity> {
        &self.gsms
    }

    pub fn gse_cache(&self) -> &EntityCache<GseEntity> {
        &self.gses
    }

    /// Sample with metadata only. Channel files are not requested.
    pub fn gsm(
        &mut self,
        accession: &Accession,
    ) -> Result<Shared<GsmEntity>, Error> {
        fetch_gsm(&self.metadata, &mut self.gsms, accession)
    }

    /// Series with every listed sample resolved through the sample cache, in
    /// document order.
    pub fn gse(
        &mut self,
        accession: &Accession,
    ) -> Result<Shared<GseEntity>, Error> {
        check_kind(accession, AccessionKind::Series)?;
        let Self {
            metadata,
            gsms,
            gses,
            ..
        } = self;

        gses.get_or_create(accession, || {
            let card = metadata
                .series_card(accession)
                .map_err(|e| Error::collaborator(accession, e))?;
            let (_, info, sample_ids) = card.into_parts();

            let mut samples = IndexMap::with_capacity(sample_ids.len());
            for sample in sample_ids {
                let handle = fetch_gsm(&*metadata, gsms, &sample)
                    .map_err(|e| e.for_entity(accession))?;
                samples.insert(sample, handle);
            }
            info!("{}: resolved {} samples", accession, samples.len());
            Ok(GseEntity::new(accession.clone(), info, samples))
        })
    }

    /// Runs the data phase of a sample once.
    ///
    /// The card's [`DataAvailability`] picks the path: IDAT samples are
    /// decoded from the channel files, table samples read their processed
    /// table from the metadata source, and samples without data fail with
    /// [`Error::NoData`] before any collaborator is asked. A sample that
    /// already holds data is returned untouched. On failure the sample stays
    /// metadata-only and a later call retries.
    pub fn load_gsm_data(
        &mut self,
        accession: &Accession,
    ) -> Result<Shared<GsmEntity>, Error> {
        let handle = self.gsm(accession)?;
        if handle.borrow().is_loaded() {
            return Ok(handle);
        }

        let (availability, platform) = {
            let gsm = handle.borrow();
            (gsm.availability(), gsm.platform().unwrap_or_default().to_string())
        };
        let table = match availability {
            DataAvailability::None => return Err(Error::NoData(accession.clone())),
            DataAvailability::Table => self.processed_table(accession, &platform)?,
            DataAvailability::Idat => self.decoded_table(accession, &platform)?,
        };
        handle.borrow_mut().attach(table);
        Ok(handle)
    }

    fn decoded_table(
        &self,
        accession: &Accession,
        platform: &str,
    ) -> Result<BetaTable, Error> {
        let files = self
            .files
            .channel_files(accession)
            .map_err(|e| Error::collaborator(accession, e))?;
        let array_type = if files.array_type.trim().is_empty() {
            platform
        }
        else {
            files.array_type.as_str()
        };

        self.config
            .run(&files, array_type, &self.registry)
            .map_err(|e| e.for_entity(accession))
    }

    fn processed_table(
        &self,
        accession: &Accession,
        platform: &str,
    ) -> Result<BetaTable, Error> {
        let text = self
            .metadata
            .sample_table(accession)
            .map_err(|e| Error::collaborator(accession, e))?;
        let rows = parse_sample_table(&text).map_err(|e| e.for_entity(accession))?;
        let table = BetaTable::from_values(self.registry.resolve_name(platform), rows);
        info!(
            "{}: {} betas from the processed table ({} dropped)",
            accession,
            table.len(),
            table.dropped_probes()
        );
        Ok(table)
    }

    /// Attaches the columns of a series-wide matrix to the series' samples.
    ///
    /// A column belongs to a sample when its label is the sample accession or
    /// the sample title. Samples that already hold data keep it. Samples
    /// without a column are recorded in [`GseEntity::no_data`].
    pub fn attach_series_matrix(
        &mut self,
        accession: &Accession,
        matrix: &SeriesMatrix,
    ) -> Result<Shared<GseEntity>, Error> {
        let series = self.gse(accession)?;
        let samples: Vec<(Accession, Shared<GsmEntity>)> = series
            .borrow()
            .samples()
            .map(|(sample, handle)| (sample.clone(), handle.clone()))
            .collect();

        let mut no_data = Vec::new();
        for (sample, handle) in samples {
            let mut gsm = handle.borrow_mut();
            if gsm.is_loaded() {
                continue;
            }
            let title = gsm.info().first("title").unwrap_or_default().to_string();
            let array_type = self
                .registry
                .resolve_name(gsm.platform().unwrap_or_default());
            let table = matrix
                .find_column([sample.as_str(), title.as_str()])
                .and_then(|label| matrix.table(label, &array_type));
            match table {
                Some(table) => {
                    gsm.attach(table);
                },
                None => {
                    warn!("{}: no matrix column for {}", accession, sample);
                    no_data.push(sample);
                },
            }
        }
        info!(
            "{}: attached matrix of {} probes, {} samples without a column",
            accession,
            matrix.len(),
            no_data.len()
        );
        series.borrow_mut().set_no_data(no_data);
        Ok(series)
    }

    /// Runs the data phase for every sample of a series.
    ///
    /// Failing samples are logged and recorded in
    /// [`GseEntity::no_data`] instead of aborting the series.
    pub fn load_gse_data(
        &mut self,
        accession: &Accession,
    ) -> Result<Shared<GseEntity>, Error> {
        let series = self.gse(accession)?;
        let samples: Vec<Accession> = series.borrow().accessions().cloned().collect();

        let mut no_data = Vec::new();
        for sample in samples {
            if let Err(e) = self.load_gsm_data(&sample) {
                warn!("{}: no data for {}: {}", accession, sample, e);
                no_data.push(sample);
            }
        }
        info!(
            "{}: data loaded, {} samples without data",
            accession,
            no_data.len()
        );
        series.borrow_mut().set_no_data(no_data);
        Ok(series)
    }
}
