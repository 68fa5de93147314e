use log::{
    debug,
    info,
};
use rayon::prelude::*;

use super::beta::{
    BetaComputer,
    BETA_OFFSET,
};
use crate::data_structs::typedef::BetaType;
use crate::data_structs::{
    BetaTable,
    ManifestRegistry,
};
use crate::error::Error;
use crate::io::idat::ChannelFiles;
use crate::utils::THREAD_POOL;
use crate::with_field_fn;

/// Parameters of the decode and beta computation step.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub beta_offset: BetaType,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            beta_offset: BETA_OFFSET,
        }
    }
}

impl PipelineConfig {
    with_field_fn!(beta_offset, BetaType);

    pub fn new(beta_offset: BetaType) -> Self {
        Self { beta_offset }
    }

    pub fn computer(&self) -> Result<BetaComputer, Error> {
        BetaComputer::new(self.beta_offset)
    }

    /// Decodes one channel pair and computes its beta table.
    ///
    /// The manifest is resolved before any file is opened, so an unknown
    /// array type never costs a decode.
    pub fn run(
        &self,
        files: &ChannelFiles,
        array_type: &str,
        registry: &ManifestRegistry,
    ) -> Result<BetaTable, Error> {
        let computer = self.computer()?;
        let manifest = registry.get(array_type)?;
        let pair = files.decode()?;
        let table = computer.compute(&pair, &manifest);
        info!(
            "{}: {} betas from {} ({} dropped)",
            manifest.array_type(),
            table.len(),
            files.methylated.display(),
            table.dropped_probes()
        );
        Ok(table)
    }

    /// Runs independent jobs on the shared thread pool, each against the
    /// array type declared in its [`ChannelFiles`]. Results keep input order.
    pub fn run_batch(
        &self,
        jobs: &[ChannelFiles],
        registry: &ManifestRegistry,
    ) -> Vec<Result<BetaTable, Error>> {
        debug!(
            "Running {} decode jobs on {} threads",
            jobs.len(),
            THREAD_POOL.current_num_threads()
        );
        THREAD_POOL.install(|| {
            jobs.par_iter()
                .map(|files| self.run(files, &files.array_type, registry))
                .collect()
        })
    }
}

/// Decodes a pre-downloaded channel pair without constructing any entity.
pub fn decode_and_compute(
    files: &ChannelFiles,
    array_type: &str,
    registry: &ManifestRegistry,
) -> Result<BetaTable, Error> {
    PipelineConfig::default().run(files, array_type, registry)
}

/// Batch form of [`decode_and_compute`]; see [`PipelineConfig::run_batch`].
pub fn decode_and_compute_batch(
    jobs: &[ChannelFiles],
    registry: &ManifestRegistry,
) -> Vec<Result<BetaTable, Error>> {
    PipelineConfig::default().run_batch(jobs, registry)
}
