#![allow(dead_code)]
use std::fmt::Write as _;
use std::path::Path;

use itertools::Itertools;
use methgeo::prelude::*;
use rand::rngs::StdRng;
use rand::{
    Rng,
    SeedableRng,
};

pub const DEMO_ARRAY_TYPE: &str = "450k";
pub const DEMO_PLATFORM: &str = "GPL13534";
const ADDRESS_BASE: u32 = 10_000_000;

pub fn init_logger() {
    let _ = pretty_env_logger::try_init();
}

/// Channel reads written for one demo sample, with their paths.
pub struct DemoSample {
    pub files:        ChannelFiles,
    pub methylated:   ChannelReads,
    pub unmethylated: ChannelReads,
}

impl DemoSample {
    /// Written `(m, u)` intensities of a probe, read in the scans its design
    /// names.
    pub fn intensities(
        &self,
        probe: &ManifestProbe,
    ) -> Option<(f64, f64)> {
        let read = |allele: Channel| {
            let reads = match probe.source(allele) {
                Channel::Methylated => &self.methylated,
                Channel::Unmethylated => &self.unmethylated,
            };
            reads.index().get(&probe.address(allele)).map(|v| *v as f64)
        };
        Some((read(Channel::Methylated)?, read(Channel::Unmethylated)?))
    }

    /// Beta recomputed straight from the written reads.
    pub fn expected_beta(
        &self,
        probe: &ManifestProbe,
    ) -> Option<f64> {
        let (m, u) = self.intensities(probe)?;
        Some(m / (m + u + BETA_OFFSET))
    }
}

/// Generates a manifest and matching random IDAT pairs.
///
/// The last `missing` probes of the manifest have no reads in the written
/// files, and `extra` addresses are written that no probe references.
pub struct DemoArrayBuilder<R: Rng> {
    rng:      R,
    n_probes: usize,
    missing:  usize,
    extra:    usize,
}

impl DemoArrayBuilder<StdRng> {
    pub fn new(
        n_probes: usize,
        missing: usize,
        extra: usize,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            n_probes,
            missing,
            extra,
        }
    }
}

impl<R: Rng> DemoArrayBuilder<R> {
    /// Cycles through Infinium I red, Infinium I green and Infinium II
    /// probes. Infinium II probes use a single address.
    pub fn probes(&self) -> Vec<ManifestProbe> {
        (0..self.n_probes)
            .map(|i| {
                let base = ADDRESS_BASE + 2 * i as u32;
                let id = format!("cg{:08}", i);
                match i % 3 {
                    0 => ManifestProbe::new(id, base + 1, base)
                        .with_design(ProbeDesign::SingleChannel(Channel::Unmethylated)),
                    1 => ManifestProbe::new(id, base + 1, base)
                        .with_design(ProbeDesign::SingleChannel(Channel::Methylated)),
                    _ => ManifestProbe::new(id, base, base),
                }
            })
            .collect()
    }

    pub fn manifest(&self) -> ArrayManifest {
        ArrayManifest::try_new(DEMO_ARRAY_TYPE, self.probes()).unwrap()
    }

    /// Illumina layout: `AddressA_ID` unmethylated, `AddressB_ID` methylated
    /// and empty for Infinium II rows.
    pub fn manifest_csv(&self) -> String {
        let mut out = String::from(
            "IlmnID,Name,AddressA_ID,AddressB_ID,Infinium_Design_Type,Color_Channel\n",
        );
        for probe in self.probes() {
            let (address_b, design, color) = match probe.design {
                ProbeDesign::SingleChannel(Channel::Unmethylated) => {
                    (probe.methylated_address.to_string(), "I", "Red")
                },
                ProbeDesign::SingleChannel(Channel::Methylated) => {
                    (probe.methylated_address.to_string(), "I", "Grn")
                },
                ProbeDesign::TwoChannel => (String::new(), "II", ""),
            };
            writeln!(
                out,
                "{},{},{},{},{},{}",
                probe.probe_id, probe.probe_id, probe.unmethylated_address, address_b, design, color
            )
            .unwrap();
        }
        out
    }

    pub fn write_manifest(
        &self,
        path: &Path,
    ) {
        std::fs::write(path, self.manifest_csv()).unwrap();
    }

    fn addresses(&self) -> Vec<u32> {
        let present = self.n_probes - self.missing;
        let mut addresses: Vec<u32> = self.probes()[..present]
            .iter()
            .flat_map(|p| [p.unmethylated_address, p.methylated_address])
            .dedup()
            .collect();
        addresses.extend((0..self.extra as u32).map(|a| a + 1));
        addresses
    }

    fn channel(
        &mut self,
        addresses: &[u32],
    ) -> ChannelReads {
        let means = addresses.iter().map(|_| self.rng.gen_range(0..=u16::MAX)).collect();
        let deviations = addresses.iter().map(|_| self.rng.gen_range(0..2000)).collect();
        let beads = addresses.iter().map(|_| self.rng.gen_range(3..30)).collect();
        ChannelReads::new(addresses.to_vec(), means)
            .with_deviations(deviations)
            .with_bead_counts(beads)
    }

    /// Writes `{gsm}_{sentrix}_R01C01_{Grn|Red}.idat[.gz]` into `dir`.
    pub fn write_sample(
        &mut self,
        dir: &Path,
        gsm: &str,
        compression: Compression,
    ) -> DemoSample {
        let addresses = self.addresses();
        let methylated = self.channel(&addresses);
        let unmethylated = self.channel(&addresses);
        let sentrix: u64 = self.rng.gen_range(100_000_000..999_999_999);
        let metadata = IdatMetadata {
            array_type: Some("BeadChip 12x1".into()),
            sample_id: Some(sentrix.to_string()),
            ..Default::default()
        };

        let ext = match compression {
            Compression::Gz => "idat.gz",
            Compression::None => "idat",
        };
        let path = |color: &str| dir.join(format!("{}_{}_R01C01_{}.{}", gsm, sentrix, color, ext));
        let (meth_path, unmeth_path) = (path("Grn"), path("Red"));

        IdatWriter::new(methylated.clone(), metadata.clone())
            .write_to_path(&meth_path, compression)
            .unwrap();
        IdatWriter::new(unmethylated.clone(), metadata)
            .write_to_path(&unmeth_path, compression)
            .unwrap();

        DemoSample {
            files: ChannelFiles::new(meth_path, unmeth_path, DEMO_PLATFORM),
            methylated,
            unmethylated,
        }
    }
}

pub fn sample_soft(
    gsm: &str,
    gse: &str,
    age: u32,
) -> String {
    format!(
        "^SAMPLE = {gsm}\n\
         !Sample_title = blood {age}\n\
         !Sample_geo_accession = {gsm}\n\
         !Sample_series_id = {gse}\n\
         !Sample_platform_id = {DEMO_PLATFORM}\n\
         !Sample_characteristics_ch1 = tissue: whole blood\n\
         !Sample_characteristics_ch1 = age: {age}\n\
         !Sample_supplementary_file = ftp://geo/{gsm}_Grn.idat.gz\n\
         !Sample_supplementary_file = ftp://geo/{gsm}_Red.idat.gz\n"
    )
}

pub fn series_soft(
    gse: &str,
    samples: &[&str],
) -> String {
    let mut out = format!(
        "^SERIES = {gse}\n!Series_title = Demo series\n!Series_geo_accession = {gse}\n"
    );
    for sample in samples {
        writeln!(out, "!Series_sample_id = {}", sample).unwrap();
    }
    out
}
