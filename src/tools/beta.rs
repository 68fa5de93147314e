use indexmap::IndexMap;
use log::{
    debug,
    warn,
};

use crate::data_structs::typedef::{
    BetaType,
    IntensityType,
};
use crate::data_structs::{
    ArrayManifest,
    BetaRecord,
    BetaTable,
    Channel,
    ManifestProbe,
    RawIntensityPair,
};
use crate::error::Error;

/// Guard added to the denominator so that `(0, 0)` yields `0` instead of NaN.
pub const BETA_OFFSET: BetaType = 100.0;

/// Computes beta values of a decoded channel pair against a manifest.
///
/// `beta = m / (m + u + offset)` where `m` is the intensity at the probe's
/// methylated address and `u` the intensity at its unmethylated address.
/// Each address is read in the scan given by the probe's
/// [`ProbeDesign`](crate::data_structs::ProbeDesign): Infinium II probes read
/// `m` in the green scan and `u` in the red one, Infinium I probes read both
/// in their colour channel. No background correction or normalization is
/// applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaComputer {
    offset: BetaType,
}

impl Default for BetaComputer {
    fn default() -> Self {
        Self {
            offset: BETA_OFFSET,
        }
    }
}

impl BetaComputer {
    /// Fails unless `offset` is finite and strictly positive.
    pub fn new(offset: BetaType) -> Result<Self, Error> {
        if !(offset.is_finite() && offset > 0.0) {
            return Err(Error::Config(format!(
                "beta offset must be finite and > 0, got {}",
                offset
            )));
        }
        Ok(Self { offset })
    }

    pub fn offset(&self) -> BetaType {
        self.offset
    }

    #[inline]
    pub fn beta(
        &self,
        methylated: IntensityType,
        unmethylated: IntensityType,
    ) -> BetaType {
        let m = methylated as BetaType;
        let u = unmethylated as BetaType;
        m / (m + u + self.offset)
    }

    /// Builds the beta table in manifest order.
    ///
    /// Probes with an address absent from the pair are left out and counted
    /// in [`BetaTable::dropped_probes`].
    pub fn compute(
        &self,
        pair: &RawIntensityPair,
        manifest: &ArrayManifest,
    ) -> BetaTable {
        let grn_index = pair.methylated().index();
        let red_index = pair.unmethylated().index();
        let read = |probe: &ManifestProbe, allele: Channel| {
            let index = match probe.source(allele) {
                Channel::Methylated => &grn_index,
                Channel::Unmethylated => &red_index,
            };
            index.get(&probe.address(allele)).copied()
        };

        let mut records = IndexMap::with_capacity(manifest.len());
        let mut dropped = 0usize;
        for probe in manifest.probes() {
            let intensities = (
                read(probe, Channel::Methylated),
                read(probe, Channel::Unmethylated),
            );
            match intensities {
                (Some(m), Some(u)) => {
                    records.insert(probe.probe_id.clone(), BetaRecord {
                        beta:         self.beta(m, u),
                        methylated:   Some(m),
                        unmethylated: Some(u),
                    });
                },
                _ => dropped += 1,
            }
        }

        let unmapped = pair
            .methylated()
            .addresses
            .iter()
            .filter(|address| !manifest.contains_address(**address))
            .count();

        if dropped > 0 {
            warn!(
                "{}: {} of {} manifest probes have no intensity and were dropped",
                manifest.array_type(),
                dropped,
                manifest.len()
            );
        }
        debug!(
            "{}: computed {} betas, {} raw addresses outside the manifest",
            manifest.array_type(),
            records.len(),
            unmapped
        );

        BetaTable::from_parts(
            manifest.array_type().to_string(),
            records,
            dropped,
            unmapped,
        )
    }
}

/// [`BetaComputer::compute`] with the default offset.
pub fn compute_betas(
    pair: &RawIntensityPair,
    manifest: &ArrayManifest,
) -> BetaTable {
    BetaComputer::default().compute(pair, manifest)
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rstest::*;

    use super::*;
    use crate::data_structs::{
        ChannelReads,
        IdatMetadata,
        ProbeDesign,
    };

    fn pair(
        meth: &[(u32, u16)],
        unmeth: &[(u32, u16)],
    ) -> RawIntensityPair {
        RawIntensityPair::try_new(
            ChannelReads::from_pairs(meth.iter().copied()),
            ChannelReads::from_pairs(unmeth.iter().copied()),
            IdatMetadata::default(),
            "memory",
        )
        .unwrap()
    }

    #[fixture]
    fn manifest() -> ArrayManifest {
        ArrayManifest::try_new("450k", [
            ManifestProbe::new("cg00000029", 1000, 2000),
            ManifestProbe::new("cg00000108", 1001, 2001),
            ManifestProbe::new("cg00000109", 1002, 2002),
        ])
        .unwrap()
    }

    #[rstest]
    #[case(300, 700, 300.0 / 1100.0)]
    #[case(0, 0, 0.0)]
    #[case(u16::MAX, 0, 65535.0 / 65635.0)]
    #[case(0, u16::MAX, 0.0)]
    fn guarded_division(
        #[case] m: u16,
        #[case] u: u16,
        #[case] expected: f64,
    ) {
        let beta = BetaComputer::default().beta(m, u);
        assert_approx_eq!(beta, expected, 1e-12);
        assert!((0.0..=1.0).contains(&beta));
    }

    #[rstest]
    fn probe_ids_follow_manifest_order(manifest: ArrayManifest) {
        let pair = pair(
            &[(2002, 1), (1000, 300), (2001, 5), (2000, 2), (1001, 10), (1002, 20)],
            &[(1000, 9), (2000, 700), (1001, 1), (2001, 50), (1002, 7), (2002, 70)],
        );
        let table = compute_betas(&pair, &manifest);

        let order: Vec<&str> = table.betas().map(|(p, _)| p).collect();
        assert_eq!(order, ["cg00000029", "cg00000108", "cg00000109"]);
        assert_approx_eq!(table.beta("cg00000029").unwrap(), 300.0 / 1100.0, 1e-12);
        assert_eq!(table.dropped_probes(), 0);
        assert_eq!(table.unmapped_addresses(), 0);
    }

    #[rstest]
    fn missing_address_drops_probe(manifest: ArrayManifest) {
        let pair = pair(
            &[(1000, 300), (2000, 1), (1001, 10), (2001, 5), (7, 7)],
            &[(1000, 1), (2000, 700), (1001, 1), (2001, 50), (7, 7)],
        );
        let table = compute_betas(&pair, &manifest);

        assert_eq!(table.len(), 2);
        assert!(!table.contains("cg00000109"));
        assert_eq!(table.dropped_probes(), 1);
        assert_eq!(table.unmapped_addresses(), 1);
    }

    #[rstest]
    fn channels_are_not_swapped(manifest: ArrayManifest) {
        // Each address carries a different value in the other channel.
        let pair = pair(
            &[(1000, 400), (2000, 100)],
            &[(1000, 100), (2000, 0)],
        );
        let table = compute_betas(&pair, &manifest);
        let record = table.get("cg00000029").unwrap();
        assert_eq!((record.methylated, record.unmethylated), (Some(400), Some(0)));
        assert_approx_eq!(record.beta, 0.8, 1e-12);
    }

    #[rstest]
    #[case::red(Channel::Unmethylated, 9000.0 / 9300.0)]
    #[case::grn(Channel::Methylated, 60.0 / 210.0)]
    fn type_i_reads_one_scan(
        #[case] colour: Channel,
        #[case] expected: f64,
    ) {
        // AddressA (10) is unmethylated, AddressB (20) methylated.
        let manifest = ArrayManifest::try_new("450k", [ManifestProbe::new(
            "cg_type_i", 20, 10,
        )
        .with_design(ProbeDesign::SingleChannel(colour))])
        .unwrap();
        let pair = pair(&[(10, 50), (20, 60)], &[(10, 200), (20, 9000)]);

        let table = compute_betas(&pair, &manifest);
        let record = table.get("cg_type_i").unwrap();
        assert_approx_eq!(record.beta, expected, 1e-12);
        if colour == Channel::Unmethylated {
            assert_approx_eq!(record.beta, 0.9677, 1e-4);
            assert_eq!(
                (record.methylated, record.unmethylated),
                (Some(9000), Some(200))
            );
        }
    }

    #[test]
    fn mixed_designs_in_one_manifest() {
        let manifest = ArrayManifest::try_new("450k", [
            ManifestProbe::new("cg_red", 20, 10)
                .with_design(ProbeDesign::SingleChannel(Channel::Unmethylated)),
            ManifestProbe::new("cg_grn", 40, 30)
                .with_design(ProbeDesign::SingleChannel(Channel::Methylated)),
            ManifestProbe::new("cg_two", 50, 50),
        ])
        .unwrap();
        let pair = pair(
            &[(10, 1), (20, 2), (30, 300), (40, 700), (50, 900)],
            &[(10, 100), (20, 800), (30, 3), (40, 4), (50, 0)],
        );

        let table = compute_betas(&pair, &manifest);
        assert_approx_eq!(table.beta("cg_red").unwrap(), 800.0 / 1000.0, 1e-12);
        assert_approx_eq!(table.beta("cg_grn").unwrap(), 700.0 / 1100.0, 1e-12);
        assert_approx_eq!(table.beta("cg_two").unwrap(), 0.9, 1e-12);
        assert_eq!(table.dropped_probes(), 0);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_bad_offset(#[case] offset: f64) {
        assert!(matches!(BetaComputer::new(offset), Err(Error::Config(_))));
    }

    #[test]
    fn custom_offset() {
        let computer = BetaComputer::new(1.0).unwrap();
        assert_approx_eq!(computer.beta(1, 0), 0.5, 1e-12);
    }
}
