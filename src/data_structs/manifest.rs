use std::collections::BTreeMap;
use std::sync::Arc;

use hashbrown::HashMap;
use itertools::Itertools;
use log::debug;

use super::enums::Channel;
use super::typedef::{
    AddressType,
    ProbeId,
};
use crate::error::{
    Error,
    ManifestMismatchError,
};

/// GEO platform accessions of the arrays shipped by Illumina.
pub const DEFAULT_PLATFORM_ALIASES: &[(&str, &str)] = &[
    ("GPL13534", "450k"),
    ("GPL16304", "450k"),
    ("GPL21145", "epic"),
    ("GPL23976", "epic"),
];

/// Infinium probe chemistry: which scan each bead address is read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProbeDesign {
    /// Infinium II. The methylated address is read in the green
    /// ([`Channel::Methylated`]) scan and the unmethylated address in the red
    /// ([`Channel::Unmethylated`]) scan.
    #[default]
    TwoChannel,
    /// Infinium I. Both addresses are read in the given scan.
    SingleChannel(Channel),
}

impl ProbeDesign {
    /// Scan the `allele` address is read in.
    pub fn source(
        &self,
        allele: Channel,
    ) -> Channel {
        match self {
            ProbeDesign::TwoChannel => allele,
            ProbeDesign::SingleChannel(scan) => *scan,
        }
    }
}

/// Manifest row: the raw addresses read for one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestProbe {
    pub probe_id:             ProbeId,
    pub methylated_address:   AddressType,
    pub unmethylated_address: AddressType,
    pub design:               ProbeDesign,
}

impl ManifestProbe {
    /// Two-channel (Infinium II) probe.
    pub fn new<S: Into<ProbeId>>(
        probe_id: S,
        methylated_address: AddressType,
        unmethylated_address: AddressType,
    ) -> Self {
        Self {
            probe_id: probe_id.into(),
            methylated_address,
            unmethylated_address,
            design: ProbeDesign::TwoChannel,
        }
    }

    pub fn with_design(
        mut self,
        design: ProbeDesign,
    ) -> Self {
        self.design = design;
        self
    }

    pub fn address(
        &self,
        allele: Channel,
    ) -> AddressType {
        match allele {
            Channel::Methylated => self.methylated_address,
            Channel::Unmethylated => self.unmethylated_address,
        }
    }

    /// Scan the `allele` address is read in.
    pub fn source(
        &self,
        allele: Channel,
    ) -> Channel {
        self.design.source(allele)
    }
}

/// Immutable probe ↔ address mapping for a single array type.
///
/// Probes keep their load order, which is the row order of every
/// [`BetaTable`](crate::data_structs::BetaTable) computed against the
/// manifest.
#[derive(Debug, Clone)]
pub struct ArrayManifest {
    array_type: String,
    probes:     Vec<ManifestProbe>,
    by_probe:   HashMap<ProbeId, usize>,
    by_address: HashMap<AddressType, Vec<(usize, Channel)>>,
}

impl ArrayManifest {
    /// Builds a manifest, rejecting duplicated probe identifiers.
    pub fn try_new<I>(
        array_type: &str,
        probes: I,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = ManifestProbe>, {
        let array_type = normalize_array_type(array_type);
        let probes = probes.into_iter().collect_vec();

        let mut by_probe = HashMap::with_capacity(probes.len());
        let mut by_address: HashMap<AddressType, Vec<(usize, Channel)>> =
            HashMap::with_capacity(probes.len() * 2);

        for (idx, probe) in probes.iter().enumerate() {
            if by_probe.insert(probe.probe_id.clone(), idx).is_some() {
                return Err(Error::Manifest {
                    array_type,
                    reason: format!("duplicated probe id '{}'", probe.probe_id),
                });
            }
            for channel in [Channel::Methylated, Channel::Unmethylated] {
                by_address
                    .entry(probe.address(channel))
                    .or_default()
                    .push((idx, channel));
            }
        }
        debug!(
            "Built manifest '{}' with {} probes over {} addresses",
            array_type,
            probes.len(),
            by_address.len()
        );

        Ok(Self {
            array_type,
            probes,
            by_probe,
            by_address,
        })
    }

    pub fn array_type(&self) -> &str {
        &self.array_type
    }

    pub fn probes(&self) -> &[ManifestProbe] {
        &self.probes
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn get(
        &self,
        probe_id: &str,
    ) -> Option<&ManifestProbe> {
        self.by_probe.get(probe_id).map(|idx| &self.probes[*idx])
    }

    /// Probes referencing `address`, with the allele the address measures.
    pub fn probes_for_address(
        &self,
        address: AddressType,
    ) -> impl Iterator<Item = (&ProbeId, Channel)> + '_ {
        self.by_address
            .get(&address)
            .into_iter()
            .flatten()
            .map(|(idx, channel)| (&self.probes[*idx].probe_id, *channel))
    }

    pub fn contains_address(
        &self,
        address: AddressType,
    ) -> bool {
        self.by_address.contains_key(&address)
    }
}

/// Lowercased, trimmed array type name used as registry key.
pub fn normalize_array_type(array_type: &str) -> String {
    array_type.trim().to_lowercase()
}

/// Loaded manifests keyed by array type, plus platform accession aliases.
///
/// Manifests are shared read-only through [`Arc`]; inserting a manifest for
/// an already registered array type replaces the registry's handle but never
/// mutates a manifest already handed out.
#[derive(Debug, Clone)]
pub struct ManifestRegistry {
    manifests: BTreeMap<String, Arc<ArrayManifest>>,
    aliases:   BTreeMap<String, String>,
}

impl Default for ManifestRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (platform, array_type) in DEFAULT_PLATFORM_ALIASES {
            registry.add_alias(platform, array_type);
        }
        registry
    }
}

impl ManifestRegistry {
    /// Registry with no manifests and no aliases.
    pub fn empty() -> Self {
        Self {
            manifests: BTreeMap::new(),
            aliases:   BTreeMap::new(),
        }
    }

    pub fn insert(
        &mut self,
        manifest: ArrayManifest,
    ) -> Arc<ArrayManifest> {
        let manifest = Arc::new(manifest);
        self.manifests
            .insert(manifest.array_type().to_string(), manifest.clone());
        manifest
    }

    /// Maps a platform accession (or any other name) onto an array type.
    pub fn add_alias(
        &mut self,
        alias: &str,
        array_type: &str,
    ) {
        self.aliases
            .insert(normalize_array_type(alias), normalize_array_type(array_type));
    }

    /// Canonical array type for a name or platform alias.
    pub fn resolve_name(
        &self,
        array_type: &str,
    ) -> String {
        let key = normalize_array_type(array_type);
        self.aliases.get(&key).cloned().unwrap_or(key)
    }

    pub fn get(
        &self,
        array_type: &str,
    ) -> Result<Arc<ArrayManifest>, ManifestMismatchError> {
        self.manifests
            .get(&self.resolve_name(array_type))
            .cloned()
            .ok_or_else(|| {
                ManifestMismatchError {
                    array_type: array_type.to_string(),
                    known:      self.array_types().map(String::from).collect(),
                }
            })
    }

    pub fn contains(
        &self,
        array_type: &str,
    ) -> bool {
        self.manifests.contains_key(&self.resolve_name(array_type))
    }

    pub fn array_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.manifests.keys().map(String::as_str)
    }
}
