use arcstr::ArcStr;

/// Bead-type address as stored in the IDAT `IlluminaID` field.
pub type AddressType = u32;
/// Mean bead intensity for one address.
pub type IntensityType = u16;
/// Bead standard deviation for one address.
pub type DeviationType = u16;
/// Number of beads averaged for one address.
pub type BeadCountType = u8;
/// Methylation ratio.
pub type BetaType = f64;
/// Stable probe identifier (e.g. `cg00000029`), shared between manifests and
/// tables without reallocating.
pub type ProbeId = ArcStr;
