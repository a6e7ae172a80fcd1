/// A "raw" implementation-specific event.
///
/// The event identifier is CPU vendor and version specific.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Raw {
    /// Event config.
    pub config: u64,
}

super::from!(Raw);
