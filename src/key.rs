use std::hash::Hash;
use std::str::FromStr;

use strum::VariantArray;

/// A closed set of metadata keys.
///
/// Each key has a unique, case-sensitive name; that name is what gets stored
/// in the file. Any fieldless enum deriving `strum::VariantArray`,
/// `strum::IntoStaticStr` and `strum::EnumString` is a key set. Renames with
/// `#[strum(serialize = "..")]` apply to both directions.
///
/// ```rust
/// use png_stamp::MetadataKey;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// #[derive(strum::VariantArray, strum::IntoStaticStr, strum::EnumString)]
/// pub enum RenderKey {
///     JobId,
///     Scene,
/// }
///
/// assert_eq!(RenderKey::from_name("Scene"), Some(RenderKey::Scene));
/// assert_eq!(RenderKey::from_name("scene"), None);
/// assert_eq!(RenderKey::JobId.name(), "JobId");
/// ```
pub trait MetadataKey:
    Copy + Eq + Hash + Send + Sync + 'static + VariantArray + Into<&'static str> + FromStr
{
    /// Stored name of this key.
    fn name(&self) -> &'static str {
        (*self).into()
    }

    /// Exact name lookup. Unknown names yield `None`.
    fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }
}

impl<K> MetadataKey for K where
    K: Copy + Eq + Hash + Send + Sync + 'static + VariantArray + Into<&'static str> + FromStr
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[derive(strum::VariantArray, strum::IntoStaticStr, strum::EnumString)]
    enum Sample {
        Alpha,
        Beta,
        /// documented variant
        Gamma,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[derive(strum::VariantArray, strum::IntoStaticStr, strum::EnumString)]
    enum Renamed {
        #[strum(serialize = "job_id")]
        JobId,
        Scene,
    }

    #[test]
    fn every_name_round_trips() {
        for key in Sample::VARIANTS {
            assert_eq!(Sample::from_name(key.name()), Some(*key));
        }
        assert_eq!(Sample::Gamma.name(), "Gamma");
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(Sample::from_name("alpha"), None);
        assert_eq!(Sample::from_name("Alpha "), None);
        assert_eq!(Sample::from_name(""), None);
    }

    #[test]
    fn renamed_variants_use_stored_name() {
        assert_eq!(Renamed::JobId.name(), "job_id");
        assert_eq!(Renamed::from_name("job_id"), Some(Renamed::JobId));
        assert_eq!(Renamed::from_name("JobId"), None);
        assert_eq!(Renamed::from_name("Scene"), Some(Renamed::Scene));
    }
}
