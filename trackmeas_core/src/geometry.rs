// trackmeas_core/src/geometry.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// --- Core Identifier ---
/// Identifies a detector element in the volume/layer/sensitive hierarchy.
///
/// A zero component means "unset". Unset components act as wildcards when an
/// identifier is used as a key in a [`GeometryHierarchyMap`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GeometryIdentifier {
    #[serde(default)]
    pub volume: u32,
    #[serde(default)]
    pub layer: u32,
    #[serde(default)]
    pub sensitive: u32,
}

impl GeometryIdentifier {
    pub const fn new(volume: u32, layer: u32, sensitive: u32) -> Self {
        Self {
            volume,
            layer,
            sensitive,
        }
    }

    /// The identifier packed into a single integer: 16 bits volume,
    /// 16 bits layer, 32 bits sensitive. Higher bits of volume/layer are dropped.
    pub fn value(&self) -> u64 {
        ((self.volume as u64 & 0xffff) << 48)
            | ((self.layer as u64 & 0xffff) << 32)
            | self.sensitive as u64
    }

    /// Number of set components, counted from the top of the hierarchy.
    fn depth(&self) -> usize {
        if self.sensitive != 0 {
            3
        } else if self.layer != 0 {
            2
        } else if self.volume != 0 {
            1
        } else {
            0
        }
    }

    /// True if every set component of `self` equals the component of `other`.
    pub fn matches(&self, other: &GeometryIdentifier) -> bool {
        (self.volume == 0 || self.volume == other.volume)
            && (self.layer == 0 || self.layer == other.layer)
            && (self.sensitive == 0 || self.sensitive == other.sensitive)
    }
}

impl fmt::Display for GeometryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vol={}|lay={}|sen={}",
            self.volume, self.layer, self.sensitive
        )
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("duplicate hierarchy key {0}")]
    DuplicateKey(GeometryIdentifier),
}

/// A container that associates values with parts of the geometry hierarchy.
///
/// Lookups return the most specific entry whose set components all match the
/// queried identifier, so an entry for a layer overrides one for its volume,
/// which in turn overrides the global (all zero) default.
#[derive(Debug, Clone)]
pub struct GeometryHierarchyMap<T> {
    entries: Vec<(GeometryIdentifier, T)>,
}

impl<T> GeometryHierarchyMap<T> {
    pub fn new(entries: Vec<(GeometryIdentifier, T)>) -> Result<Self, GeometryError> {
        let mut keys: Vec<GeometryIdentifier> = entries.iter().map(|(id, _)| *id).collect();
        keys.sort_unstable();
        if let Some(pair) = keys.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(GeometryError::DuplicateKey(pair[0]));
        }
        Ok(Self { entries })
    }

    /// A map holding a single global entry that matches every identifier.
    pub fn global(value: T) -> Self {
        Self {
            entries: vec![(GeometryIdentifier::default(), value)],
        }
    }

    pub fn find(&self, id: &GeometryIdentifier) -> Option<&T> {
        self.entries
            .iter()
            .filter(|(key, _)| key.matches(id))
            .max_by_key(|(key, _)| key.depth())
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GeometryIdentifier, &T)> {
        self.entries.iter().map(|(id, value)| (id, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_packs_components() {
        let id = GeometryIdentifier::new(2, 4, 7);
        assert_eq!(id.value(), (2u64 << 48) | (4u64 << 32) | 7);
        assert_eq!(GeometryIdentifier::default().value(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            GeometryIdentifier::new(1, 2, 3).to_string(),
            "vol=1|lay=2|sen=3"
        );
    }

    #[test]
    fn test_find_prefers_most_specific_entry() {
        let map = GeometryHierarchyMap::new(vec![
            (GeometryIdentifier::default(), "global"),
            (GeometryIdentifier::new(1, 0, 0), "volume"),
            (GeometryIdentifier::new(1, 2, 0), "layer"),
            (GeometryIdentifier::new(1, 2, 5), "sensitive"),
        ])
        .unwrap();

        assert_eq!(map.find(&GeometryIdentifier::new(1, 2, 5)), Some(&"sensitive"));
        assert_eq!(map.find(&GeometryIdentifier::new(1, 2, 6)), Some(&"layer"));
        assert_eq!(map.find(&GeometryIdentifier::new(1, 3, 6)), Some(&"volume"));
        assert_eq!(map.find(&GeometryIdentifier::new(9, 3, 6)), Some(&"global"));
    }

    #[test]
    fn test_find_without_default_can_miss() {
        let map = GeometryHierarchyMap::new(vec![(GeometryIdentifier::new(1, 0, 0), 10)]).unwrap();
        assert_eq!(map.find(&GeometryIdentifier::new(1, 1, 1)), Some(&10));
        assert_eq!(map.find(&GeometryIdentifier::new(2, 1, 1)), None);
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let result = GeometryHierarchyMap::new(vec![
            (GeometryIdentifier::new(1, 1, 0), 1),
            (GeometryIdentifier::new(1, 1, 0), 2),
        ]);
        assert_eq!(
            result.unwrap_err(),
            GeometryError::DuplicateKey(GeometryIdentifier::new(1, 1, 0))
        );
    }

    #[test]
    fn test_global_matches_everything() {
        let map = GeometryHierarchyMap::global(3.0);
        assert_eq!(map.len(), 1);
        assert_eq!(map.find(&GeometryIdentifier::new(4, 5, 6)), Some(&3.0));
    }
}
