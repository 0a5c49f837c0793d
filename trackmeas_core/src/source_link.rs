// trackmeas_core/src/source_link.rs

use crate::geometry::GeometryIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// The identity a measurement carries back to its detector readout.
///
/// Measurements store the link by value and never interpret it. The only
/// capability they rely on is resolving the geometry element the readout
/// belongs to; the element itself is looked up by the caller, who already
/// holds it from navigation. Storing it here would force either an enum of
/// every surface/volume kind or a downcast from a common trait object.
pub trait SourceLink: Clone + PartialEq + Debug {
    fn geometry_id(&self) -> GeometryIdentifier;
}

/// A source link that points into an external container by index.
///
/// Unlike the measurements holding them, index links are totally ordered:
/// first by geometry, then by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexSourceLink {
    pub geometry_id: GeometryIdentifier,
    pub index: u32,
}

impl IndexSourceLink {
    pub fn new(geometry_id: GeometryIdentifier, index: u32) -> Self {
        Self { geometry_id, index }
    }
}

impl SourceLink for IndexSourceLink {
    fn geometry_id(&self) -> GeometryIdentifier {
        self.geometry_id
    }
}
