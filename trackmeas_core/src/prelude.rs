// trackmeas_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::indices::ParameterIndices;
pub use crate::source_link::SourceLink;

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::geometry::{GeometryHierarchyMap, GeometryIdentifier};
pub use crate::indices::{BoundIndices, FreeIndices, BOUND_SIZE, FREE_SIZE};
pub use crate::measurement::{
    make_measurement, BoundVariableMeasurement, FreeVariableMeasurement, Measurement,
    MeasurementContainer, MeasurementError, VariableSizeMeasurement,
};
pub use crate::source_link::IndexSourceLink;
// The variadic factory macro shares its name with the function above.
pub use crate::make_measurement;
pub use crate::subspace::{FixedSubspaceHelper, VariableSubspaceHelper};

// --- Selection ---
pub use crate::selector::{
    BoundSquareMatrix, BoundVector, MeasurementSelector, MeasurementSelectorCuts, Selection,
    SelectionError,
};
