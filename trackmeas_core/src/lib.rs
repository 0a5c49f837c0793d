// trackmeas_core/src/lib.rs

//! Compact, allocation-free measurements of a subspace of a fixed-dimension
//! parameter space, plus the projections, residuals and selection logic that
//! estimation algorithms need to compare them against predicted states.

// This file defines the public modules of the library.
pub mod geometry;
pub mod indices;
pub mod measurement;
pub mod prelude;
pub mod selector;
pub mod source_link;
pub mod subspace;
