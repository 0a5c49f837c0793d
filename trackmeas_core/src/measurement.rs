// trackmeas_core/src/measurement.rs

//! A measurement of a variable-size subspace of a full parameter space.
//!
//! The measurement intentionally does not hold a reference to the surface or
//! volume it was recorded on. The source link identifies the readout and,
//! through its geometry identifier, the detector element. Every consumer
//! (e.g. a Kalman filter following the propagator) already holds the element
//! before it looks up measurements, and the element's type would differ
//! between parameter flavors.
//!
//! Storage is inline and sized for the worst case (`N` values and `N * N`
//! covariance entries), so constructing, copying and moving a measurement
//! never touches the heap. Only the leading `size()` values and the leading
//! `size() x size()` covariance block are meaningful; all accessors go through
//! views bounded to that region.

use crate::indices::{BoundIndices, FreeIndices, ParameterIndices, BOUND_SIZE, FREE_SIZE};
use crate::source_link::{IndexSourceLink, SourceLink};
use crate::subspace::{check_subspace_indices, SubspaceError, VariableSubspaceHelper};
use nalgebra::storage::Storage;
use nalgebra::{
    Const, DMatrix, DVector, Dyn, Matrix, MatrixView, MatrixViewMut, SMatrix, SVector, U1,
};
use std::marker::PhantomData;
use thiserror::Error;

/// Filler used by [`BoundVariableMeasurement::bound_subspace_indices`] for unused slots.
pub const INVALID_SUBSPACE_INDEX: u8 = u8::MAX;

// --- View types over the inline storage ---
// The column stride is always the full dimension `N`, which is what lets the
// dynamic and the fixed-size views address the very same memory.
pub type ParametersView<'a, const N: usize> = MatrixView<'a, f64, Dyn, U1, U1, Const<N>>;
pub type ParametersViewMut<'a, const N: usize> = MatrixViewMut<'a, f64, Dyn, U1, U1, Const<N>>;
pub type CovarianceView<'a, const N: usize> = MatrixView<'a, f64, Dyn, Dyn, U1, Const<N>>;
pub type CovarianceViewMut<'a, const N: usize> = MatrixViewMut<'a, f64, Dyn, Dyn, U1, Const<N>>;
pub type FixedParametersView<'a, const D: usize, const N: usize> =
    MatrixView<'a, f64, Const<D>, U1, U1, Const<N>>;
pub type FixedParametersViewMut<'a, const D: usize, const N: usize> =
    MatrixViewMut<'a, f64, Const<D>, U1, U1, Const<N>>;
pub type FixedCovarianceView<'a, const D: usize, const N: usize> =
    MatrixView<'a, f64, Const<D>, Const<D>, U1, Const<N>>;
pub type FixedCovarianceViewMut<'a, const D: usize, const N: usize> =
    MatrixViewMut<'a, f64, Const<D>, Const<D>, U1, Const<N>>;

/// Errors of the runtime-shaped constructor. The compile-time shaped
/// constructor cannot fail.
#[derive(Debug, Error, PartialEq)]
pub enum MeasurementError {
    #[error("invalid subspace: {0}")]
    Subspace(#[from] SubspaceError),
    #[error("expected {expected} parameter values, got {actual}")]
    ParametersSize { expected: usize, actual: usize },
    #[error("expected a {expected}x{expected} covariance, got {rows}x{cols}")]
    CovarianceShape {
        expected: usize,
        rows: usize,
        cols: usize,
    },
}

/// A measurement of `size()` components of an `N`-dimensional parameter space.
///
/// `I` is the index enumeration (flavor) and fixes `N`; `S` is the opaque
/// identity of the readout that produced the measurement.
///
/// Subspace indices must be unique and listed in the same order as the
/// parameter and covariance data. Uniqueness is checked in debug builds only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableSizeMeasurement<I, const N: usize, S = IndexSourceLink> {
    source: S,
    subspace_indices: [u8; N],
    size: usize,
    params: SVector<f64, N>,
    cov: SMatrix<f64, N, N>,
    _flavor: PhantomData<I>,
}

impl<I, const N: usize, S> VariableSizeMeasurement<I, N, S>
where
    I: ParameterIndices<N>,
    S: SourceLink,
{
    /// Constructs a measurement from its source link, the measured indices and
    /// their values and covariance.
    ///
    /// The dimension `D` is shared by all three inputs, so a shape mismatch
    /// does not compile. `D` must lie in `1..=N`, which is also checked at
    /// compile time.
    pub fn new<const D: usize, SP, SC>(
        source: S,
        indices: [I; D],
        params: &Matrix<f64, Const<D>, U1, SP>,
        cov: &Matrix<f64, Const<D>, Const<D>, SC>,
    ) -> Self
    where
        SP: Storage<f64, Const<D>, U1>,
        SC: Storage<f64, Const<D>, Const<D>>,
    {
        const { assert!(D >= 1 && D <= N, "measurement dimension must be in 1..=N") };

        let mut subspace_indices = [0u8; N];
        for (slot, index) in subspace_indices.iter_mut().zip(indices) {
            *slot = index.index();
        }
        debug_assert!(
            check_subspace_indices(&subspace_indices[..D], N, N).is_ok(),
            "subspace indices must be unique: {:?}",
            &subspace_indices[..D]
        );

        let mut measurement = Self {
            source,
            subspace_indices,
            size: D,
            params: SVector::zeros(),
            cov: SMatrix::zeros(),
            _flavor: PhantomData,
        };
        measurement.fixed_parameters_mut::<D>().copy_from(params);
        measurement.fixed_covariance_mut::<D>().copy_from(cov);
        measurement
    }

    /// Constructs a measurement whose dimension is only known at runtime,
    /// e.g. from configuration.
    ///
    /// Unlike [`Self::new`], every shape and index check happens here and is
    /// reported as an error.
    pub fn try_from_dynamic<SP, SC>(
        source: S,
        indices: &[I],
        params: &Matrix<f64, Dyn, U1, SP>,
        cov: &Matrix<f64, Dyn, Dyn, SC>,
    ) -> Result<Self, MeasurementError>
    where
        SP: Storage<f64, Dyn, U1>,
        SC: Storage<f64, Dyn, Dyn>,
    {
        let size = indices.len();
        if size > N {
            return Err(SubspaceError::TooLarge { size, capacity: N }.into());
        }

        let mut subspace_indices = [0u8; N];
        for (slot, index) in subspace_indices.iter_mut().zip(indices) {
            *slot = index.index();
        }
        check_subspace_indices(&subspace_indices[..size], N, N)?;

        if params.nrows() != size {
            return Err(MeasurementError::ParametersSize {
                expected: size,
                actual: params.nrows(),
            });
        }
        if cov.shape() != (size, size) {
            return Err(MeasurementError::CovarianceShape {
                expected: size,
                rows: cov.nrows(),
                cols: cov.ncols(),
            });
        }

        let mut measurement = Self {
            source,
            subspace_indices,
            size,
            params: SVector::zeros(),
            cov: SMatrix::zeros(),
            _flavor: PhantomData,
        };
        measurement.parameters_mut().copy_from(params);
        measurement.covariance_mut().copy_from(cov);
        Ok(measurement)
    }

    /// Source link that connects to the underlying detector readout.
    pub fn source_link(&self) -> &S {
        &self.source
    }

    /// Number of measured components.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Dimension of the full parameter space.
    pub const fn full_size(&self) -> usize {
        N
    }

    /// Check if a specific parameter is part of this measurement.
    pub fn contains(&self, index: I) -> bool {
        self.subspace_indices().contains(&index.index())
    }

    /// Local slot of `index`, or `None` if it is not measured.
    pub fn try_index_of(&self, index: I) -> Option<usize> {
        let raw = index.index();
        self.subspace_indices().iter().position(|&i| i == raw)
    }

    /// Local slot of `index`.
    ///
    /// # Panics
    /// Panics if `index` is not part of this measurement. Callers must check
    /// [`Self::contains`] first.
    pub fn index_of(&self, index: I) -> usize {
        match self.try_index_of(index) {
            Some(slot) => slot,
            None => panic!("{index:?} is not part of this measurement"),
        }
    }

    /// The measured full-space indices, in slot order.
    pub fn subspace_indices(&self) -> &[u8] {
        &self.subspace_indices[..self.size]
    }

    /// The measured indices as the flavor's enumeration.
    pub fn indices(&self) -> impl Iterator<Item = I> + '_ {
        self.subspace_indices()
            .iter()
            .filter_map(|&index| I::from_index(index))
    }

    pub fn fixed_subspace_indices<const D: usize>(&self) -> [u8; D] {
        self.check_fixed_size::<D>();
        let mut indices = [0u8; D];
        indices.copy_from_slice(&self.subspace_indices[..D]);
        indices
    }

    // --- Dynamic-size views ---

    pub fn parameters(&self) -> ParametersView<'_, N> {
        self.params.rows(0, self.size)
    }

    pub fn parameters_mut(&mut self) -> ParametersViewMut<'_, N> {
        self.params.rows_mut(0, self.size)
    }

    pub fn covariance(&self) -> CovarianceView<'_, N> {
        self.cov.view((0, 0), (self.size, self.size))
    }

    pub fn covariance_mut(&mut self) -> CovarianceViewMut<'_, N> {
        self.cov.view_mut((0, 0), (self.size, self.size))
    }

    // --- Fixed-size views ---
    // `D` must equal `size()`. This is a debug assertion; `D <= N` is checked
    // at compile time, so a wrong `D` in release builds reads the wrong slots
    // but never out of bounds.

    pub fn fixed_parameters<const D: usize>(&self) -> FixedParametersView<'_, D, N> {
        self.check_fixed_size::<D>();
        self.params.fixed_rows::<D>(0)
    }

    pub fn fixed_parameters_mut<const D: usize>(&mut self) -> FixedParametersViewMut<'_, D, N> {
        self.check_fixed_size::<D>();
        self.params.fixed_rows_mut::<D>(0)
    }

    pub fn fixed_covariance<const D: usize>(&self) -> FixedCovarianceView<'_, D, N> {
        self.check_fixed_size::<D>();
        self.cov.fixed_view::<D, D>(0, 0)
    }

    pub fn fixed_covariance_mut<const D: usize>(&mut self) -> FixedCovarianceViewMut<'_, D, N> {
        self.check_fixed_size::<D>();
        self.cov.fixed_view_mut::<D, D>(0, 0)
    }

    #[inline]
    fn check_fixed_size<const D: usize>(&self) {
        const { assert!(D <= N, "fixed view larger than the full parameter space") };
        debug_assert_eq!(D, self.size, "fixed view dimension does not match measurement size");
    }

    // --- Full-space projection ---

    /// The measured values scattered into a zero-padded full-space vector.
    pub fn full_parameters(&self) -> SVector<f64, N> {
        let mut full = SVector::zeros();
        for (slot, &index) in self.subspace_indices().iter().enumerate() {
            full[index as usize] = self.params[slot];
        }
        full
    }

    /// The measured covariance scattered on both axes into a zero-padded
    /// full-space matrix. Cross terms with unmeasured components are zero.
    pub fn full_covariance(&self) -> SMatrix<f64, N, N> {
        let mut full = SMatrix::zeros();
        for (i, &row) in self.subspace_indices().iter().enumerate() {
            for (j, &col) in self.subspace_indices().iter().enumerate() {
                full[(row as usize, col as usize)] = self.cov[(i, j)];
            }
        }
        full
    }

    pub fn subspace_helper(&self) -> VariableSubspaceHelper<N> {
        VariableSubspaceHelper::from_raw(self.subspace_indices, self.size)
    }

    /// The `size() x N` projection matrix `H`.
    pub fn projector(&self) -> DMatrix<f64> {
        self.subspace_helper().projector()
    }

    /// The `N x size()` expansion matrix `H^T`.
    pub fn expander(&self) -> DMatrix<f64> {
        self.subspace_helper().expander()
    }

    // --- Residuals ---

    /// Measured minus predicted, per measured component, using the flavor's
    /// residual rule (e.g. wrapped phi for bound parameters).
    pub fn residuals<SF>(&self, predicted: &Matrix<f64, Const<N>, U1, SF>) -> DVector<f64>
    where
        SF: Storage<f64, Const<N>, U1>,
    {
        DVector::from_fn(self.size, |slot, _| self.residual_at(slot, predicted))
    }

    pub fn fixed_residuals<const D: usize, SF>(
        &self,
        predicted: &Matrix<f64, Const<N>, U1, SF>,
    ) -> SVector<f64, D>
    where
        SF: Storage<f64, Const<N>, U1>,
    {
        self.check_fixed_size::<D>();
        SVector::from_fn(|slot, _| self.residual_at(slot, predicted))
    }

    fn residual_at<SF>(&self, slot: usize, predicted: &Matrix<f64, Const<N>, U1, SF>) -> f64
    where
        SF: Storage<f64, Const<N>, U1>,
    {
        let full_index = self.subspace_indices[slot];
        let measured = self.params[slot];
        let reference = predicted[full_index as usize];
        match I::from_index(full_index) {
            Some(index) => index.residual(measured, reference),
            None => measured - reference,
        }
    }
}

/// Measurement that can hold every combination of bound parameters.
pub type BoundVariableMeasurement<S = IndexSourceLink> =
    VariableSizeMeasurement<BoundIndices, BOUND_SIZE, S>;

/// Measurement that can hold every combination of free parameters.
pub type FreeVariableMeasurement<S = IndexSourceLink> =
    VariableSizeMeasurement<FreeIndices, FREE_SIZE, S>;

pub type Measurement = BoundVariableMeasurement;

/// Container of measurements for one event.
///
/// Measurements are not orderable and no order is implied by the container.
/// Sort or look up by source link if an order is needed.
pub type MeasurementContainer = Vec<Measurement>;

impl<S: SourceLink> BoundVariableMeasurement<S> {
    /// The subspace indices padded to the full bound size with
    /// [`INVALID_SUBSPACE_INDEX`].
    pub fn bound_subspace_indices(&self) -> [u8; BOUND_SIZE] {
        let mut indices = [INVALID_SUBSPACE_INDEX; BOUND_SIZE];
        indices[..self.size].copy_from_slice(self.subspace_indices());
        indices
    }
}

/// Constructs a measurement with the indices given last, so call sites read
/// like "values, covariance, which parameters".
///
/// See also [`make_measurement!`](crate::make_measurement) for a variadic form.
pub fn make_measurement<I, const N: usize, S, const D: usize, SP, SC>(
    source: S,
    params: &Matrix<f64, Const<D>, U1, SP>,
    cov: &Matrix<f64, Const<D>, Const<D>, SC>,
    indices: [I; D],
) -> VariableSizeMeasurement<I, N, S>
where
    I: ParameterIndices<N>,
    S: SourceLink,
    SP: Storage<f64, Const<D>, U1>,
    SC: Storage<f64, Const<D>, Const<D>>,
{
    VariableSizeMeasurement::new(source, indices, params, cov)
}

/// Builds a measurement from a plain list of indices.
///
/// At least one index is required by the macro grammar; the number of indices
/// must match the parameter and covariance dimensions at compile time.
///
/// ```
/// use nalgebra::{Matrix2, Vector2};
/// use trackmeas_core::prelude::*;
///
/// let source = IndexSourceLink::new(GeometryIdentifier::new(1, 2, 3), 0);
/// let m: Measurement = make_measurement!(
///     source,
///     Vector2::new(3.0, -2.0),
///     Matrix2::new(1.0, 0.0, 0.0, 4.0);
///     BoundIndices::Loc1, BoundIndices::QOverP
/// );
/// assert_eq!(m.size(), 2);
/// ```
#[macro_export]
macro_rules! make_measurement {
    ($source:expr, $params:expr, $cov:expr; $index0:expr $(, $index:expr)* $(,)?) => {
        $crate::measurement::make_measurement($source, &$params, &$cov, [$index0 $(, $index)*])
    };
}
