// trackmeas_core/src/subspace.rs

//! Projection between a full parameter space and a measured subspace.
//!
//! A subspace is an ordered list of full-space indices. Projecting gathers
//! those components (`H * v`, `H * M * H^T`), expanding scatters compact
//! values back into a zero-padded full-space object (`H^T * v`, `H^T * M * H`).
//! Both are done by index gather/scatter; the dense projector is only built
//! when explicitly requested.

use nalgebra::storage::Storage;
use nalgebra::{Const, DMatrix, DVector, Dyn, Matrix, SMatrix, SVector, U1};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubspaceError {
    #[error("a subspace must contain at least one index")]
    Empty,
    #[error("subspace of size {size} exceeds the capacity {capacity}")]
    TooLarge { size: usize, capacity: usize },
    #[error("subspace index {index} is outside the full space of size {full_size}")]
    OutOfRange { index: u8, full_size: usize },
    #[error("subspace index {0} appears more than once")]
    Duplicate(u8),
}

/// Checks that `indices` describe a valid subspace of a `full_size` space
/// holding at most `max_size` components.
pub fn check_subspace_indices(
    indices: &[u8],
    full_size: usize,
    max_size: usize,
) -> Result<(), SubspaceError> {
    if indices.is_empty() {
        return Err(SubspaceError::Empty);
    }
    if indices.len() > max_size {
        return Err(SubspaceError::TooLarge {
            size: indices.len(),
            capacity: max_size,
        });
    }
    for (position, &index) in indices.iter().enumerate() {
        if index as usize >= full_size {
            return Err(SubspaceError::OutOfRange { index, full_size });
        }
        if indices[..position].contains(&index) {
            return Err(SubspaceError::Duplicate(index));
        }
    }
    Ok(())
}

/// Subspace helper whose dimension `D` is known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSubspaceHelper<const D: usize, const N: usize> {
    indices: [u8; D],
}

impl<const D: usize, const N: usize> FixedSubspaceHelper<D, N> {
    pub fn new(indices: [u8; D]) -> Result<Self, SubspaceError> {
        check_subspace_indices(&indices, N, N)?;
        Ok(Self { indices })
    }

    /// Wraps indices already known to be valid.
    pub(crate) fn from_raw(indices: [u8; D]) -> Self {
        debug_assert!(check_subspace_indices(&indices, N, N).is_ok());
        Self { indices }
    }

    pub fn indices(&self) -> &[u8; D] {
        &self.indices
    }

    pub fn project_vector<S>(&self, full: &Matrix<f64, Const<N>, U1, S>) -> SVector<f64, D>
    where
        S: Storage<f64, Const<N>, U1>,
    {
        SVector::from_fn(|i, _| full[self.indices[i] as usize])
    }

    pub fn project_matrix<S>(&self, full: &Matrix<f64, Const<N>, Const<N>, S>) -> SMatrix<f64, D, D>
    where
        S: Storage<f64, Const<N>, Const<N>>,
    {
        SMatrix::from_fn(|i, j| {
            full[(self.indices[i] as usize, self.indices[j] as usize)]
        })
    }

    pub fn expand_vector<S>(&self, compact: &Matrix<f64, Const<D>, U1, S>) -> SVector<f64, N>
    where
        S: Storage<f64, Const<D>, U1>,
    {
        let mut full = SVector::zeros();
        for (i, &index) in self.indices.iter().enumerate() {
            full[index as usize] = compact[i];
        }
        full
    }

    pub fn expand_matrix<S>(&self, compact: &Matrix<f64, Const<D>, Const<D>, S>) -> SMatrix<f64, N, N>
    where
        S: Storage<f64, Const<D>, Const<D>>,
    {
        let mut full = SMatrix::zeros();
        for (i, &row) in self.indices.iter().enumerate() {
            for (j, &col) in self.indices.iter().enumerate() {
                full[(row as usize, col as usize)] = compact[(i, j)];
            }
        }
        full
    }

    /// The dense `D x N` projection matrix `H`.
    pub fn projector(&self) -> SMatrix<f64, D, N> {
        let mut projector = SMatrix::zeros();
        for (i, &index) in self.indices.iter().enumerate() {
            projector[(i, index as usize)] = 1.0;
        }
        projector
    }

    /// The dense `N x D` expansion matrix `H^T`.
    pub fn expander(&self) -> SMatrix<f64, N, D> {
        self.projector().transpose()
    }
}

/// Subspace helper whose dimension is only known at runtime.
///
/// Holds its indices inline, so creating one never allocates. Results of
/// projections are dynamically sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableSubspaceHelper<const N: usize> {
    indices: [u8; N],
    len: usize,
}

impl<const N: usize> VariableSubspaceHelper<N> {
    pub fn new(indices: &[u8]) -> Result<Self, SubspaceError> {
        check_subspace_indices(indices, N, N)?;
        let mut storage = [0u8; N];
        storage[..indices.len()].copy_from_slice(indices);
        Ok(Self {
            indices: storage,
            len: indices.len(),
        })
    }

    /// Wraps indices already known to be valid.
    pub(crate) fn from_raw(indices: [u8; N], len: usize) -> Self {
        debug_assert!(check_subspace_indices(&indices[..len], N, N).is_ok());
        Self { indices, len }
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices[..self.len]
    }

    pub fn size(&self) -> usize {
        self.len
    }

    pub fn project_vector<S>(&self, full: &Matrix<f64, Const<N>, U1, S>) -> DVector<f64>
    where
        S: Storage<f64, Const<N>, U1>,
    {
        let indices = self.indices();
        DVector::from_fn(self.len, |i, _| full[indices[i] as usize])
    }

    pub fn project_matrix<S>(&self, full: &Matrix<f64, Const<N>, Const<N>, S>) -> DMatrix<f64>
    where
        S: Storage<f64, Const<N>, Const<N>>,
    {
        let indices = self.indices();
        DMatrix::from_fn(self.len, self.len, |i, j| {
            full[(indices[i] as usize, indices[j] as usize)]
        })
    }

    /// # Panics
    /// Panics if `compact` does not have exactly `size()` rows.
    pub fn expand_vector<S>(&self, compact: &Matrix<f64, Dyn, U1, S>) -> SVector<f64, N>
    where
        S: Storage<f64, Dyn, U1>,
    {
        assert_eq!(compact.nrows(), self.len, "compact vector size mismatch");
        let mut full = SVector::zeros();
        for (i, &index) in self.indices().iter().enumerate() {
            full[index as usize] = compact[i];
        }
        full
    }

    /// # Panics
    /// Panics if `compact` is not `size() x size()`.
    pub fn expand_matrix<S>(&self, compact: &Matrix<f64, Dyn, Dyn, S>) -> SMatrix<f64, N, N>
    where
        S: Storage<f64, Dyn, Dyn>,
    {
        assert_eq!(compact.shape(), (self.len, self.len), "compact matrix shape mismatch");
        let mut full = SMatrix::zeros();
        for (i, &row) in self.indices().iter().enumerate() {
            for (j, &col) in self.indices().iter().enumerate() {
                full[(row as usize, col as usize)] = compact[(i, j)];
            }
        }
        full
    }

    /// The dense `size x N` projection matrix `H`.
    pub fn projector(&self) -> DMatrix<f64> {
        let mut projector = DMatrix::zeros(self.len, N);
        for (i, &index) in self.indices().iter().enumerate() {
            projector[(i, index as usize)] = 1.0;
        }
        projector
    }

    /// The dense `N x size` expansion matrix `H^T`.
    pub fn expander(&self) -> DMatrix<f64> {
        self.projector().transpose()
    }
}
