// trackmeas_core/src/indices.rs

//! Parameter-space "flavors".
//!
//! An index enumeration names every position of a full parameter space. The
//! const generic `N` of [`ParameterIndices`] is the full dimension, so a
//! flavor fixes its size at the type level and measurements of different
//! flavors are distinct types rather than a runtime tag.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt::Debug;

/// Dimension of the bound (surface-local) parameter space.
pub const BOUND_SIZE: usize = 6;
/// Dimension of the free (global) parameter space.
pub const FREE_SIZE: usize = 8;

/// The contract every index enumeration fulfils.
///
/// Implementors must be a bijection between `Self` and `0..N`, i.e.
/// `from_index(x.index()) == Some(x)` for every variant and `ALL[i].index() == i`.
pub trait ParameterIndices<const N: usize>: Copy + Eq + Debug + Send + Sync + 'static {
    /// Every index of the space in ascending order.
    const ALL: [Self; N];

    /// Position of this index in the full parameter space.
    fn index(self) -> u8;

    /// Inverse of [`ParameterIndices::index`]. Returns `None` outside `0..N`.
    fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Difference `measured - reference` for this component.
    ///
    /// The default is the plain difference; cyclic components override it.
    fn residual(self, measured: f64, reference: f64) -> f64 {
        measured - reference
    }
}

/// Components of the bound track parametrization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundIndices {
    /// First local coordinate on the reference surface.
    Loc0 = 0,
    /// Second local coordinate on the reference surface.
    Loc1 = 1,
    /// Azimuthal direction angle, cyclic in `[-pi, pi)`.
    Phi = 2,
    /// Polar direction angle in `[0, pi]`.
    Theta = 3,
    /// Charge over momentum.
    QOverP = 4,
    /// Time coordinate.
    Time = 5,
}

impl ParameterIndices<BOUND_SIZE> for BoundIndices {
    const ALL: [Self; BOUND_SIZE] = [
        BoundIndices::Loc0,
        BoundIndices::Loc1,
        BoundIndices::Phi,
        BoundIndices::Theta,
        BoundIndices::QOverP,
        BoundIndices::Time,
    ];

    fn index(self) -> u8 {
        self as u8
    }

    fn residual(self, measured: f64, reference: f64) -> f64 {
        match self {
            BoundIndices::Phi => wrap_phi(measured - reference),
            _ => measured - reference,
        }
    }
}

/// Components of the free (global) track parametrization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeIndices {
    /// Global x position.
    Pos0 = 0,
    /// Global y position.
    Pos1 = 1,
    /// Global z position.
    Pos2 = 2,
    /// Time coordinate.
    Time = 3,
    /// x component of the unit direction.
    Dir0 = 4,
    /// y component of the unit direction.
    Dir1 = 5,
    /// z component of the unit direction.
    Dir2 = 6,
    /// Charge over momentum.
    QOverP = 7,
}

impl ParameterIndices<FREE_SIZE> for FreeIndices {
    const ALL: [Self; FREE_SIZE] = [
        FreeIndices::Pos0,
        FreeIndices::Pos1,
        FreeIndices::Pos2,
        FreeIndices::Time,
        FreeIndices::Dir0,
        FreeIndices::Dir1,
        FreeIndices::Dir2,
        FreeIndices::QOverP,
    ];

    fn index(self) -> u8 {
        self as u8
    }
}

/// Wraps an angle difference into `[-pi, pi)`.
pub fn wrap_phi(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const EPSILON: f64 = 1e-12;

    fn assert_bijection<I: ParameterIndices<N>, const N: usize>() {
        for (position, index) in I::ALL.iter().enumerate() {
            assert_eq!(index.index() as usize, position);
            assert_eq!(I::from_index(position as u8), Some(*index));
        }
        assert_eq!(I::from_index(N as u8), None);
    }

    #[test]
    fn test_bound_indices_are_a_bijection() {
        assert_bijection::<BoundIndices, BOUND_SIZE>();
    }

    #[test]
    fn test_free_indices_are_a_bijection() {
        assert_bijection::<FreeIndices, FREE_SIZE>();
    }

    #[test]
    fn test_phi_residual_wraps_across_the_boundary() {
        let residual = BoundIndices::Phi.residual(PI - 0.1, -PI + 0.1);
        assert_abs_diff_eq!(residual, -0.2, epsilon = EPSILON);

        let residual = BoundIndices::Phi.residual(-PI + 0.1, PI - 0.1);
        assert_abs_diff_eq!(residual, 0.2, epsilon = EPSILON);
    }

    #[test]
    fn test_non_cyclic_residual_is_plain_difference() {
        assert_abs_diff_eq!(BoundIndices::Loc0.residual(10.0, 3.5), 6.5, epsilon = EPSILON);
        assert_abs_diff_eq!(BoundIndices::Theta.residual(3.0, -3.0), 6.0, epsilon = EPSILON);
        assert_abs_diff_eq!(FreeIndices::Dir0.residual(4.0, 1.0), 3.0, epsilon = EPSILON);
    }

    #[test]
    fn test_wrap_phi_range() {
        assert_abs_diff_eq!(wrap_phi(0.0), 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(wrap_phi(2.0 * PI + 0.5), 0.5, epsilon = EPSILON);
        assert_abs_diff_eq!(wrap_phi(-2.0 * PI - 0.5), -0.5, epsilon = EPSILON);
        assert_abs_diff_eq!(wrap_phi(-0.5), -0.5, epsilon = EPSILON);
    }
}
