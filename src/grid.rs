//! Uniform rectilinear coordinate mesh (spec §3 "Grid").
//!
//! Carries cell sizes, the global box, and a sub-box view after
//! decomposition. Grounded in `src/lattice.rs` / `src/boundary_condition.rs`
//! (`Axis`, vector-component helpers) and `cem-solver/src/fdtd/strider.rs`
//! (shape/stride bookkeeping).

use nalgebra::{
    Point3,
    Scalar,
    UnitVector3,
    Vector3,
};
use num::{
    One,
    Zero,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::error::{
    FdtdError,
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn component<T: Scalar>(&self, vector: &Vector3<T>) -> T {
        vector[self.index()].clone()
    }

    pub fn component_mut<'a, T>(&self, vector: &'a mut Vector3<T>) -> &'a mut T {
        &mut vector[self.index()]
    }

    pub fn next(&self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }

    pub fn prev(&self) -> Axis {
        match self {
            Axis::X => Axis::Z,
            Axis::Y => Axis::X,
            Axis::Z => Axis::Y,
        }
    }

    pub fn basis<T>(&self) -> UnitVector3<T>
    where
        T: Scalar + Zero + One,
    {
        let mut e = Vector3::<T>::zeros();
        *self.component_mut(&mut e) = T::one();
        UnitVector3::new_unchecked(e)
    }
}

/// Which face of the global box a boundary condition (e.g. PML) sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub axis: Axis,
    /// `true` => the low-index (negative) face, `false` => the high-index
    /// (positive) face.
    pub negative: bool,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face { axis: Axis::X, negative: true },
        Face { axis: Axis::X, negative: false },
        Face { axis: Axis::Y, negative: true },
        Face { axis: Axis::Y, negative: false },
        Face { axis: Axis::Z, negative: true },
        Face { axis: Axis::Z, negative: false },
    ];
}

/// Dimensionality the solver was configured for, per spec §4.1 "Variants".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimensionality {
    ThreeD,
    TwoDTe,
    OneDTem,
}

impl Dimensionality {
    pub fn as_u8(&self) -> u8 {
        match self {
            Dimensionality::ThreeD => 3,
            Dimensionality::TwoDTe => 2,
            Dimensionality::OneDTem => 1,
        }
    }
}

/// The global box `G = [0, Nx) x [0, Ny) x [0, Nz)` of cubic cells with
/// uniform sizes `(dx, dy, dz)`, plus (after decomposition) the local
/// sub-box a process owns, widened by a one-cell halo on internal faces.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridSpace {
    pub cell_size: Vector3<f64>,
    /// Number of cells along each axis, global.
    pub global_size: Vector3<usize>,
    /// Origin (in global cell indices) of this process's local sub-box.
    pub local_origin: Point3<usize>,
    /// Number of cells along each axis, local (including halo).
    pub local_size: Vector3<usize>,
    pub dimensionality: Dimensionality,
}

impl GridSpace {
    pub fn new_single_process(cell_size: Vector3<f64>, global_size: Vector3<usize>) -> Result<Self> {
        for axis in Axis::ALL {
            let value = axis.component(&cell_size);
            if value <= 0.0 {
                return Err(FdtdError::NonPositiveCellSize { axis, value });
            }
        }

        let dimensionality = Self::infer_dimensionality(&global_size);

        Ok(Self {
            cell_size,
            global_size,
            local_origin: Point3::origin(),
            local_size: global_size,
            dimensionality,
        })
    }

    fn infer_dimensionality(global_size: &Vector3<usize>) -> Dimensionality {
        let unit_axes = global_size.iter().filter(|&&n| n <= 1).count();
        match unit_axes {
            0 => Dimensionality::ThreeD,
            1 => Dimensionality::TwoDTe,
            _ => Dimensionality::OneDTem,
        }
    }

    pub fn dt_max(&self, speed_of_light: f64) -> f64 {
        let sum_inv_sq: f64 = Axis::ALL
            .iter()
            .map(|axis| 1.0 / axis.component(&self.cell_size).powi(2))
            .sum();
        1.0 / (speed_of_light * sum_inv_sq.sqrt())
    }

    /// True if `(i, j, k)` (in local indices) is on the global boundary of
    /// `face`.
    pub fn owns_global_face(&self, face: Face) -> bool {
        if face.negative {
            face.axis.component(&self.local_origin) == 0
        }
        else {
            let local_end = face.axis.component(&self.local_origin)
                + face.axis.component(&self.local_size);
            local_end == face.axis.component(&self.global_size)
        }
    }

    /// Convert a local grid coordinate to a physical position at the Yee
    /// E-node offset for `component` (0 => x, i.e. Ex at (i+1/2, j, k), etc).
    pub fn physical_position(&self, point: Point3<usize>, half_offset: Vector3<f64>) -> Point3<f64> {
        let global = point.coords + self.local_origin.coords;
        Point3::from(global.cast::<f64>().zip_map(&half_offset, |g, h| g + h))
            .coords
            .component_mul(&self.cell_size)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_cell_size() {
        let err = GridSpace::new_single_process(Vector3::new(0.0, 1.0, 1.0), Vector3::new(4, 4, 4));
        assert!(matches!(err, Err(FdtdError::NonPositiveCellSize { .. })));
    }

    #[test]
    fn infers_dimensionality() {
        let grid =
            GridSpace::new_single_process(Vector3::repeat(1e-3), Vector3::new(10, 10, 10)).unwrap();
        assert_eq!(grid.dimensionality, Dimensionality::ThreeD);

        let grid =
            GridSpace::new_single_process(Vector3::repeat(1e-3), Vector3::new(10, 10, 1)).unwrap();
        assert_eq!(grid.dimensionality, Dimensionality::TwoDTe);

        let grid =
            GridSpace::new_single_process(Vector3::repeat(1e-3), Vector3::new(10, 1, 1)).unwrap();
        assert_eq!(grid.dimensionality, Dimensionality::OneDTem);
    }

    #[test]
    fn dt_max_matches_courant_formula() {
        let grid =
            GridSpace::new_single_process(Vector3::repeat(1.0), Vector3::new(4, 4, 4)).unwrap();
        let c = 1.0;
        let expected = 1.0 / (c * 3.0f64.sqrt());
        assert!((grid.dt_max(c) - expected).abs() < 1e-12);
    }
}
