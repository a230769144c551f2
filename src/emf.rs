//! EMF storage: the six Yee-staggered field arrays (spec §3 "Yee
//! staggering"). Roughly 3% of the system per spec §2.

use nalgebra::Vector3;
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    grid::Axis,
    lattice::Lattice3,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EComponent {
    Ex,
    Ey,
    Ez,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HComponent {
    Hx,
    Hy,
    Hz,
}

impl EComponent {
    pub const ALL: [EComponent; 3] = [EComponent::Ex, EComponent::Ey, EComponent::Ez];

    pub fn axis(&self) -> Axis {
        match self {
            EComponent::Ex => Axis::X,
            EComponent::Ey => Axis::Y,
            EComponent::Ez => Axis::Z,
        }
    }

    /// Shape of this component's array given the local cell-count `(Nx, Ny, Nz)`.
    pub fn shape(&self, n: Vector3<usize>) -> Vector3<usize> {
        match self {
            EComponent::Ex => Vector3::new(n.x, n.y + 1, n.z + 1),
            EComponent::Ey => Vector3::new(n.x + 1, n.y, n.z + 1),
            EComponent::Ez => Vector3::new(n.x + 1, n.y + 1, n.z),
        }
    }

    /// The two H components tangential to this E component's curl, ordered
    /// `(H at this axis's previous axis, H at this axis's next axis)` so
    /// that pairing the first with a derivative along `axis.next()` and the
    /// second with a derivative along `axis.prev()` reproduces
    /// `curl_x = dHz/dy - dHy/dz` (and its cyclic permutations) rather than
    /// its negation.
    pub fn tangential_h(&self) -> (HComponent, HComponent) {
        match self {
            EComponent::Ex => (HComponent::Hz, HComponent::Hy),
            EComponent::Ey => (HComponent::Hx, HComponent::Hz),
            EComponent::Ez => (HComponent::Hy, HComponent::Hx),
        }
    }
}

impl HComponent {
    pub const ALL: [HComponent; 3] = [HComponent::Hx, HComponent::Hy, HComponent::Hz];

    pub fn axis(&self) -> Axis {
        match self {
            HComponent::Hx => Axis::X,
            HComponent::Hy => Axis::Y,
            HComponent::Hz => Axis::Z,
        }
    }

    pub fn shape(&self, n: Vector3<usize>) -> Vector3<usize> {
        match self {
            HComponent::Hx => Vector3::new(n.x + 1, n.y, n.z),
            HComponent::Hy => Vector3::new(n.x, n.y + 1, n.z),
            HComponent::Hz => Vector3::new(n.x, n.y, n.z + 1),
        }
    }

    /// Same ordering convention as [`EComponent::tangential_h`]: `(E at the
    /// previous axis, E at the next axis)`.
    pub fn tangential_e(&self) -> (EComponent, EComponent) {
        match self {
            HComponent::Hx => (EComponent::Ez, EComponent::Ey),
            HComponent::Hy => (EComponent::Ex, EComponent::Ez),
            HComponent::Hz => (EComponent::Ey, EComponent::Ex),
        }
    }
}

/// The six field arrays, sized per the Yee convention.
#[derive(Clone, Debug)]
pub struct Emf {
    pub ex: Lattice3<f64>,
    pub ey: Lattice3<f64>,
    pub ez: Lattice3<f64>,
    pub hx: Lattice3<f64>,
    pub hy: Lattice3<f64>,
    pub hz: Lattice3<f64>,
}

impl Emf {
    pub fn new(local_size: Vector3<usize>) -> Self {
        Self {
            ex: Lattice3::new(EComponent::Ex.shape(local_size)),
            ey: Lattice3::new(EComponent::Ey.shape(local_size)),
            ez: Lattice3::new(EComponent::Ez.shape(local_size)),
            hx: Lattice3::new(HComponent::Hx.shape(local_size)),
            hy: Lattice3::new(HComponent::Hy.shape(local_size)),
            hz: Lattice3::new(HComponent::Hz.shape(local_size)),
        }
    }

    pub fn e(&self, component: EComponent) -> &Lattice3<f64> {
        match component {
            EComponent::Ex => &self.ex,
            EComponent::Ey => &self.ey,
            EComponent::Ez => &self.ez,
        }
    }

    pub fn e_mut(&mut self, component: EComponent) -> &mut Lattice3<f64> {
        match component {
            EComponent::Ex => &mut self.ex,
            EComponent::Ey => &mut self.ey,
            EComponent::Ez => &mut self.ez,
        }
    }

    pub fn h(&self, component: HComponent) -> &Lattice3<f64> {
        match component {
            HComponent::Hx => &self.hx,
            HComponent::Hy => &self.hy,
            HComponent::Hz => &self.hz,
        }
    }

    pub fn h_mut(&mut self, component: HComponent) -> &mut Lattice3<f64> {
        match component {
            HComponent::Hx => &mut self.hx,
            HComponent::Hy => &mut self.hy,
            HComponent::Hz => &mut self.hz,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.ex.size() - Vector3::new(0, 1, 1));
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use super::*;

    #[test]
    fn shapes_follow_yee_convention() {
        let n = Vector3::new(4, 5, 6);
        assert_eq!(EComponent::Ex.shape(n), Vector3::new(4, 6, 7));
        assert_eq!(EComponent::Ey.shape(n), Vector3::new(5, 5, 7));
        assert_eq!(EComponent::Ez.shape(n), Vector3::new(5, 6, 6));
        assert_eq!(HComponent::Hx.shape(n), Vector3::new(5, 5, 6));
        assert_eq!(HComponent::Hy.shape(n), Vector3::new(4, 6, 6));
        assert_eq!(HComponent::Hz.shape(n), Vector3::new(4, 5, 7));
    }

    #[test]
    fn emf_allocates_all_six_arrays() {
        let emf = Emf::new(Vector3::new(2, 2, 2));
        assert!(emf.ex.get(&Point3::new(1, 2, 2)).is_some());
        assert!(emf.hz.get(&Point3::new(1, 1, 2)).is_some());
    }
}
