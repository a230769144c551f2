//! Per-cell update coefficients (spec §3 "Coefficient tables").
//!
//! `c_e_self(i,j,k) = (2*eps - sigma*dt) / (2*eps + sigma*dt)`;
//! `c_e_ha/hb = 2*dt / ((2*eps + sigma*dt) * d)`, one divisor per tangential
//! axis. The magnetic analogue (`c_h_self`, `c_h_ea/eb`) is identical with
//! `mu`/`sigma_m` in place of `eps`/`sigma`. Grounded in `UpdateCoefficients`
//! (`cem-solver/src/fdtd/util.rs`, `src/fdtd/simulation.rs`), generalized
//! from a single scalar pair per cell to full per-component arrays sized to
//! each Yee shape.

use nalgebra::{
    Point3,
    Vector3,
};

use crate::{
    constants::PhysicalConstants,
    emf::{
        EComponent,
        HComponent,
    },
    grid::GridSpace,
    lattice::Lattice3,
    material::MaterialTable,
};

#[derive(Clone, Debug)]
pub struct ComponentCoeffs {
    /// Self-term coefficient (`ca`/`da` in Taflove's notation).
    pub self_: Lattice3<f64>,
    /// Coefficient scaling the curl term built from the "next"-axis
    /// tangential field component, already divided by that axis's cell size.
    pub a: Lattice3<f64>,
    /// Coefficient scaling the curl term built from the "previous"-axis
    /// tangential field component, already divided by that axis's cell size.
    pub b: Lattice3<f64>,
}

impl ComponentCoeffs {
    fn zeroed(shape: Vector3<usize>) -> Self {
        Self {
            self_: Lattice3::new(shape),
            a: Lattice3::new(shape),
            b: Lattice3::new(shape),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CoefficientTables {
    pub ex: ComponentCoeffs,
    pub ey: ComponentCoeffs,
    pub ez: ComponentCoeffs,
    pub hx: ComponentCoeffs,
    pub hy: ComponentCoeffs,
    pub hz: ComponentCoeffs,
}

impl CoefficientTables {
    pub fn new(local_size: Vector3<usize>) -> Self {
        Self {
            ex: ComponentCoeffs::zeroed(EComponent::Ex.shape(local_size)),
            ey: ComponentCoeffs::zeroed(EComponent::Ey.shape(local_size)),
            ez: ComponentCoeffs::zeroed(EComponent::Ez.shape(local_size)),
            hx: ComponentCoeffs::zeroed(HComponent::Hx.shape(local_size)),
            hy: ComponentCoeffs::zeroed(HComponent::Hy.shape(local_size)),
            hz: ComponentCoeffs::zeroed(HComponent::Hz.shape(local_size)),
        }
    }

    pub fn e(&self, component: EComponent) -> &ComponentCoeffs {
        match component {
            EComponent::Ex => &self.ex,
            EComponent::Ey => &self.ey,
            EComponent::Ez => &self.ez,
        }
    }

    pub fn e_mut(&mut self, component: EComponent) -> &mut ComponentCoeffs {
        match component {
            EComponent::Ex => &mut self.ex,
            EComponent::Ey => &mut self.ey,
            EComponent::Ez => &mut self.ez,
        }
    }

    pub fn h(&self, component: HComponent) -> &ComponentCoeffs {
        match component {
            HComponent::Hx => &self.hx,
            HComponent::Hy => &self.hy,
            HComponent::Hz => &self.hz,
        }
    }

    pub fn h_mut(&mut self, component: HComponent) -> &mut ComponentCoeffs {
        match component {
            HComponent::Hx => &mut self.hx,
            HComponent::Hy => &mut self.hy,
            HComponent::Hz => &mut self.hz,
        }
    }

    /// Fill every cell's coefficients from the material table (spec §4.5
    /// step 4, the "regular objects" pass). Boundaries, sources, and PEC
    /// planes correct these afterwards, in that fixed order (§9).
    pub fn fill_from_materials(
        &mut self,
        grid: &GridSpace,
        materials: &MaterialTable,
        dt: f64,
        physical_constants: &PhysicalConstants,
    ) {
        for component in EComponent::ALL {
            let (d_a, d_b) = tangential_cell_sizes(grid, component.axis());
            let coeffs = self.e_mut(component);
            for point in coeffs.self_.strider().iter() {
                let cell_point = clamp_to_cell_grid(point, grid.local_size);
                let material = materials.material_at(cell_point);
                let eps = material.relative_permittivity * physical_constants.vacuum_permittivity;
                let sigma = material.regularized_sigma_e();
                let (self_, scale) = self_and_scale(eps, sigma, dt);
                coeffs.self_[point] = self_;
                coeffs.a[point] = scale / d_a;
                coeffs.b[point] = scale / d_b;
            }
        }

        for component in HComponent::ALL {
            let (d_a, d_b) = tangential_cell_sizes(grid, component.axis());
            let coeffs = self.h_mut(component);
            for point in coeffs.self_.strider().iter() {
                let cell_point = clamp_to_cell_grid(point, grid.local_size);
                let material = materials.material_at(cell_point);
                let mu = material.relative_permeability * physical_constants.vacuum_permeability;
                let sigma_m = material.regularized_sigma_m();
                let (self_, scale) = self_and_scale(mu, sigma_m, dt);
                coeffs.self_[point] = self_;
                coeffs.a[point] = scale / d_a;
                coeffs.b[point] = scale / d_b;
            }
        }
    }
}

fn self_and_scale(perm: f64, sigma: f64, dt: f64) -> (f64, f64) {
    let self_ = (2.0 * perm - sigma * dt) / (2.0 * perm + sigma * dt);
    let scale = 2.0 * dt / (2.0 * perm + sigma * dt);
    (self_, scale)
}

/// Cell sizes along the two axes tangential to `axis`, in (next, prev) order
/// matching [`Axis::next`]/[`Axis::prev`].
pub fn tangential_cell_sizes(grid: &GridSpace, axis: crate::grid::Axis) -> (f64, f64) {
    (axis.next().component(&grid.cell_size), axis.prev().component(&grid.cell_size))
}

/// Arrays sized one larger than the local cell grid along tangential axes
/// hold boundary nodes past the last owned cell; material lookups clamp
/// those nodes back onto the last real cell.
fn clamp_to_cell_grid(point: Point3<usize>, local_size: Vector3<usize>) -> Point3<usize> {
    Point3::new(
        point.x.min(local_size.x.saturating_sub(1)),
        point.y.min(local_size.y.saturating_sub(1)),
        point.z.min(local_size.z.saturating_sub(1)),
    )
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;
    use crate::{
        constants::PhysicalConstants,
        grid::GridSpace,
        material::MaterialTable,
    };

    #[test]
    fn vacuum_self_coefficient_is_near_one() {
        let grid = GridSpace::new_single_process(Vector3::repeat(1e-3), Vector3::new(4, 4, 4)).unwrap();
        let materials = MaterialTable::new(grid.local_size);
        let mut coeffs = CoefficientTables::new(grid.local_size);
        coeffs.fill_from_materials(&grid, &materials, 1e-12, &PhysicalConstants::SI);
        let self_ = coeffs.ex.self_.as_slice()[0];
        assert!((self_ - 1.0).abs() < 1e-6, "self={self_}");
    }

    #[test]
    fn idempotent_init_produces_equal_coefficients() {
        let grid = GridSpace::new_single_process(Vector3::repeat(1e-3), Vector3::new(4, 4, 4)).unwrap();
        let materials = MaterialTable::new(grid.local_size);

        let mut a = CoefficientTables::new(grid.local_size);
        a.fill_from_materials(&grid, &materials, 1e-12, &PhysicalConstants::SI);
        let mut b = CoefficientTables::new(grid.local_size);
        b.fill_from_materials(&grid, &materials, 1e-12, &PhysicalConstants::SI);

        assert_eq!(a.ex.self_.as_slice(), b.ex.self_.as_slice());
        assert_eq!(a.hz.a.as_slice(), b.hz.a.as_slice());
    }
}
