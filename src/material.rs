//! Material properties and the per-cell material index grid (spec §3, §4.1).
//!
//! The plain `Material` struct is grounded in
//! `fdtd-app/src/physics/material.rs`; the dispersive descriptors are
//! supplemented from `src/material/{debye,drude,lorentz}_medium.cpp`, which
//! name only "per-material a, b, k, β (Debye/Drude) or α, ξ, γ (Lorentz)
//! coefficients" in the abstract.

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    constants::{
        PEC_SIGMA,
        SIGMA_FLOOR,
    },
    lattice::Lattice3,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Material {
    /// mu_r
    pub relative_permeability: f64,
    /// sigma_m
    pub magnetic_conductivity: f64,
    /// epsilon_r
    pub relative_permittivity: f64,
    /// sigma
    pub electrical_conductivity: f64,
    pub dispersion: Option<DispersiveModel>,
}

impl Material {
    pub const VACUUM: Self = Self {
        relative_permeability: 1.0,
        magnetic_conductivity: 0.0,
        relative_permittivity: 1.0,
        electrical_conductivity: 0.0,
        dispersion: None,
    };

    pub const PEC: Self = Self {
        relative_permeability: 1.0,
        magnetic_conductivity: 0.0,
        relative_permittivity: 1.0,
        electrical_conductivity: PEC_SIGMA,
        dispersion: None,
    };

    pub const PMC: Self = Self {
        relative_permeability: 1.0,
        magnetic_conductivity: PEC_SIGMA,
        relative_permittivity: 1.0,
        electrical_conductivity: 0.0,
        dispersion: None,
    };

    /// Conductivities floored away from exact zero, per spec §3 invariant
    /// discussion (mirrors the lumped-element resistance regularization).
    pub fn regularized_sigma_e(&self) -> f64 {
        if self.electrical_conductivity == 0.0 { SIGMA_FLOOR } else { self.electrical_conductivity }
    }

    pub fn regularized_sigma_m(&self) -> f64 {
        if self.magnetic_conductivity == 0.0 { SIGMA_FLOOR } else { self.magnetic_conductivity }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::VACUUM
    }
}

/// Linear dispersive medium described by its analytic pole structure.
/// `correct_coeff` and the ADE update proper live in
/// [`crate::updator::dispersive`]; this type only carries the physical
/// parameters the spec calls out in §3.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum DispersiveModel {
    /// epsilon_inf plus one or more Debye poles (delta_epsilon, tau).
    Debye { epsilon_inf: f64, poles: Vec<DebyePole> },
    /// epsilon_inf plus one or more Drude poles (omega_p, gamma).
    Drude { epsilon_inf: f64, poles: Vec<DrudePole> },
    /// epsilon_inf plus one or more Lorentz poles (delta_epsilon, omega_0, delta).
    Lorentz { epsilon_inf: f64, poles: Vec<LorentzPole> },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DebyePole {
    pub delta_epsilon: f64,
    pub tau: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DrudePole {
    pub omega_p: f64,
    pub gamma: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LorentzPole {
    pub delta_epsilon: f64,
    pub omega_0: f64,
    pub delta: f64,
}

/// Per-cell material index: `None` means the spec's `-1` (default/air).
/// Appended materials receive consecutive non-negative indices matching
/// their position in [`MaterialTable::materials`].
#[derive(Clone, Debug)]
pub struct MaterialTable {
    pub materials: Vec<Material>,
    pub index_grid: Lattice3<Option<u32>>,
}

impl MaterialTable {
    pub fn new(size: nalgebra::Vector3<usize>) -> Self {
        Self {
            materials: Vec::new(),
            index_grid: Lattice3::new(size),
        }
    }

    /// Appends `material` and returns the index it was assigned. Call
    /// order determines the index, per spec §4.5 step 4.
    pub fn add_material(&mut self, material: Material) -> u32 {
        let index = self.materials.len() as u32;
        self.materials.push(material);
        index
    }

    pub fn material_at(&self, point: nalgebra::Point3<usize>) -> Material {
        match self.index_grid.get(&point) {
            Some(Some(index)) => self.materials[*index as usize].clone(),
            _ => Material::default(),
        }
    }

    /// Invariant check: every index either is `None` or references an
    /// entry in `materials`.
    pub fn is_consistent(&self) -> bool {
        self.index_grid
            .as_slice()
            .iter()
            .all(|slot| slot.is_none_or(|i| (i as usize) < self.materials.len()))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{
        Point3,
        Vector3,
    };

    use super::*;

    #[test]
    fn material_index_defaults_to_air() {
        let table = MaterialTable::new(Vector3::new(2, 2, 2));
        assert_eq!(table.material_at(Point3::new(0, 0, 0)).relative_permittivity, 1.0);
    }

    #[test]
    fn add_material_assigns_consecutive_indices() {
        let mut table = MaterialTable::new(Vector3::new(1, 1, 1));
        let a = table.add_material(Material { relative_permittivity: 2.0, ..Material::VACUUM });
        let b = table.add_material(Material { relative_permittivity: 4.0, ..Material::VACUUM });
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert!(table.is_consistent());
    }

    #[test]
    fn zero_conductivity_is_regularized() {
        assert_eq!(Material::VACUUM.regularized_sigma_e(), SIGMA_FLOOR);
        assert_eq!(Material::PEC.regularized_sigma_e(), PEC_SIGMA);
    }
}
