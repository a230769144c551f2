//! Post-update field correctors: boundaries, sources, lumped circuit
//! elements (spec §4.2). Correctors run in the fixed order the driver
//! established at init (§4.5 step 5: PML, then TFSF, then lumped elements),
//! both when coefficients are first built and every timestep thereafter.
//!
//! `dyn Corrector` is acceptable here (unlike [`crate::updator::Updator`]):
//! correction runs once per half-step per corrector, not once per cell, so
//! the dynamic dispatch overhead is amortized (spec §9).

pub mod lumped;
pub mod pml;
pub mod tfsf;

use crate::{
    coefficients::CoefficientTables,
    emf::Emf,
    time::TimeParam,
};

/// A boundary condition, source, or lumped element that corrects the field
/// after the base [`crate::updator::Updator`] step.
pub trait Corrector: std::fmt::Debug {
    /// Adjusts `c_e_self`/`ca`/`cb` (and `c_h_*`) for the cells this
    /// corrector owns; called once, after
    /// [`CoefficientTables::fill_from_materials`], in init order (§4.5).
    fn correct_coefficients(&mut self, _coeffs: &mut CoefficientTables) {}

    /// Runs after the H half-step. `coeffs` is the same table
    /// `correct_coefficients` adjusted, read-only here.
    fn after_update_h(&mut self, _emf: &mut Emf, _coeffs: &CoefficientTables, _time: &TimeParam) {}

    /// Runs after the E half-step.
    fn after_update_e(&mut self, _emf: &mut Emf, _coeffs: &CoefficientTables, _time: &TimeParam) {}
}

/// The correctors attached to one domain, applied in the fixed §4.5 order.
#[derive(Debug, Default)]
pub struct CorrectorSet {
    correctors: Vec<Box<dyn Corrector>>,
}

impl CorrectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, corrector: Box<dyn Corrector>) {
        self.correctors.push(corrector);
    }

    pub fn correct_coefficients(&mut self, coeffs: &mut CoefficientTables) {
        for corrector in &mut self.correctors {
            corrector.correct_coefficients(coeffs);
        }
    }

    pub fn after_update_h(&mut self, emf: &mut Emf, coeffs: &CoefficientTables, time: &TimeParam) {
        for corrector in &mut self.correctors {
            corrector.after_update_h(emf, coeffs, time);
        }
    }

    pub fn after_update_e(&mut self, emf: &mut Emf, coeffs: &CoefficientTables, time: &TimeParam) {
        for corrector in &mut self.correctors {
            corrector.after_update_e(emf, coeffs, time);
        }
    }
}
