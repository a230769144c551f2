//! Lumped circuit elements (spec §4.2.3). Coefficient-correction formulas
//! grounded in `src/object/lumped_element/voltage_source.cpp` and sibling
//! files; spec §4.2.3 names the coefficients abstractly ("beta, cv
//! coefficients") without pinning down their derivation.

use nalgebra::Point3;

use crate::{
    coefficients::CoefficientTables,
    emf::{
        Emf,
        EComponent,
    },
    grid::Axis,
    waveform::Waveform,
};

use super::Corrector;

/// `R * Na * Nb / Nc` where `Na`, `Nb` are the cell counts along the two axes
/// transverse to the element and `Nc` the count along its own axis — the
/// node-count footprint factor every lumped element uses to turn a single
/// resistance/capacitance/inductance into a per-cell value (`_resistance_factor`
/// in the original).
fn resistance_factor(resistance: f64, na: usize, nb: usize, nc: usize) -> f64 {
    resistance * (na * nb) as f64 / nc.max(1) as f64
}

/// `alpha = d_a * d_b * resistance_factor(...)`, `beta = dt * d_c / alpha`,
/// where `d_c` is the cell size along the element's own axis — distinct from
/// the transverse `d_a`/`d_b`. Ported as `_alpha`/`_beta` from
/// `voltage_source.cpp:109-110`, shared by every lumped element kind.
fn alpha_beta(resistance: f64, na: usize, nb: usize, nc: usize, d_a: f64, d_b: f64, d_c: f64, dt: f64) -> (f64, f64) {
    let alpha = d_a * d_b * resistance_factor(resistance, na, nb, nc);
    let beta = dt * d_c / alpha;
    (alpha, beta)
}

fn corrected_coefficients(eps: f64, sigma: f64, dt: f64, beta: f64, d_a: f64, d_b: f64) -> (f64, f64, f64) {
    let denom = 2.0 * eps + dt * sigma + beta;
    let self_ = (2.0 * eps - dt * sigma - beta) / denom;
    let ca = -2.0 * dt / (denom * d_b);
    let cb = 2.0 * dt / (denom * d_a);
    (self_, ca, cb)
}

/// One cell of an E component a lumped element occupies.
#[derive(Clone, Copy, Debug)]
pub struct LumpedCell {
    pub point: Point3<usize>,
    pub component: EComponent,
}

/// Shared footprint bookkeeping: the cells an element corrects, its own
/// axis, and the `(Na, Nb, Nc)` node counts used by [`resistance_factor`].
#[derive(Clone, Debug)]
pub struct Footprint {
    pub cells: Vec<LumpedCell>,
    pub axis: Axis,
    pub na: usize,
    pub nb: usize,
    pub nc: usize,
}

impl Footprint {
    pub fn new(cells: Vec<LumpedCell>, axis: Axis, na: usize, nb: usize, nc: usize) -> crate::error::Result<Self> {
        if nc == 0 {
            return Err(crate::error::FdtdError::LumpedElementDegenerate);
        }
        Ok(Self { cells, axis, na, nb, nc })
    }
}

#[derive(Clone, Debug)]
pub struct Resistor {
    pub footprint: Footprint,
    pub resistance: f64,
    pub dt: f64,
    pub eps: f64,
    pub sigma: f64,
    pub d_a: f64,
    pub d_b: f64,
    pub d_c: f64,
}

impl Corrector for Resistor {
    fn correct_coefficients(&mut self, coeffs: &mut CoefficientTables) {
        let (_, beta) = alpha_beta(
            self.resistance,
            self.footprint.na,
            self.footprint.nb,
            self.footprint.nc,
            self.d_a,
            self.d_b,
            self.d_c,
            self.dt,
        );
        let (self_, ca, cb) =
            corrected_coefficients(self.eps, self.sigma, self.dt, beta, self.d_a, self.d_b);
        for cell in &self.footprint.cells {
            let c = coeffs.e_mut(cell.component);
            c.self_[cell.point] = self_;
            c.a[cell.point] = ca;
            c.b[cell.point] = cb;
        }
    }
}

/// A voltage source is a resistor with a series EMF: every step it injects
/// `c_v * waveform(t)` directly into the E cells it covers, in addition to
/// the resistor's coefficient correction.
#[derive(Clone, Debug)]
pub struct VoltageSource {
    pub footprint: Footprint,
    pub internal_resistance: f64,
    pub amplitude: f64,
    pub waveform: Waveform,
    pub negative_direction: bool,
    pub dt: f64,
    pub eps: f64,
    pub sigma: f64,
    pub d_a: f64,
    pub d_b: f64,
    pub d_c: f64,
    c_v: f64,
}

impl VoltageSource {
    /// A resistance of exactly 0 is silently regularized to
    /// [`crate::constants::RESISTANCE_FLOOR`] (spec §7 "Numeric").
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        footprint: Footprint,
        internal_resistance: f64,
        amplitude: f64,
        waveform: Waveform,
        negative_direction: bool,
        dt: f64,
        eps: f64,
        sigma: f64,
        d_a: f64,
        d_b: f64,
        d_c: f64,
    ) -> Self {
        let internal_resistance = if internal_resistance == 0.0 {
            crate::constants::RESISTANCE_FLOOR
        }
        else {
            internal_resistance
        };
        Self {
            footprint,
            internal_resistance,
            amplitude,
            waveform,
            negative_direction,
            dt,
            eps,
            sigma,
            d_a,
            d_b,
            d_c,
            c_v: 0.0,
        }
    }
}

impl Corrector for VoltageSource {
    fn correct_coefficients(&mut self, coeffs: &mut CoefficientTables) {
        let (alpha, beta) = alpha_beta(
            self.internal_resistance,
            self.footprint.na,
            self.footprint.nb,
            self.footprint.nc,
            self.d_a,
            self.d_b,
            self.d_c,
            self.dt,
        );
        let (self_, ca, cb) =
            corrected_coefficients(self.eps, self.sigma, self.dt, beta, self.d_a, self.d_b);

        let denom = 2.0 * self.eps + self.dt * self.sigma + beta;
        let mut c_v = -2.0 * self.dt / (denom * alpha) * (self.amplitude / self.footprint.nc as f64);
        if self.negative_direction {
            c_v = -c_v;
        }
        self.c_v = c_v;

        for cell in &self.footprint.cells {
            let c = coeffs.e_mut(cell.component);
            c.self_[cell.point] = self_;
            c.a[cell.point] = ca;
            c.b[cell.point] = cb;
        }
    }

    fn after_update_e(&mut self, emf: &mut Emf, _coeffs: &CoefficientTables, time: &crate::time::TimeParam) {
        let drive = self.c_v * self.waveform.sample(time.e_time());
        for cell in &self.footprint.cells {
            emf.e_mut(cell.component)[cell.point] += drive;
        }
    }
}

/// `dV/dt = I/C`: a per-cell auxiliary current `J` accumulates charge each
/// step and is subtracted from the E update the way a conduction current
/// would be (supplemented from original_source; spec.md leaves the ADE
/// concrete form as an open detail).
#[derive(Clone, Debug)]
pub struct Capacitor {
    pub footprint: Footprint,
    pub capacitance: f64,
    pub dt: f64,
    pub eps: f64,
    pub sigma: f64,
    pub d_a: f64,
    pub d_b: f64,
    pub d_c: f64,
    current: Vec<f64>,
}

impl Capacitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        footprint: Footprint,
        capacitance: f64,
        dt: f64,
        eps: f64,
        sigma: f64,
        d_a: f64,
        d_b: f64,
        d_c: f64,
    ) -> Self {
        let current = vec![0.0; footprint.cells.len()];
        Self { footprint, capacitance, dt, eps, sigma, d_a, d_b, d_c, current }
    }
}

impl Corrector for Capacitor {
    fn correct_coefficients(&mut self, coeffs: &mut CoefficientTables) {
        let (_, beta) = alpha_beta(
            1.0 / self.capacitance.max(f64::MIN_POSITIVE),
            self.footprint.na,
            self.footprint.nb,
            self.footprint.nc,
            self.d_a,
            self.d_b,
            self.d_c,
            self.dt,
        );
        let (self_, ca, cb) =
            corrected_coefficients(self.eps, self.sigma, self.dt, beta, self.d_a, self.d_b);
        for cell in &self.footprint.cells {
            let c = coeffs.e_mut(cell.component);
            c.self_[cell.point] = self_;
            c.a[cell.point] = ca;
            c.b[cell.point] = cb;
        }
    }

    fn after_update_e(&mut self, emf: &mut Emf, _coeffs: &CoefficientTables, _time: &crate::time::TimeParam) {
        for (slot, cell) in self.current.iter_mut().zip(&self.footprint.cells) {
            let e = emf.e(cell.component)[cell.point];
            let d_slot = self.capacitance * e * self.dt;
            *slot += d_slot;
            emf.e_mut(cell.component)[cell.point] -= d_slot * self.dt / self.eps;
        }
    }
}

/// `dI/dt = V/L`: the inductive dual of [`Capacitor`].
#[derive(Clone, Debug)]
pub struct Inductor {
    pub footprint: Footprint,
    pub inductance: f64,
    pub dt: f64,
    pub eps: f64,
    pub sigma: f64,
    pub d_a: f64,
    pub d_b: f64,
    pub d_c: f64,
    current: Vec<f64>,
}

impl Inductor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        footprint: Footprint,
        inductance: f64,
        dt: f64,
        eps: f64,
        sigma: f64,
        d_a: f64,
        d_b: f64,
        d_c: f64,
    ) -> Self {
        let current = vec![0.0; footprint.cells.len()];
        Self { footprint, inductance, dt, eps, sigma, d_a, d_b, d_c, current }
    }
}

impl Corrector for Inductor {
    fn correct_coefficients(&mut self, coeffs: &mut CoefficientTables) {
        let (_, beta) = alpha_beta(
            self.inductance,
            self.footprint.na,
            self.footprint.nb,
            self.footprint.nc,
            self.d_a,
            self.d_b,
            self.d_c,
            self.dt,
        );
        let (self_, ca, cb) =
            corrected_coefficients(self.eps, self.sigma, self.dt, beta, self.d_a, self.d_b);
        for cell in &self.footprint.cells {
            let c = coeffs.e_mut(cell.component);
            c.self_[cell.point] = self_;
            c.a[cell.point] = ca;
            c.b[cell.point] = cb;
        }
    }

    fn after_update_e(&mut self, emf: &mut Emf, _coeffs: &CoefficientTables, _time: &crate::time::TimeParam) {
        for (slot, cell) in self.current.iter_mut().zip(&self.footprint.cells) {
            let e = emf.e(cell.component)[cell.point];
            *slot += e * self.dt / self.inductance;
            emf.e_mut(cell.component)[cell.point] -= *slot * self.dt / self.eps;
        }
    }
}

/// A perfectly-conducting plane: forces `c_e_self = 0`, `c_e_ha = c_e_hb = 0`
/// on its cells so the tangential E field is pinned to zero every step.
#[derive(Clone, Debug)]
pub struct PecPlane {
    pub cells: Vec<LumpedCell>,
}

impl Corrector for PecPlane {
    fn correct_coefficients(&mut self, coeffs: &mut CoefficientTables) {
        for cell in &self.cells {
            let c = coeffs.e_mut(cell.component);
            c.self_[cell.point] = 0.0;
            c.a[cell.point] = 0.0;
            c.b[cell.point] = 0.0;
        }
    }

    fn after_update_e(&mut self, emf: &mut Emf, _coeffs: &CoefficientTables, _time: &crate::time::TimeParam) {
        for cell in &self.cells {
            emf.e_mut(cell.component)[cell.point] = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::Waveform;

    fn single_cell_footprint() -> Footprint {
        Footprint::new(
            vec![LumpedCell { point: Point3::new(1, 1, 1), component: EComponent::Ez }],
            Axis::Z,
            1,
            1,
            1,
        )
        .unwrap()
    }

    #[test]
    fn zero_node_count_is_rejected() {
        let result = Footprint::new(vec![], Axis::Z, 1, 1, 0);
        assert!(matches!(result, Err(crate::error::FdtdError::LumpedElementDegenerate)));
    }

    #[test]
    fn voltage_source_injects_drive_after_e_update() {
        let grid_size = nalgebra::Vector3::new(2, 2, 2);
        let mut coeffs = CoefficientTables::new(grid_size);
        let mut source = VoltageSource::new(
            single_cell_footprint(),
            50.0,
            1.0,
            Waveform::UnitStep { amplitude: 1.0, t0: 0.0 },
            false,
            1e-12,
            8.854e-12,
            1e-20,
            1e-3,
            1e-3,
            1e-3,
        );
        source.correct_coefficients(&mut coeffs);

        let mut emf = Emf::new(grid_size);
        let time = crate::time::TimeParam::new(2e-12, 0.5, 10).unwrap();
        let before = emf.ez[Point3::new(1, 1, 1)];
        source.after_update_e(&mut emf, &coeffs, &time);
        let after = emf.ez[Point3::new(1, 1, 1)];
        assert_ne!(before, after);
    }

    #[test]
    fn zero_resistance_voltage_source_is_regularized_not_rejected() {
        let source = VoltageSource::new(
            single_cell_footprint(),
            0.0,
            1.0,
            Waveform::UnitStep { amplitude: 1.0, t0: 0.0 },
            false,
            1e-12,
            8.854e-12,
            1e-20,
            1e-3,
            1e-3,
            1e-3,
        );
        assert_eq!(source.internal_resistance, crate::constants::RESISTANCE_FLOOR);
    }

    #[test]
    fn pec_plane_zeroes_tangential_field() {
        let grid_size = nalgebra::Vector3::new(2, 2, 2);
        let mut emf = Emf::new(grid_size);
        emf.ez[Point3::new(1, 1, 1)] = 42.0;
        let mut plane =
            PecPlane { cells: vec![LumpedCell { point: Point3::new(1, 1, 1), component: EComponent::Ez }] };
        let coeffs = CoefficientTables::new(grid_size);
        let time = crate::time::TimeParam::new(1.0, 1.0, 1).unwrap();
        plane.after_update_e(&mut emf, &coeffs, &time);
        assert_eq!(emf.ez[Point3::new(1, 1, 1)], 0.0);
    }
}
