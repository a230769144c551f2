//! Convolutional PML (spec §4.2.1). Grounded in the stretched-coordinate
//! CPML formulation `cem-solver/src/fdtd/pml.rs` sketches for a single axis,
//! generalized here to any of the six faces via [`Axis::next`]/[`Axis::prev`]
//! rather than one hand-written case per face.
//!
//! Applied as a correction layered on top of the base [`crate::updator`]
//! step rather than folded into it: the base step already added
//! `coefficient * raw_diff` assuming `kappa = 1`; this corrector adds the
//! remainder `coefficient * (raw_diff * (1/kappa - 1) + psi_new)`, which is
//! algebraically the same final value a kappa-aware stencil would produce.

use std::collections::HashMap;

use nalgebra::Point3;

use crate::{
    coefficients::CoefficientTables,
    constants::PhysicalConstants,
    emf::{
        EComponent,
        Emf,
        HComponent,
    },
    error::{
        FdtdError,
        Result,
    },
    grid::{
        Axis,
        Face,
    },
    lattice::Lattice3,
    time::TimeParam,
};

use super::Corrector;

#[derive(Clone, Copy, Debug)]
struct GradedCoeff {
    inv_kappa: f64,
    a: f64,
    b: f64,
}

fn graded_profile(
    thickness: usize,
    cell_size: f64,
    sigma_max: f64,
    kappa_max: f64,
    alpha_max: f64,
    order: f64,
    dt: f64,
    eps0: f64,
) -> Vec<GradedCoeff> {
    (0..thickness)
        .map(|depth| {
            let frac = (depth as f64 + 0.5) / thickness as f64;
            let sigma = sigma_max * frac.powf(order);
            let kappa = 1.0 + (kappa_max - 1.0) * frac.powf(order);
            let alpha = alpha_max * (1.0 - frac);
            let b = (-(sigma / kappa + alpha) * dt / eps0).exp();
            let a = if sigma.abs() < 1e-30 {
                0.0
            }
            else {
                sigma * (b - 1.0) / (cell_size * kappa * (sigma + kappa * alpha))
            };
            GradedCoeff { inv_kappa: 1.0 / kappa, a, b }
        })
        .collect()
}

/// Gedney's optimum polynomial grading: `sigma_max = (m+1) / (150 * pi * dx)`.
fn optimum_sigma_max(cell_size: f64, order: f64) -> f64 {
    (order + 1.0) / (150.0 * std::f64::consts::PI * cell_size)
}

/// A CPML layer absorbing on one face of the grid. Owns one auxiliary
/// `psi` slot (keyed by cell, lazily populated like
/// [`crate::updator::dispersive::DispersivePoles`]) per affected field
/// component.
#[derive(Debug)]
pub struct CpmlLayer {
    face: Face,
    thickness: usize,
    e_profile: Vec<GradedCoeff>,
    h_profile: Vec<GradedCoeff>,
    local_size: nalgebra::Vector3<usize>,
    psi_e_ha: HashMap<(usize, usize, usize), f64>,
    psi_e_hb: HashMap<(usize, usize, usize), f64>,
    psi_h_ea: HashMap<(usize, usize, usize), f64>,
    psi_h_eb: HashMap<(usize, usize, usize), f64>,
}

impl CpmlLayer {
    pub fn new(
        face: Face,
        thickness: usize,
        cell_size: nalgebra::Vector3<f64>,
        local_size: nalgebra::Vector3<usize>,
        dt: f64,
        dimensionality_axes: u8,
    ) -> Result<Self> {
        if thickness < 1 {
            return Err(FdtdError::PmlThicknessTooSmall { thickness });
        }
        // A 1-D (TEM) run only has a Z axis with any extent; a 2-D (TE) run
        // is flattened along Z, so Z carries no thickness to grade into
        // (spec.md §4.2.1 "placing PML on a 1-D axis that isn't Z, or 2-D
        // axis Z, is rejected").
        let axis_rejected = match dimensionality_axes {
            1 => face.axis != Axis::Z,
            2 => face.axis == Axis::Z,
            _ => false,
        };
        if axis_rejected {
            return Err(FdtdError::PmlAxisMismatch { axis: face.axis, dimensionality: dimensionality_axes });
        }

        let eps0 = PhysicalConstants::SI.vacuum_permittivity;
        let d = face.axis.component(&cell_size);
        let order = 3.0;
        let sigma_max = optimum_sigma_max(d, order);
        let kappa_max = 7.0;
        let alpha_max = 0.05;

        Ok(Self {
            face,
            thickness,
            e_profile: graded_profile(thickness, d, sigma_max, kappa_max, alpha_max, order, dt, eps0),
            h_profile: graded_profile(thickness, d, sigma_max, kappa_max, alpha_max, order, dt, eps0),
            local_size,
            psi_e_ha: HashMap::new(),
            psi_e_hb: HashMap::new(),
            psi_h_ea: HashMap::new(),
            psi_h_eb: HashMap::new(),
        })
    }

    /// `(E component whose first-role curl term crosses this face's axis, E
    /// component whose second-role term crosses it, matching H pair)`,
    /// following the same `axis.prev()`/`axis.next()` convention as
    /// [`crate::emf::EComponent::tangential_h`].
    fn affected_components(&self) -> (EComponent, EComponent, HComponent, HComponent) {
        let e_ha = EComponent::ALL.into_iter().find(|c| c.axis() == self.face.axis.prev()).unwrap();
        let e_hb = EComponent::ALL.into_iter().find(|c| c.axis() == self.face.axis.next()).unwrap();
        let h_ea = HComponent::ALL.into_iter().find(|c| c.axis() == self.face.axis.prev()).unwrap();
        let h_eb = HComponent::ALL.into_iter().find(|c| c.axis() == self.face.axis.next()).unwrap();
        (e_ha, e_hb, h_ea, h_eb)
    }

    /// Applies the remainder correction to `target` given the already
    /// computed `coefficient` (the same `ca`/`cb` the base update used) and
    /// `raw_diff` (the same forward/backward difference it used), updating
    /// `psi` in place.
    fn apply(
        profile: &[GradedCoeff],
        psi: &mut HashMap<(usize, usize, usize), f64>,
        depth_of: impl Fn(Point3<usize>) -> Option<usize>,
        raw_diff: impl Fn(Point3<usize>) -> f64,
        coefficient: impl Fn(Point3<usize>) -> f64,
        sign: f64,
        target: &mut Lattice3<f64>,
    ) {
        for point in target.strider().iter() {
            let Some(depth) = depth_of(point)
            else {
                continue;
            };
            let g = profile[depth.min(profile.len() - 1)];
            let raw = raw_diff(point);
            let key = (point.x, point.y, point.z);
            let psi_old = psi.get(&key).copied().unwrap_or(0.0);
            let psi_new = g.b * psi_old + g.a * raw;
            psi.insert(key, psi_new);

            target[point] += sign * coefficient(point) * (raw * (g.inv_kappa - 1.0) + psi_new);
        }
    }
}

impl Corrector for CpmlLayer {
    fn after_update_h(&mut self, emf: &mut Emf, coeffs: &CoefficientTables, _time: &TimeParam) {
        let (_, _, h_ea, h_eb) = self.affected_components();
        let axis = self.face.axis;
        let local_size = self.local_size;
        let thickness = self.thickness;
        let negative = self.face.negative;
        let depth_of = |p: Point3<usize>| {
            let n = axis.component(&local_size);
            let idx = axis.component(&p.coords);
            if negative {
                (idx < thickness).then_some(thickness - 1 - idx)
            }
            else {
                (idx + thickness > n).then(|| idx - (n - thickness))
            }
        };

        let ca = &coeffs.h(h_ea).a;
        match h_ea {
            HComponent::Hx => Self::apply(
                &self.h_profile,
                &mut self.psi_h_ea,
                depth_of,
                |p| forward_diff(&emf.ex, p, axis),
                |p| ca[p],
                -1.0,
                &mut emf.hx,
            ),
            HComponent::Hy => Self::apply(
                &self.h_profile,
                &mut self.psi_h_ea,
                depth_of,
                |p| forward_diff(&emf.ey, p, axis),
                |p| ca[p],
                -1.0,
                &mut emf.hy,
            ),
            HComponent::Hz => Self::apply(
                &self.h_profile,
                &mut self.psi_h_ea,
                depth_of,
                |p| forward_diff(&emf.ez, p, axis),
                |p| ca[p],
                -1.0,
                &mut emf.hz,
            ),
        }

        let cb = &coeffs.h(h_eb).b;
        match h_eb {
            HComponent::Hx => Self::apply(
                &self.h_profile,
                &mut self.psi_h_eb,
                depth_of,
                |p| forward_diff(&emf.ex, p, axis),
                |p| cb[p],
                1.0,
                &mut emf.hx,
            ),
            HComponent::Hy => Self::apply(
                &self.h_profile,
                &mut self.psi_h_eb,
                depth_of,
                |p| forward_diff(&emf.ey, p, axis),
                |p| cb[p],
                1.0,
                &mut emf.hy,
            ),
            HComponent::Hz => Self::apply(
                &self.h_profile,
                &mut self.psi_h_eb,
                depth_of,
                |p| forward_diff(&emf.ez, p, axis),
                |p| cb[p],
                1.0,
                &mut emf.hz,
            ),
        }
    }

    fn after_update_e(&mut self, emf: &mut Emf, coeffs: &CoefficientTables, _time: &TimeParam) {
        let (e_ha, e_hb, _, _) = self.affected_components();
        let axis = self.face.axis;
        let local_size = self.local_size;
        let thickness = self.thickness;
        let negative = self.face.negative;
        let depth_of = |p: Point3<usize>| {
            let n = axis.component(&local_size);
            let idx = axis.component(&p.coords);
            if negative {
                (idx < thickness).then_some(thickness - 1 - idx)
            }
            else {
                (idx + thickness > n).then(|| idx - (n - thickness))
            }
        };

        let ca = &coeffs.e(e_ha).a;
        match e_ha {
            EComponent::Ex => Self::apply(
                &self.e_profile,
                &mut self.psi_e_ha,
                depth_of,
                |p| backward_diff(&emf.hx, p, axis),
                |p| ca[p],
                1.0,
                &mut emf.ex,
            ),
            EComponent::Ey => Self::apply(
                &self.e_profile,
                &mut self.psi_e_ha,
                depth_of,
                |p| backward_diff(&emf.hy, p, axis),
                |p| ca[p],
                1.0,
                &mut emf.ey,
            ),
            EComponent::Ez => Self::apply(
                &self.e_profile,
                &mut self.psi_e_ha,
                depth_of,
                |p| backward_diff(&emf.hz, p, axis),
                |p| ca[p],
                1.0,
                &mut emf.ez,
            ),
        }

        let cb = &coeffs.e(e_hb).b;
        match e_hb {
            EComponent::Ex => Self::apply(
                &self.e_profile,
                &mut self.psi_e_hb,
                depth_of,
                |p| backward_diff(&emf.hx, p, axis),
                |p| cb[p],
                -1.0,
                &mut emf.ex,
            ),
            EComponent::Ey => Self::apply(
                &self.e_profile,
                &mut self.psi_e_hb,
                depth_of,
                |p| backward_diff(&emf.hy, p, axis),
                |p| cb[p],
                -1.0,
                &mut emf.ey,
            ),
            EComponent::Ez => Self::apply(
                &self.e_profile,
                &mut self.psi_e_hb,
                depth_of,
                |p| backward_diff(&emf.hz, p, axis),
                |p| cb[p],
                -1.0,
                &mut emf.ez,
            ),
        }
    }
}

fn forward_diff(field: &Lattice3<f64>, point: Point3<usize>, axis: Axis) -> f64 {
    let mut next = point;
    *axis.component_mut(&mut next.coords) += 1;
    match (field.get(&next), field.get(&point)) {
        (Some(n), Some(c)) => n - c,
        _ => 0.0,
    }
}

fn backward_diff(field: &Lattice3<f64>, point: Point3<usize>, axis: Axis) -> f64 {
    let mut prev = point;
    let c = axis.component_mut(&mut prev.coords);
    if *c == 0 {
        return field.get(&point).copied().unwrap_or(0.0);
    }
    *c -= 1;
    match (field.get(&point), field.get(&prev)) {
        (Some(c), Some(p)) => c - p,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_thin_layer() {
        let result = CpmlLayer::new(
            Face { axis: Axis::X, negative: true },
            0,
            nalgebra::Vector3::repeat(1e-3),
            nalgebra::Vector3::new(10, 10, 10),
            1e-12,
            3,
        );
        assert!(matches!(result, Err(FdtdError::PmlThicknessTooSmall { .. })));
    }

    #[test]
    fn rejects_pml_on_flattened_axis_in_2d() {
        let result = CpmlLayer::new(
            Face { axis: Axis::Z, negative: true },
            4,
            nalgebra::Vector3::repeat(1e-3),
            nalgebra::Vector3::new(10, 10, 1),
            1e-12,
            2,
        );
        assert!(matches!(result, Err(FdtdError::PmlAxisMismatch { .. })));
    }

    #[test]
    fn accepts_pml_on_transverse_axis_in_2d() {
        let result = CpmlLayer::new(
            Face { axis: Axis::X, negative: true },
            4,
            nalgebra::Vector3::repeat(1e-3),
            nalgebra::Vector3::new(10, 10, 1),
            1e-12,
            2,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_pml_on_non_z_axis_in_1d() {
        let result = CpmlLayer::new(
            Face { axis: Axis::X, negative: true },
            4,
            nalgebra::Vector3::repeat(1e-3),
            nalgebra::Vector3::new(10, 1, 1),
            1e-12,
            1,
        );
        assert!(matches!(result, Err(FdtdError::PmlAxisMismatch { .. })));
    }

    #[test]
    fn profile_is_monotonically_graded() {
        let profile = graded_profile(8, 1e-3, 1.0, 7.0, 0.05, 3.0, 1e-12, 8.854e-12);
        assert!(profile.first().unwrap().inv_kappa > profile.last().unwrap().inv_kappa);
    }
}
