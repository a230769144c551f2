//! Auxiliary differential equation (ADE) method for linearly dispersive
//! media (spec §3, §4.1). Coefficient derivations are supplemented from
//! `src/material/{debye,drude,lorentz}_medium.cpp` and
//! `include/xfdtd/updator/dispersive_material_update_method/
//! drude_ade_method.h`; spec §4.1 only references these models by name.

use std::collections::HashMap;

use nalgebra::Point3;

use crate::{
    emf::EComponent,
    material::DispersiveModel,
};

/// One polarization current per pole, keyed by the component and cell it
/// belongs to. Lazily populated: a cell whose material carries no
/// dispersive model never gets an entry. This trades the per-material dense
/// `(poles, Nx, Ny, Nz)` slab the original keeps for a sparse map, since a
/// [`crate::material::MaterialTable`] does not pre-partition cells by
/// material the way the original's per-object grid traversal does.
#[derive(Clone, Debug, Default)]
pub struct DispersivePoles {
    state: HashMap<(u8, usize, usize, usize), Vec<f64>>,
}

fn key(component: EComponent, point: Point3<usize>) -> (u8, usize, usize, usize) {
    let c = match component {
        EComponent::Ex => 0,
        EComponent::Ey => 1,
        EComponent::Ez => 2,
    };
    (c, point.x, point.y, point.z)
}

impl DispersivePoles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currents for `(component, point)`, zeroed on first touch.
    pub fn get(&self, component: EComponent, point: Point3<usize>, num_slots: usize) -> Vec<f64> {
        self.state
            .get(&key(component, point))
            .cloned()
            .unwrap_or_else(|| vec![0.0; num_slots])
    }

    pub fn store(&mut self, component: EComponent, point: Point3<usize>, j: Vec<f64>) {
        self.state.insert(key(component, point), j);
    }
}

/// Number of `f64` slots [`DispersivePoles`] must carry per cell for this
/// model (one per pole, two for Lorentz's second-order recursion).
pub fn num_slots(model: &DispersiveModel) -> usize {
    match model {
        DispersiveModel::Debye { poles, .. } => poles.len(),
        DispersiveModel::Drude { poles, .. } => poles.len(),
        DispersiveModel::Lorentz { poles, .. } => poles.len() * 2,
    }
}

/// Reads the pole state a cell needs before calling [`update_e_with_dispersion`].
pub fn poles_for(
    poles: &DispersivePoles,
    model: &DispersiveModel,
    component: EComponent,
    point: Point3<usize>,
) -> Vec<f64> {
    poles.get(component, point, num_slots(model))
}

/// Updates one E-component cell under a dispersive model. `prior` holds the
/// pole currents from the previous E half-step (see [`num_slots`] for its
/// length); returns the new field value and the currents to store back.
pub fn update_e_with_dispersion(
    model: &DispersiveModel,
    dt: f64,
    e_old: f64,
    curl_h_term: f64,
    prior: &[f64],
) -> (f64, Vec<f64>) {
    let eps0 = crate::constants::PhysicalConstants::SI.vacuum_permittivity;
    match model {
        DispersiveModel::Debye { epsilon_inf, poles } => {
            debye_update(*epsilon_inf, poles, dt, e_old, curl_h_term, eps0, prior)
        }
        DispersiveModel::Drude { epsilon_inf, poles } => {
            drude_update(*epsilon_inf, poles, dt, e_old, curl_h_term, eps0, prior)
        }
        DispersiveModel::Lorentz { epsilon_inf, poles } => {
            lorentz_update(*epsilon_inf, poles, dt, e_old, curl_h_term, eps0, prior)
        }
    }
}

/// First-order recursive-convolution ADE shared by Debye and Drude poles:
/// `J_new = k*J_old + beta*(average of E_old, E_new)`, folded into the E
/// update through `sum(beta)` the way a lumped element's conductance
/// folds into `c_e_self` (spec §4.2.3).
fn first_order_ade(
    epsilon_inf: f64,
    k: &[f64],
    beta: &[f64],
    dt: f64,
    e_old: f64,
    curl_h_term: f64,
    eps0: f64,
    prior: &[f64],
    e_weighted_beta: bool,
) -> (f64, Vec<f64>) {
    let sum_beta: f64 = beta.iter().sum();
    let j_sum_old: f64 = prior.iter().sum();

    let eps_inf_abs = eps0 * epsilon_inf;
    let denom = 2.0 * eps_inf_abs + dt * sum_beta;
    let a = (2.0 * eps_inf_abs - dt * sum_beta) / denom;
    let b = 2.0 * dt / denom;

    let e_new = a * e_old + b * (curl_h_term - j_sum_old);

    let j_new = k
        .iter()
        .zip(beta.iter())
        .zip(prior.iter())
        .map(|((k_m, beta_m), j_old)| {
            let drive = if e_weighted_beta { e_new + e_old } else { e_new };
            k_m * j_old + beta_m * drive
        })
        .collect();
    (e_new, j_new)
}

fn debye_update(
    epsilon_inf: f64,
    poles: &[crate::material::DebyePole],
    dt: f64,
    e_old: f64,
    curl_h_term: f64,
    eps0: f64,
    prior: &[f64],
) -> (f64, Vec<f64>) {
    let k: Vec<f64> = poles.iter().map(|p| (2.0 * p.tau - dt) / (2.0 * p.tau + dt)).collect();
    let beta: Vec<f64> = poles
        .iter()
        .map(|p| eps0 * p.delta_epsilon * dt / (p.tau * (2.0 * p.tau + dt)))
        .collect();
    first_order_ade(epsilon_inf, &k, &beta, dt, e_old, curl_h_term, eps0, prior, true)
}

fn drude_update(
    epsilon_inf: f64,
    poles: &[crate::material::DrudePole],
    dt: f64,
    e_old: f64,
    curl_h_term: f64,
    eps0: f64,
    prior: &[f64],
) -> (f64, Vec<f64>) {
    let k: Vec<f64> = poles.iter().map(|p| (2.0 - p.gamma * dt) / (2.0 + p.gamma * dt)).collect();
    let beta: Vec<f64> = poles
        .iter()
        .map(|p| eps0 * p.omega_p.powi(2) * dt / (2.0 + p.gamma * dt))
        .collect();
    first_order_ade(epsilon_inf, &k, &beta, dt, e_old, curl_h_term, eps0, prior, false)
}

/// Second-order recursive-convolution ADE for Lorentz poles: each pole keeps
/// two slots, `J` and its previous value, since a damped-oscillator pole
/// needs two history taps rather than one (unlike Debye/Drude).
fn lorentz_update(
    epsilon_inf: f64,
    poles: &[crate::material::LorentzPole],
    dt: f64,
    e_old: f64,
    curl_h_term: f64,
    eps0: f64,
    prior: &[f64],
) -> (f64, Vec<f64>) {
    let mut alpha = Vec::with_capacity(poles.len());
    let mut xi = Vec::with_capacity(poles.len());
    let mut gamma_coef = Vec::with_capacity(poles.len());
    for pole in poles {
        let denom_pole = pole.omega_0.powi(2) * dt.powi(2) + 2.0 * pole.delta * dt + 2.0;
        alpha.push((4.0 - 2.0 * pole.omega_0.powi(2) * dt.powi(2)) / denom_pole);
        xi.push((2.0 * pole.delta * dt - 2.0) / denom_pole);
        gamma_coef.push(eps0 * pole.delta_epsilon * pole.omega_0.powi(2) * dt.powi(2) / denom_pole);
    }
    let sum_gamma: f64 = gamma_coef.iter().sum();
    let j_sum_old: f64 = poles.iter().enumerate().map(|(m, _)| prior[2 * m]).sum();

    let eps_inf_abs = eps0 * epsilon_inf;
    let denom = 2.0 * eps_inf_abs + dt * sum_gamma;
    let a = (2.0 * eps_inf_abs - dt * sum_gamma) / denom;
    let b = 2.0 * dt / denom;
    let e_new = a * e_old + b * (curl_h_term - j_sum_old);

    let mut j_new = Vec::with_capacity(poles.len() * 2);
    for m in 0..poles.len() {
        let j_old = prior[2 * m];
        let j_prev = prior[2 * m + 1];
        let j_next = alpha[m] * j_old + xi[m] * j_prev + gamma_coef[m] * (e_new - e_old);
        j_new.push(j_next);
        j_new.push(j_old);
    }
    (e_new, j_new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::DebyePole;

    #[test]
    fn debye_update_matches_vacuum_when_no_poles() {
        let model = DispersiveModel::Debye { epsilon_inf: 1.0, poles: vec![] };
        let (e_new, j) = update_e_with_dispersion(&model, 1e-12, 0.0, 1.0, &[]);
        assert!(j.is_empty());
        assert!(e_new.is_finite());
    }

    #[test]
    fn single_debye_pole_adds_one_current_slot() {
        let model = DispersiveModel::Debye {
            epsilon_inf: 1.0,
            poles: vec![DebyePole { delta_epsilon: 2.0, tau: 1e-9 }],
        };
        let prior = vec![0.0];
        let (_, j) = update_e_with_dispersion(&model, 1e-12, 0.0, 1.0, &prior);
        assert_eq!(j.len(), 1);
    }

    #[test]
    fn num_slots_doubles_for_lorentz() {
        let model = DispersiveModel::Lorentz {
            epsilon_inf: 1.0,
            poles: vec![crate::material::LorentzPole { delta_epsilon: 1.0, omega_0: 1e9, delta: 1e7 }],
        };
        assert_eq!(num_slots(&model), 2);
    }
}
