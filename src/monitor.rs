//! Passive field-sampling taps (spec §2 item 7 "Monitors / NFFFT tap
//! points", §6 "addMonitor/addNetwork/addNF2FF"). Out of core scope beyond
//! the sampling contract itself: read the field at a fixed footprint once
//! per step, and flush an idempotent snapshot on demand. NFFFT/S-parameter
//! post-processing math, and monitor output file writing, are both named
//! non-goals (spec.md §1) — `NetworkTap`/`Nf2ffTap` below exist only to
//! exercise the same registration/ordering contract a real implementation
//! of either would use.

use nalgebra::Point3;

use crate::{
    emf::{
        EComponent,
        Emf,
        HComponent,
    },
    time::TimeParam,
};

/// A monitor's output: a shape header plus its row-major payload, matching
/// the array-dump format spec.md §6 describes (no wire protocol; callers
/// decide how or whether to persist it).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrayDump {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

/// Read-only sampling tap called once per step after both half-step
/// corrections (spec §4.4 step 11). `record` is the only mutating method;
/// `output` must be idempotent and must never write state back into the
/// engine (spec.md §6).
pub trait Monitor: std::fmt::Debug {
    fn record(&mut self, emf: &Emf, time: &TimeParam);
    fn output(&self) -> ArrayDump;
}

/// Which field array a probe reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    E(EComponent),
    H(HComponent),
}

impl Probe {
    fn sample(&self, emf: &Emf, point: &Point3<usize>) -> f64 {
        match *self {
            Probe::E(component) => emf.e(component).get(point).copied().unwrap_or(0.0),
            Probe::H(component) => emf.h(component).get(point).copied().unwrap_or(0.0),
        }
    }
}

/// Samples a single field component at a single cell every step, producing
/// a time series. Grounds scenarios 2 and 3 (RLC/capacitor voltage probes).
#[derive(Debug)]
pub struct PointProbe {
    point: Point3<usize>,
    probe: Probe,
    samples: Vec<f64>,
}

impl PointProbe {
    pub fn new(point: Point3<usize>, probe: Probe) -> Self {
        Self { point, probe, samples: Vec::new() }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}

impl Monitor for PointProbe {
    fn record(&mut self, emf: &Emf, _time: &TimeParam) {
        self.samples.push(self.probe.sample(emf, &self.point));
    }

    fn output(&self) -> ArrayDump {
        ArrayDump { shape: vec![self.samples.len()], data: self.samples.clone() }
    }
}

/// Samples the maximum absolute value of a field component over a box of
/// cells every step. Grounds the Courant-stability and PML-reflection
/// testable properties (spec §8), which only need a scalar bound per step
/// rather than a full field dump.
#[derive(Debug)]
pub struct MaxAbsProbe {
    points: Vec<Point3<usize>>,
    probe: Probe,
    samples: Vec<f64>,
}

impl MaxAbsProbe {
    pub fn new(points: Vec<Point3<usize>>, probe: Probe) -> Self {
        Self { points, probe, samples: Vec::new() }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}

impl Monitor for MaxAbsProbe {
    fn record(&mut self, emf: &Emf, _time: &TimeParam) {
        let max = self
            .points
            .iter()
            .map(|point| self.probe.sample(emf, point).abs())
            .fold(0.0_f64, f64::max);
        self.samples.push(max);
    }

    fn output(&self) -> ArrayDump {
        ArrayDump { shape: vec![self.samples.len()], data: self.samples.clone() }
    }
}

/// Stub far-field transform tap (spec.md §1 Non-goal: NFFFT math is out of
/// core scope). Exists only so `Simulation::add_nf2ff` has a real `Monitor`
/// to register and the init-order contract (§4.5) can be exercised by tests.
#[derive(Debug, Default)]
pub struct Nf2ffTap {
    steps_recorded: usize,
}

impl Monitor for Nf2ffTap {
    fn record(&mut self, _emf: &Emf, _time: &TimeParam) {
        self.steps_recorded += 1;
    }

    fn output(&self) -> ArrayDump {
        ArrayDump { shape: vec![1], data: vec![self.steps_recorded as f64] }
    }
}

/// Stub network (S-parameter) post-processing tap; same role as
/// [`Nf2ffTap`] but for `addNetwork` (spec §6).
#[derive(Debug, Default)]
pub struct NetworkTap {
    steps_recorded: usize,
}

impl Monitor for NetworkTap {
    fn record(&mut self, _emf: &Emf, _time: &TimeParam) {
        self.steps_recorded += 1;
    }

    fn output(&self) -> ArrayDump {
        ArrayDump { shape: vec![1], data: vec![self.steps_recorded as f64] }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;

    #[test]
    fn point_probe_records_one_sample_per_step() {
        let mut emf = Emf::new(Vector3::new(4, 4, 4));
        *emf.ex.get_mut(&Point3::new(1, 1, 1)).unwrap() = 2.5;
        let time = TimeParam::new(1.0, 1.0, 10).unwrap();

        let mut probe = PointProbe::new(Point3::new(1, 1, 1), Probe::E(EComponent::Ex));
        probe.record(&emf, &time);
        probe.record(&emf, &time);

        assert_eq!(probe.samples(), &[2.5, 2.5]);
        assert_eq!(probe.output().shape, vec![2]);
    }

    #[test]
    fn max_abs_probe_reduces_over_its_footprint() {
        let mut emf = Emf::new(Vector3::new(4, 4, 4));
        *emf.hz.get_mut(&Point3::new(0, 0, 0)).unwrap() = -3.0;
        *emf.hz.get_mut(&Point3::new(1, 1, 1)).unwrap() = 1.0;
        let time = TimeParam::new(1.0, 1.0, 10).unwrap();

        let points = vec![Point3::new(0, 0, 0), Point3::new(1, 1, 1)];
        let mut probe = MaxAbsProbe::new(points, Probe::H(HComponent::Hz));
        probe.record(&emf, &time);

        assert_eq!(probe.samples(), &[3.0]);
    }

    #[test]
    fn output_is_idempotent() {
        let emf = Emf::new(Vector3::new(2, 2, 2));
        let time = TimeParam::new(1.0, 1.0, 10).unwrap();
        let mut probe = PointProbe::new(Point3::new(0, 0, 0), Probe::E(EComponent::Ex));
        probe.record(&emf, &time);

        assert_eq!(probe.output(), probe.output());
    }
}
