//! Analytic excitation waveforms (spec §3 "Waveform"), supplemented from
//! `examples/original_source/src/waveform/waveform.cpp`, which the distilled
//! spec only gestures at via "a handful of analytic source shapes".

use serde::{
    Deserialize,
    Serialize,
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Waveform {
    Sine { amplitude: f64, frequency: f64, phase: f64 },
    Cosine { amplitude: f64, frequency: f64, phase: f64 },
    Square { amplitude: f64, frequency: f64, duty: f64 },
    Triangle { amplitude: f64, frequency: f64 },
    Sawtooth { amplitude: f64, frequency: f64 },
    Gaussian { amplitude: f64, tau: f64, t0: f64 },
    CosineModulatedGaussian { amplitude: f64, tau: f64, t0: f64, frequency: f64 },
    UnitStep { amplitude: f64, t0: f64 },
}

impl Waveform {
    /// Samples the waveform at time `t`, matching the original's
    /// `value(double)` member functions cell by cell.
    pub fn sample(&self, t: f64) -> f64 {
        match *self {
            Waveform::Sine { amplitude, frequency, phase } => {
                amplitude * (std::f64::consts::TAU * frequency * t + phase).sin()
            }
            Waveform::Cosine { amplitude, frequency, phase } => {
                amplitude * (std::f64::consts::TAU * frequency * t + phase).cos()
            }
            Waveform::Square { amplitude, frequency, duty } => {
                let phase = (frequency * t).fract();
                if phase < duty { amplitude } else { -amplitude }
            }
            Waveform::Triangle { amplitude, frequency } => {
                let phase = (frequency * t).fract();
                let value = if phase < 0.5 { 4.0 * phase - 1.0 } else { 3.0 - 4.0 * phase };
                amplitude * value
            }
            Waveform::Sawtooth { amplitude, frequency } => {
                let phase = (frequency * t).fract();
                amplitude * (2.0 * phase - 1.0)
            }
            Waveform::Gaussian { amplitude, tau, t0 } => {
                let x = (t - t0) / tau;
                amplitude * (-x * x).exp()
            }
            Waveform::CosineModulatedGaussian { amplitude, tau, t0, frequency } => {
                let x = (t - t0) / tau;
                amplitude * (-x * x).exp() * (std::f64::consts::TAU * frequency * (t - t0)).cos()
            }
            Waveform::UnitStep { amplitude, t0 } => {
                if t >= t0 { amplitude } else { 0.0 }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_starts_at_phase_zero() {
        let w = Waveform::Sine { amplitude: 2.0, frequency: 1.0, phase: 0.0 };
        assert!((w.sample(0.0)).abs() < 1e-12);
    }

    #[test]
    fn unit_step_switches_at_t0() {
        let w = Waveform::UnitStep { amplitude: 1.0, t0: 5.0 };
        assert_eq!(w.sample(4.999), 0.0);
        assert_eq!(w.sample(5.0), 1.0);
    }

    #[test]
    fn gaussian_peaks_at_t0() {
        let w = Waveform::Gaussian { amplitude: 3.0, tau: 1.0, t0: 2.0 };
        assert!((w.sample(2.0) - 3.0).abs() < 1e-12);
        assert!(w.sample(0.0) < w.sample(1.5));
    }
}
