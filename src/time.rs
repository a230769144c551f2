//! Time parameter: `dt`, current step, end step (spec §3 "Time parameter").

use serde::{
    Deserialize,
    Serialize,
};

use crate::error::{
    FdtdError,
    Result,
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TimeParam {
    pub dt: f64,
    current_step: usize,
    pub end_step: usize,
}

impl TimeParam {
    /// `cfl` must be in `(0, 1]`; `dt` is derived as `cfl * dt_max`.
    pub fn new(dt_max: f64, cfl: f64, end_step: usize) -> Result<Self> {
        if !(cfl > 0.0 && cfl <= 1.0) {
            return Err(FdtdError::CflOutOfRange { cfl });
        }

        let dt = cfl * dt_max;
        Ok(Self { dt, current_step: 0, end_step })
    }

    pub fn check(&self, dt_max: f64) -> Result<()> {
        if self.dt > dt_max {
            return Err(FdtdError::CflViolated { dt: self.dt, dt_max });
        }
        Ok(())
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn is_done(&self) -> bool {
        self.current_step >= self.end_step
    }

    pub fn next_step(&mut self) {
        self.current_step += 1;
    }

    /// `t = n * dt`, the time H is sampled at.
    pub fn h_time(&self) -> f64 {
        self.current_step as f64 * self.dt
    }

    /// `t = (n + 1/2) * dt`, the time E is sampled at.
    pub fn e_time(&self) -> f64 {
        (self.current_step as f64 + 0.5) * self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_cfl_out_of_range() {
        assert!(matches!(
            TimeParam::new(1.0, 0.0, 10),
            Err(FdtdError::CflOutOfRange { .. })
        ));
        assert!(matches!(
            TimeParam::new(1.0, 1.5, 10),
            Err(FdtdError::CflOutOfRange { .. })
        ));
    }

    #[test]
    fn e_time_is_half_step_ahead_of_h_time() {
        let time = TimeParam::new(2.0, 0.5, 10).unwrap();
        assert_eq!(time.dt, 1.0);
        assert_eq!(time.h_time(), 0.0);
        assert_eq!(time.e_time(), 0.5);
    }

    #[test]
    fn advances_and_detects_done() {
        let mut time = TimeParam::new(1.0, 1.0, 2).unwrap();
        assert!(!time.is_done());
        time.next_step();
        assert!(!time.is_done());
        time.next_step();
        assert!(time.is_done());
    }
}
