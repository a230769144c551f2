//! 3-D FDTD electromagnetic field solver core.
//!
//! Implements a Yee-grid leapfrog updator with CPML absorbing boundaries,
//! TFSF plane-wave injection, lumped circuit elements, first-order
//! dispersive media, and a domain-decomposed driver. Everything outside
//! that core numerical surface — geometry import, file formats, rendering,
//! UI — is out of scope; see `DESIGN.md`.

pub mod coefficients;
pub mod constants;
pub mod corrector;
pub mod domain;
pub mod emf;
pub mod error;
pub mod grid;
pub mod lattice;
pub mod material;
pub mod monitor;
pub mod parallel;
pub mod simulation;
pub mod task;
pub mod time;
pub mod updator;
pub mod waveform;

pub use error::{
    FdtdError,
    Result,
};
pub use simulation::{
    LumpedDescriptor,
    PmlBoundary,
    Simulation,
    SimulationConfig,
    TfsfDescriptor,
    ThreadConfig,
};

/// Installs a `tracing` subscriber reading `RUST_LOG`/`FDTD_LOG`, mirroring
/// `main.rs`'s own `tracing_subscriber::fmt::init()` call in its binary
/// entry point. Library consumers may call this once at startup, or install
/// their own subscriber and skip it entirely.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("FDTD_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
