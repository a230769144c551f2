//! Error kinds surfaced by the core (spec §7).
//!
//! Every init-time failure is fatal and propagates to the caller of
//! [`crate::simulation::Simulation::run`]. Nothing is raised inside the time
//! loop itself.

use thiserror::Error;

use crate::grid::Axis;

#[derive(Debug, Error)]
pub enum FdtdError {
    #[error("CFL number {cfl} is out of range (0, 1]")]
    CflOutOfRange { cfl: f64 },

    #[error("time step {dt} exceeds the CFL-limited maximum {dt_max}")]
    CflViolated { dt: f64, dt_max: f64 },

    #[error("PML thickness {thickness} is less than 1 cell")]
    PmlThicknessTooSmall { thickness: usize },

    #[error("PML cannot be placed on axis {axis:?} for a {dimensionality}-D simulation")]
    PmlAxisMismatch { axis: Axis, dimensionality: u8 },

    #[error("cell size along {axis:?} must be positive, got {value}")]
    NonPositiveCellSize { axis: Axis, value: f64 },

    #[error(
        "thread_config product {product} does not match requested thread count {requested}"
    )]
    ThreadProductMismatch { product: usize, requested: usize },

    #[error("mpi_parallel_dim product {product} does not match process count {processes}")]
    ProcessProductMismatch { product: usize, processes: usize },

    #[error("unknown decomposition divider type {name:?}")]
    UnknownDividerType { name: String },

    #[error("no objects have been added to the simulation")]
    EmptyObjectList,

    #[error("no master domain was created during decomposition")]
    NoMasterDomain,

    #[error("task decomposition does not exactly cover the local grid (hole or overlap)")]
    TaskCoverageMismatch,

    #[error("lumped element has zero cells along its main axis (Nc = 0)")]
    LumpedElementDegenerate,

    #[error("updator variant {variant:?} does not support dispersive materials in {dimensionality}-D")]
    UnsupportedDispersiveUpdator { variant: &'static str, dimensionality: u8 },

    #[error("failed to create MPI-equivalent send/recv transport: {reason}")]
    TransportCreationFailed { reason: String },

    #[error("halo exchange send/recv did not complete: {reason}")]
    HaloExchangeFailed { reason: String },

    #[error("run() was already called on this simulation; it may only run once")]
    AlreadyRun,

    #[error("mpi_parallel_dim {requested:?} requires true multi-process grid decomposition, which this build does not implement")]
    MultiProcessUnsupported { requested: nalgebra::Vector3<usize> },
}

pub type Result<T> = std::result::Result<T, FdtdError>;
