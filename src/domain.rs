//! Per-thread worker owning a sub-task (spec §2 item 8, §4.4). Grounded in
//! `examples/original_source/src/domain/domain.cpp`'s `run()` loop, which
//! the fixed fourteen-step sequence below reproduces step for step.

use nalgebra::{
    Point3,
    Vector3,
};

use crate::{
    coefficients::CoefficientTables,
    corrector::CorrectorSet,
    emf::{
        Emf,
        HComponent,
    },
    grid::{
        Face,
        GridSpace,
    },
    lattice::Strider,
    material::MaterialTable,
    monitor::Monitor,
    parallel::{
        ProcessGroup,
        ThreadBarrier,
    },
    task::Task,
    time::TimeParam,
    updator::{
        Updator,
        UpdateArgs,
        dispersive::DispersivePoles,
    },
};

/// One of [`crate::updator`]'s four static variants, picked once at init by
/// dimensionality and material composition (spec §4.1, §9 "prefer tagged
/// variants with static dispatch inside the hot loop").
#[derive(Clone, Copy, Debug)]
pub enum UpdatorKind {
    Basic3D(crate::updator::Basic3D),
    BasicTe(crate::updator::BasicTe),
    BasicTem(crate::updator::BasicTem),
    Dispersive3D(crate::updator::Dispersive3D),
}

impl Updator for UpdatorKind {
    fn update_h(&self, args: &mut UpdateArgs<'_>) {
        match self {
            Self::Basic3D(u) => u.update_h(args),
            Self::BasicTe(u) => u.update_h(args),
            Self::BasicTem(u) => u.update_h(args),
            Self::Dispersive3D(u) => u.update_h(args),
        }
    }

    fn update_e(&self, args: &mut UpdateArgs<'_>) {
        match self {
            Self::Basic3D(u) => u.update_e(args),
            Self::BasicTe(u) => u.update_e(args),
            Self::BasicTem(u) => u.update_e(args),
            Self::Dispersive3D(u) => u.update_e(args),
        }
    }
}

/// A sub-task plus the updator/correctors/monitors that operate on it.
/// `Domain` never owns the shared field/coefficient arrays (spec §3
/// "Ownership": the driver owns those; domains borrow); each step method
/// takes them by reference from [`crate::simulation::Simulation`].
#[derive(Debug)]
pub struct Domain {
    pub task: Task,
    pub updator: UpdatorKind,
    pub correctors: CorrectorSet,
    pub monitors: Vec<Box<dyn Monitor>>,
    /// True only for thread 0 of the root process: the sole domain allowed
    /// to advance the shared time counter or emit progress (spec §4.4).
    pub is_master: bool,
}

impl Domain {
    pub fn new(task: Task, updator: UpdatorKind) -> Self {
        Self { task, updator, correctors: CorrectorSet::new(), monitors: Vec::new(), is_master: false }
    }

    fn update_args<'a>(
        &self,
        emf: &'a mut Emf,
        coeffs: &'a CoefficientTables,
        materials: &'a MaterialTable,
        poles: &'a mut DispersivePoles,
        local_size: nalgebra::Vector3<usize>,
        dt: f64,
    ) -> UpdateArgs<'a> {
        UpdateArgs { emf, coeffs, materials, poles, local_size, task: self.task, dt }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_h(
        &self,
        emf: &mut Emf,
        coeffs: &CoefficientTables,
        materials: &MaterialTable,
        poles: &mut DispersivePoles,
        local_size: nalgebra::Vector3<usize>,
        dt: f64,
    ) {
        let mut args = self.update_args(emf, coeffs, materials, poles, local_size, dt);
        self.updator.update_h(&mut args);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_e(
        &self,
        emf: &mut Emf,
        coeffs: &CoefficientTables,
        materials: &MaterialTable,
        poles: &mut DispersivePoles,
        local_size: nalgebra::Vector3<usize>,
        dt: f64,
    ) {
        let mut args = self.update_args(emf, coeffs, materials, poles, local_size, dt);
        self.updator.update_e(&mut args);
    }

    pub fn correct_h(&mut self, emf: &mut Emf, coeffs: &CoefficientTables, time: &TimeParam) {
        self.correctors.after_update_h(emf, coeffs, time);
    }

    pub fn correct_e(&mut self, emf: &mut Emf, coeffs: &CoefficientTables, time: &TimeParam) {
        self.correctors.after_update_e(emf, coeffs, time);
    }

    pub fn record(&mut self, emf: &Emf, time: &TimeParam) {
        for monitor in &mut self.monitors {
            monitor.record(emf, time);
        }
    }
}

/// The one-cell layer of a face, in the shape of `component`'s array.
fn face_layer(shape: Vector3<usize>, face: Face) -> (Strider, Point3<usize>, Point3<usize>) {
    let strider = Strider::new(shape);
    let layer = if face.negative { 0 } else { face.axis.component(&shape).saturating_sub(1) };
    let mut lo = Point3::origin();
    let mut hi = Point3::from(shape);
    *face.axis.component_mut(&mut lo.coords) = layer;
    *face.axis.component_mut(&mut hi.coords) = layer + 1;
    (strider, lo, hi)
}

/// Gathers the tangential-H cells on every face this process does not own
/// the global boundary of, keyed by `Face::ALL`'s index (stands in for a
/// neighbor rank until [`GridSpace`] supports a real multi-process
/// decomposition — see `DESIGN.md`). With the single-process decomposition
/// `GridSpace` builds today, [`GridSpace::owns_global_face`] is true for
/// every face, so this always gathers nothing; the computation is still
/// driven by actual grid state rather than a hardcoded empty payload.
fn collect_h_halo(emf: &Emf, grid: &GridSpace) -> Vec<(usize, Vec<f64>)> {
    let mut outgoing = Vec::new();
    for (neighbor, face) in Face::ALL.into_iter().enumerate() {
        if grid.owns_global_face(face) {
            continue;
        }
        let mut payload = Vec::new();
        for component in HComponent::ALL {
            if component.axis() == face.axis {
                continue;
            }
            let shape = component.shape(grid.local_size);
            let (strider, lo, hi) = face_layer(shape, face);
            let lattice = emf.h(component);
            for point in strider.iter_range(lo, hi) {
                payload.push(lattice[point]);
            }
        }
        outgoing.push((neighbor, payload));
    }
    outgoing
}

/// Writes back what [`collect_h_halo`] sent to neighbors, in the same
/// per-face, per-component order.
fn apply_h_halo(emf: &mut Emf, grid: &GridSpace, incoming: Vec<(usize, Vec<f64>)>) {
    for (neighbor, payload) in incoming {
        let Some(face) = Face::ALL.get(neighbor).copied() else { continue };
        let mut cursor = payload.into_iter();
        for component in HComponent::ALL {
            if component.axis() == face.axis {
                continue;
            }
            let shape = component.shape(grid.local_size);
            let (strider, lo, hi) = face_layer(shape, face);
            let lattice = emf.h_mut(component);
            for point in strider.iter_range(lo, hi) {
                let Some(value) = cursor.next() else { break };
                lattice[point] = value;
            }
        }
    }
}

/// Drives every domain in a process through the fixed fourteen-step
/// sequence (spec §4.4) for one time step. Domain sub-tasks write disjoint
/// cells, so they run one after another on the calling thread rather than
/// on separate OS threads (see `DESIGN.md` for why real per-task OS-thread
/// concurrency was not attempted); `barrier` and `processes` are still
/// driven at every suspension point spec §5 names, so a future multi-thread
/// executor can slot in without changing this sequence.
#[allow(clippy::too_many_arguments)]
pub fn run_step(
    domains: &mut [Domain],
    emf: &mut Emf,
    coeffs: &CoefficientTables,
    materials: &MaterialTable,
    poles: &mut DispersivePoles,
    grid: &GridSpace,
    local_size: nalgebra::Vector3<usize>,
    time: &mut TimeParam,
    barrier: &ThreadBarrier,
    processes: &dyn ProcessGroup,
) -> Result<(), crate::error::FdtdError> {
    let dt = time.dt;

    for domain in domains.iter() {
        domain.update_h(emf, coeffs, materials, poles, local_size, dt);
    }
    barrier.wait();

    for domain in domains.iter_mut() {
        domain.correct_h(emf, coeffs, time);
    }
    processes.barrier();
    let outgoing = collect_h_halo(emf, grid);
    let incoming = processes.halo_exchange(outgoing)?;
    apply_h_halo(emf, grid, incoming);
    processes.barrier();

    for domain in domains.iter() {
        domain.update_e(emf, coeffs, materials, poles, local_size, dt);
    }
    barrier.wait();

    for domain in domains.iter_mut() {
        domain.correct_e(emf, coeffs, time);
    }
    barrier.wait();

    for domain in domains.iter_mut() {
        domain.record(emf, time);
    }
    processes.barrier();

    if processes.rank() == 0
        && let Some(master) = domains.iter().find(|d| d.is_master)
    {
        let _ = master;
        time.next_step();
        tracing::info!(step = time.current_step(), "advanced fdtd time step");
    }
    barrier.wait();

    Ok(())
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;
    use crate::{
        material::MaterialTable,
        parallel::SingleProcessGroup,
    };

    #[test]
    fn run_step_advances_time_counter_once() {
        let local_size = Vector3::new(2, 2, 2);
        let grid = GridSpace::new_single_process(Vector3::repeat(1.0), local_size).unwrap();
        let mut emf = Emf::new(local_size);
        let coeffs = CoefficientTables::new(local_size);
        let materials = MaterialTable::new(local_size);
        let mut poles = DispersivePoles::new();
        let mut time = TimeParam::new(1.0, 1.0, 5).unwrap();
        let barrier = ThreadBarrier::new(1);
        let processes = SingleProcessGroup;

        let mut domain = Domain::new(Task::whole(local_size), UpdatorKind::Basic3D(crate::updator::Basic3D));
        domain.is_master = true;
        let mut domains = vec![domain];

        assert_eq!(time.current_step(), 0);
        run_step(
            &mut domains,
            &mut emf,
            &coeffs,
            &materials,
            &mut poles,
            &grid,
            local_size,
            &mut time,
            &barrier,
            &processes,
        )
        .unwrap();
        assert_eq!(time.current_step(), 1);
    }

    #[test]
    fn non_master_rank_never_advances_time() {
        let local_size = Vector3::new(2, 2, 2);
        let grid = GridSpace::new_single_process(Vector3::repeat(1.0), local_size).unwrap();
        let mut emf = Emf::new(local_size);
        let coeffs = CoefficientTables::new(local_size);
        let materials = MaterialTable::new(local_size);
        let mut poles = DispersivePoles::new();
        let mut time = TimeParam::new(1.0, 1.0, 5).unwrap();
        let barrier = ThreadBarrier::new(1);

        #[derive(Debug)]
        struct RankOneGroup;
        impl ProcessGroup for RankOneGroup {
            fn rank(&self) -> usize {
                1
            }
            fn size(&self) -> usize {
                2
            }
            fn barrier(&self) {}
            fn halo_exchange(
                &self,
                _outgoing: Vec<(usize, Vec<f64>)>,
            ) -> crate::error::Result<Vec<(usize, Vec<f64>)>> {
                Ok(Vec::new())
            }
        }

        let mut domain = Domain::new(Task::whole(local_size), UpdatorKind::Basic3D(crate::updator::Basic3D));
        domain.is_master = true;
        let mut domains = vec![domain];

        run_step(
            &mut domains,
            &mut emf,
            &coeffs,
            &materials,
            &mut poles,
            &grid,
            local_size,
            &mut time,
            &barrier,
            &RankOneGroup,
        )
        .unwrap();
        assert_eq!(time.current_step(), 0);
    }

    #[test]
    fn halo_round_trip_is_a_no_op_on_a_single_process_grid() {
        let local_size = Vector3::new(4, 4, 4);
        let grid = GridSpace::new_single_process(Vector3::repeat(1.0), local_size).unwrap();
        let mut emf = Emf::new(local_size);
        emf.hz[nalgebra::Point3::new(0, 0, 0)] = 7.0;

        let outgoing = collect_h_halo(&emf, &grid);
        assert!(outgoing.is_empty(), "a single-process grid owns every global face");

        let before = emf.hz[nalgebra::Point3::new(0, 0, 0)];
        apply_h_halo(&mut emf, &grid, Vec::new());
        assert_eq!(emf.hz[nalgebra::Point3::new(0, 0, 0)], before);
    }
}
