//! Per-timestep field update (spec §4.1 "Updator"). Grounded in
//! `src/fdtd/simulation.rs`'s leapfrog step, re-derived against the Yee
//! curl equations rather than that file's collocated-field scheme.
//!
//! Three static variants are selected once at init time by the grid's
//! [`crate::grid::Dimensionality`] (spec §9 "prefer a tagged enum over
//! `dyn Updator` on the hot per-step path"); a fourth variant defers to a
//! per-cell [`dispersive::DispersiveMethod`] for materials carrying a
//! [`crate::material::DispersiveModel`].

pub mod dispersive;

use nalgebra::{
    Point3,
    Vector3,
};

use crate::{
    coefficients::CoefficientTables,
    emf::{
        EComponent,
        Emf,
        HComponent,
    },
    material::MaterialTable,
    task::Task,
    updator::dispersive::DispersivePoles,
};

/// Inputs an [`Updator`] needs for one E-half-step or H-half-step, scoped to
/// a single task's sub-range of the local grid.
pub struct UpdateArgs<'a> {
    pub emf: &'a mut Emf,
    pub coeffs: &'a CoefficientTables,
    pub materials: &'a MaterialTable,
    pub poles: &'a mut DispersivePoles,
    pub local_size: Vector3<usize>,
    pub task: Task,
    pub dt: f64,
}

/// Advances the field by one half-step. Implementors update E given H (and
/// vice versa); [`Domain`](crate::domain::Domain) calls `update_h` then
/// `update_e` each timestep, per spec §4.4.
pub trait Updator: std::fmt::Debug {
    fn update_h(&self, args: &mut UpdateArgs<'_>);
    fn update_e(&self, args: &mut UpdateArgs<'_>);
}

/// Full 3-D Yee leapfrog, every component active.
#[derive(Clone, Copy, Debug, Default)]
pub struct Basic3D;

/// 2-D TE-mode reduction: the grid is one cell thick along one axis, so the
/// coefficient tables built by [`CoefficientTables::fill_from_materials`]
/// already zero the curl term that differences across that axis (its
/// tangential cell count is 1, so no neighbor exists). The stencil itself is
/// identical to [`Basic3D`].
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicTe;

/// 1-D TEM-mode reduction: two axes collapse to one cell; same stencil as
/// [`Basic3D`] with both corresponding curl terms zeroed by the coefficient
/// tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicTem;

impl Updator for Basic3D {
    fn update_h(&self, args: &mut UpdateArgs<'_>) {
        basic_update_h(args);
    }

    fn update_e(&self, args: &mut UpdateArgs<'_>) {
        basic_update_e(args);
    }
}

impl Updator for BasicTe {
    fn update_h(&self, args: &mut UpdateArgs<'_>) {
        basic_update_h(args);
    }

    fn update_e(&self, args: &mut UpdateArgs<'_>) {
        basic_update_e(args);
    }
}

impl Updator for BasicTem {
    fn update_h(&self, args: &mut UpdateArgs<'_>) {
        basic_update_h(args);
    }

    fn update_e(&self, args: &mut UpdateArgs<'_>) {
        basic_update_e(args);
    }
}

/// Wraps [`Basic3D`]'s stencil but, cell by cell, defers to the material's
/// dispersive method when one is attached (spec §4.1's `Dispersive3D`
/// variant, §4.5's "materials with attached dispersive models use the ADE
/// variant's coefficients instead").
#[derive(Clone, Copy, Debug, Default)]
pub struct Dispersive3D;

impl Updator for Dispersive3D {
    fn update_h(&self, args: &mut UpdateArgs<'_>) {
        basic_update_h(args);
    }

    fn update_e(&self, args: &mut UpdateArgs<'_>) {
        for component in EComponent::ALL {
            let axis = component.axis();
            let (ha, hb) = component.tangential_h();

            for point in args.task.cell_points() {
                let material = args.materials.material_at(point);
                let Some(model) = material.dispersion.as_ref()
                else {
                    update_e_cell(args.emf, args.coeffs, component, axis, ha, hb, point);
                    continue;
                };

                let curl = curl_h_term(args.emf, ha, hb, axis, point);
                let e_old = args.emf.e(component)[point];
                let prior = dispersive::poles_for(&*args.poles, model, component, point);
                let (e_new, j_updates) =
                    dispersive::update_e_with_dispersion(model, args.dt, e_old, curl, &prior);
                args.emf.e_mut(component)[point] = e_new;
                args.poles.store(component, point, j_updates);
            }
        }
    }
}

fn basic_update_h(args: &mut UpdateArgs<'_>) {
    for component in HComponent::ALL {
        let axis = component.axis();
        let (ea, eb) = component.tangential_e();
        let range = h_task_range(args.task, component.axis(), args.local_size);

        for point in range.cell_points() {
            let coeffs = args.coeffs.h(component);
            let self_ = coeffs.self_[point];
            let ca = coeffs.a[point];
            let cb = coeffs.b[point];

            let d_ea = curl_diff_forward(args.emf.e(ea), point, axis.next());
            let d_eb = curl_diff_forward(args.emf.e(eb), point, axis.prev());

            let h_old = args.emf.h(component)[point];
            args.emf.h_mut(component)[point] = self_ * h_old - ca * d_ea + cb * d_eb;
        }
    }
}

fn basic_update_e(args: &mut UpdateArgs<'_>) {
    for component in EComponent::ALL {
        let axis = component.axis();
        let (ha, hb) = component.tangential_h();
        for point in args.task.cell_points() {
            update_e_cell(args.emf, args.coeffs, component, axis, ha, hb, point);
        }
    }
}

fn update_e_cell(
    emf: &mut Emf,
    coeffs: &CoefficientTables,
    component: EComponent,
    axis: crate::grid::Axis,
    ha: HComponent,
    hb: HComponent,
    point: Point3<usize>,
) {
    let c = coeffs.e(component);
    let self_ = c.self_[point];
    let ca = c.a[point];
    let cb = c.b[point];

    let d_ha = curl_diff(emf.h(ha), point, axis.next());
    let d_hb = curl_diff(emf.h(hb), point, axis.prev());

    let e_old = emf.e(component)[point];
    emf.e_mut(component)[point] = self_ * e_old + ca * d_ha - cb * d_hb;
}

/// The bare curl term `(d_ha/d_axis.next - d_hb/d_axis.prev)` an E update
/// folds `c_e_self`/`ca`/`cb` around; used by the dispersive path, which
/// applies its own coefficients instead (spec §4.1 "Dispersive3D").
fn curl_h_term(
    emf: &Emf,
    ha: HComponent,
    hb: HComponent,
    axis: crate::grid::Axis,
    point: Point3<usize>,
) -> f64 {
    let d_ha = curl_diff(emf.h(ha), point, axis.next());
    let d_hb = curl_diff(emf.h(hb), point, axis.prev());
    d_ha - d_hb
}

/// `field[point] - field[point - 1]` along `axis`: the backward difference
/// an E-node curl term is built from (H sits one half-cell behind E).
fn curl_diff(field: &crate::lattice::Lattice3<f64>, point: Point3<usize>, axis: crate::grid::Axis) -> f64 {
    let mut prev = point;
    let c = axis.component_mut(&mut prev.coords);
    if *c == 0 {
        return field[point];
    }
    *c -= 1;
    field[point] - field[prev]
}

/// `field[point + 1] - field[point]` along `axis`: the forward difference an
/// H-node curl term is built from (E sits one half-cell ahead of H). Always
/// in bounds because every E array extends one cell further than its
/// tangential H components along each axis (spec §3 Yee shapes).
fn curl_diff_forward(field: &crate::lattice::Lattice3<f64>, point: Point3<usize>, axis: crate::grid::Axis) -> f64 {
    let mut next = point;
    *axis.component_mut(&mut next.coords) += 1;
    field[next] - field[point]
}

/// Extends `task`'s range by one along `axis` when the task owns the last
/// plane of the local grid on that axis, so the boundary-owning task alone
/// updates an H component's own-axis `+1` extension.
fn h_task_range(task: Task, axis: crate::grid::Axis, local_size: Vector3<usize>) -> Task {
    let mut end = task.end;
    if axis.component(&task.end.coords) == axis.component(&local_size) {
        *axis.component_mut(&mut end.coords) += 1;
    }
    Task { start: task.start, end }
}

impl Task {
    /// Iterates every cell-index point this task owns (x fastest).
    pub fn cell_points(&self) -> crate::lattice::PointIter {
        crate::lattice::Strider::new(self.end.coords).iter_range(self.start, self.end)
    }
}
