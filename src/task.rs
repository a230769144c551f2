//! Sub-range of the local grid assigned to one execution unit (spec
//! Glossary "Task"; spec §5 "Decomposition policy").

use nalgebra::{
    Point3,
    Vector3,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    error::{
        FdtdError,
        Result,
    },
    grid::Axis,
};

/// Half-open cell-index box `[start, end)` in local grid coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    pub start: Point3<usize>,
    pub end: Point3<usize>,
}

impl Task {
    pub fn whole(size: Vector3<usize>) -> Self {
        Self { start: Point3::origin(), end: Point3::from(size) }
    }

    pub fn intersects(&self, other: &Task) -> bool {
        Axis::ALL.iter().all(|axis| {
            axis.component(&self.start.coords) < axis.component(&other.end.coords)
                && axis.component(&other.start.coords) < axis.component(&self.end.coords)
        })
    }

    pub fn intersection(&self, other: &Task) -> Option<Task> {
        let start = Point3::new(
            self.start.x.max(other.start.x),
            self.start.y.max(other.start.y),
            self.start.z.max(other.start.z),
        );
        let end = Point3::new(
            self.end.x.min(other.end.x),
            self.end.y.min(other.end.y),
            self.end.z.min(other.end.z),
        );
        (start.x < end.x && start.y < end.y && start.z < end.z).then_some(Task { start, end })
    }

    pub fn volume(&self) -> usize {
        let d = self.end - self.start;
        d.x * d.y * d.z
    }

    pub fn contains(&self, point: &Point3<usize>) -> bool {
        Axis::ALL.iter().all(|axis| {
            let c = axis.component(&point.coords);
            axis.component(&self.start.coords) <= c && c < axis.component(&self.end.coords)
        })
    }
}

/// Which axes are split for thread/process decomposition (spec §5).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecompositionType {
    X,
    Y,
    Z,
    Xy,
    Xz,
    Yz,
    Xyz,
}

impl DecompositionType {
    pub fn parse(name: &str) -> Result<Self> {
        Ok(match name.to_ascii_uppercase().as_str() {
            "X" => Self::X,
            "Y" => Self::Y,
            "Z" => Self::Z,
            "XY" => Self::Xy,
            "XZ" => Self::Xz,
            "YZ" => Self::Yz,
            "XYZ" => Self::Xyz,
            other => return Err(FdtdError::UnknownDividerType { name: other.to_owned() }),
        })
    }

    pub fn axes(&self) -> &'static [Axis] {
        match self {
            Self::X => &[Axis::X],
            Self::Y => &[Axis::Y],
            Self::Z => &[Axis::Z],
            Self::Xy => &[Axis::X, Axis::Y],
            Self::Xz => &[Axis::X, Axis::Z],
            Self::Yz => &[Axis::Y, Axis::Z],
            Self::Xyz => &[Axis::X, Axis::Y, Axis::Z],
        }
    }
}

/// Splits `size` cells along one axis into `count` contiguous chunks,
/// equal-sized with the remainder distributed to low-indexed chunks.
pub fn split_axis(size: usize, count: usize) -> Vec<(usize, usize)> {
    if count == 0 {
        return vec![];
    }
    let base = size / count;
    let remainder = size % count;
    let mut chunks = Vec::with_capacity(count);
    let mut offset = 0;
    for i in 0..count {
        let len = base + if i < remainder { 1 } else { 0 };
        chunks.push((offset, offset + len));
        offset += len;
    }
    chunks
}

/// Decomposes the local grid into thread tasks along the requested axes,
/// using `num_x`/`num_y`/`num_z` divisions on the axes `decomposition`
/// selects (all other axes get one chunk). Tasks are non-overlapping and
/// exactly cover `local_size` by construction.
pub fn decompose(
    local_size: Vector3<usize>,
    decomposition: DecompositionType,
    num_x: usize,
    num_y: usize,
    num_z: usize,
) -> Vec<Task> {
    let counts = |axis: Axis| -> usize {
        if decomposition.axes().contains(&axis) {
            match axis {
                Axis::X => num_x.max(1),
                Axis::Y => num_y.max(1),
                Axis::Z => num_z.max(1),
            }
        }
        else {
            1
        }
    };

    let x_chunks = split_axis(local_size.x, counts(Axis::X));
    let y_chunks = split_axis(local_size.y, counts(Axis::Y));
    let z_chunks = split_axis(local_size.z, counts(Axis::Z));

    let mut tasks = Vec::with_capacity(x_chunks.len() * y_chunks.len() * z_chunks.len());
    for &(zs, ze) in &z_chunks {
        for &(ys, ye) in &y_chunks {
            for &(xs, xe) in &x_chunks {
                tasks.push(Task {
                    start: Point3::new(xs, ys, zs),
                    end: Point3::new(xe, ye, ze),
                });
            }
        }
    }
    tasks
}

/// Verifies the decomposition invariant from spec §5: tasks are pairwise
/// disjoint and their union covers `local_size` exactly (no hole, no
/// overlap).
pub fn check_coverage(tasks: &[Task], local_size: Vector3<usize>) -> Result<()> {
    let total_volume: usize = tasks.iter().map(Task::volume).sum();
    let expected = local_size.x * local_size.y * local_size.z;
    if total_volume != expected {
        return Err(FdtdError::TaskCoverageMismatch);
    }
    for (i, a) in tasks.iter().enumerate() {
        for b in &tasks[i + 1..] {
            if a.intersects(b) {
                return Err(FdtdError::TaskCoverageMismatch);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_axis_distributes_remainder_to_low_chunks() {
        assert_eq!(split_axis(10, 3), vec![(0, 4), (4, 7), (7, 10)]);
        assert_eq!(split_axis(9, 3), vec![(0, 3), (3, 6), (6, 9)]);
    }

    #[test]
    fn decomposition_covers_grid_exactly() {
        let size = Vector3::new(10, 7, 5);
        let tasks = decompose(size, DecompositionType::Xyz, 3, 2, 2);
        assert!(check_coverage(&tasks, size).is_ok());
    }

    #[test]
    fn single_axis_decomposition_only_splits_that_axis() {
        let size = Vector3::new(8, 8, 8);
        let tasks = decompose(size, DecompositionType::X, 4, 10, 10);
        assert_eq!(tasks.len(), 4);
        assert!(check_coverage(&tasks, size).is_ok());
    }
}
