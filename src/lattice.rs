//! Flat row-major 3-D array with a Yee-shape aware stride, generalizing the
//! teacher's `Strider`/`PointIter` (`cem-solver/src/fdtd/strider.rs`,
//! `cem-solver/src/fdtd/util.rs`) from a single fixed shape to one instance
//! per field component.

use std::ops::{
    Index,
    IndexMut,
};

use nalgebra::{
    Point3,
    Vector3,
    Vector4,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strider {
    strides: Vector4<usize>,
    size: Vector3<usize>,
}

impl Strider {
    pub fn new(size: Vector3<usize>) -> Self {
        Self {
            strides: strides_for_size(&size),
            size,
        }
    }

    pub fn size(&self) -> Vector3<usize> {
        self.size
    }

    pub fn len(&self) -> usize {
        self.strides.w
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_inside(&self, point: &Point3<usize>) -> bool {
        point.x < self.size.x && point.y < self.size.y && point.z < self.size.z
    }

    pub fn index(&self, point: &Point3<usize>) -> Option<usize> {
        self.is_inside(point).then(|| self.index_unchecked(point))
    }

    fn index_unchecked(&self, point: &Point3<usize>) -> usize {
        point.coords.dot(&self.strides.xyz())
    }

    pub fn point_unchecked(&self, mut index: usize) -> Point3<usize> {
        let z = index / self.strides.z;
        index %= self.strides.z;
        let y = index / self.strides.y;
        index %= self.strides.y;
        let x = index / self.strides.x;
        Point3::new(x, y, z)
    }

    /// Iterate all grid points in row-major (x fastest) order, optionally
    /// restricted to the half-open box `[lo, hi)`.
    pub fn iter_range(&self, lo: Point3<usize>, hi: Point3<usize>) -> PointIter {
        PointIter {
            lo,
            hi,
            next: (lo.x < hi.x && lo.y < hi.y && lo.z < hi.z).then_some(lo),
        }
    }

    pub fn iter(&self) -> PointIter {
        self.iter_range(Point3::origin(), Point3::from(self.size))
    }
}

fn strides_for_size(size: &Vector3<usize>) -> Vector4<usize> {
    let mut strides = Vector4::zeros();
    strides.x = 1;
    strides.y = strides.x * size.x;
    strides.z = strides.y * size.y;
    strides.w = strides.z * size.z;
    strides
}

#[derive(Clone, Copy, Debug)]
pub struct PointIter {
    lo: Point3<usize>,
    hi: Point3<usize>,
    next: Option<Point3<usize>>,
}

impl Iterator for PointIter {
    type Item = Point3<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        let mut n = current;
        n.x += 1;
        if n.x >= self.hi.x {
            n.x = self.lo.x;
            n.y += 1;
            if n.y >= self.hi.y {
                n.y = self.lo.y;
                n.z += 1;
                if n.z >= self.hi.z {
                    self.next = None;
                    return Some(current);
                }
            }
        }
        self.next = Some(n);
        Some(current)
    }
}

/// A flat, owned 3-D array of `T`, shaped per Yee component.
#[derive(Clone, Debug)]
pub struct Lattice3<T> {
    strider: Strider,
    data: Vec<T>,
}

impl<T: Clone + Default> Lattice3<T> {
    pub fn new(size: Vector3<usize>) -> Self {
        let strider = Strider::new(size);
        Self {
            data: vec![T::default(); strider.len()],
            strider,
        }
    }
}

impl<T> Lattice3<T> {
    pub fn from_fn(size: Vector3<usize>, mut f: impl FnMut(Point3<usize>) -> T) -> Self {
        let strider = Strider::new(size);
        let data = strider.iter().map(&mut f).collect();
        Self { strider, data }
    }

    pub fn strider(&self) -> &Strider {
        &self.strider
    }

    pub fn size(&self) -> Vector3<usize> {
        self.strider.size()
    }

    pub fn get(&self, point: &Point3<usize>) -> Option<&T> {
        self.strider.index(point).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, point: &Point3<usize>) -> Option<&mut T> {
        self.strider.index(point).map(|i| &mut self.data[i])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = (Point3<usize>, &T)> {
        self.strider.iter().map(move |p| (p, &self[p]))
    }
}

impl<T> Index<Point3<usize>> for Lattice3<T> {
    type Output = T;

    fn index(&self, point: Point3<usize>) -> &Self::Output {
        &self.data[self.strider.index(&point).expect("point outside lattice")]
    }
}

impl<T> IndexMut<Point3<usize>> for Lattice3<T> {
    fn index_mut(&mut self, point: Point3<usize>) -> &mut Self::Output {
        let index = self.strider.index(&point).expect("point outside lattice");
        &mut self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_indexes_row_major() {
        let strider = Strider::new(Vector3::new(2, 3, 1));
        assert_eq!(strider.index(&Point3::new(0, 0, 0)), Some(0));
        assert_eq!(strider.index(&Point3::new(1, 0, 0)), Some(1));
        assert_eq!(strider.index(&Point3::new(0, 1, 0)), Some(2));
        assert_eq!(strider.index(&Point3::new(1, 2, 0)), Some(5));
        assert_eq!(strider.index(&Point3::new(2, 0, 0)), None);
    }

    #[test]
    fn it_iterates_every_point_exactly_once() {
        let size = Vector3::new(3, 2, 2);
        let strider = Strider::new(size);
        let points: Vec<_> = strider.iter().collect();
        assert_eq!(points.len(), 12);
        let mut seen = std::collections::HashSet::new();
        for p in points {
            assert!(seen.insert((p.x, p.y, p.z)));
        }
    }

    #[test]
    fn lattice_round_trips_values() {
        let mut lattice = Lattice3::<f64>::new(Vector3::new(2, 2, 2));
        lattice[Point3::new(1, 1, 1)] = 42.0;
        assert_eq!(lattice[Point3::new(1, 1, 1)], 42.0);
        assert_eq!(lattice[Point3::new(0, 0, 0)], 0.0);
    }
}
