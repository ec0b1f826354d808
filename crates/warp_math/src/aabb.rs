//! Axis-aligned bounding box for spatial acceleration.

use crate::{Interval, Ray, Vec3};

/// Axis-aligned bounding box, stored as min/max corner points.
///
/// Invariant: `min <= max` componentwise for any non-empty box. Axes that
/// would be degenerate (planar geometry) are padded to a minimum width so
/// the slab test stays well-behaved.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

/// Minimum extent of a box along any axis.
const PAD_DELTA: f32 = 0.0001;

impl Aabb {
    /// Create a box from two opposite corner points (any order).
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        let mut aabb = Self {
            min: a.min(b),
            max: a.max(b),
        };
        aabb.pad_to_minimums();
        aabb
    }

    /// The smallest box containing both inputs.
    pub fn union(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// Get the extent of the box along an axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, axis: usize) -> Interval {
        Interval::new(self.min[axis], self.max[axis])
    }

    /// Test if a ray intersects this box within the given t-interval.
    ///
    /// Slab method: the t-interval is narrowed against each axis in turn
    /// and the box is missed as soon as it becomes empty.
    pub fn hit(&self, r: &Ray, mut ray_t: Interval) -> bool {
        let ray_orig = r.origin();
        let ray_dir = r.direction();

        for axis in 0..3 {
            let adinv = 1.0 / ray_dir[axis];
            let mut t0 = (self.min[axis] - ray_orig[axis]) * adinv;
            let mut t1 = (self.max[axis] - ray_orig[axis]) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max <= ray_t.min {
                return false;
            }
        }

        true
    }

    /// Move the box by an offset vector.
    pub fn offset(&self, offset: Vec3) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let size = self.max - self.min;
        if size.x > size.y && size.x > size.z {
            0
        } else if size.y > size.z {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    fn pad_to_minimums(&mut self) {
        for axis in 0..3 {
            if self.max[axis] - self.min[axis] < PAD_DELTA {
                let padding = PAD_DELTA / 2.0;
                self.min[axis] -= padding;
                self.max[axis] += padding;
            }
        }
    }

    /// A box containing nothing; the identity for `union`.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };
}
