//! Hittable variants and the ray-object intersection record.
//!
//! Geometry lives in a flat arena (see `scene`); composite variants refer to
//! other nodes by `NodeId`. The self-contained primitives (`Sphere`, `Rect`)
//! intersect directly, everything else is resolved by the scene's traversal.

use crate::material::MaterialId;
use crate::scene::NodeId;
use std::f32::consts::PI;
use warp_math::{Aabb, Interval, Ray, Vec3};

/// Record of a ray-object intersection.
#[derive(Debug, Clone, Copy)]
pub struct HitRecord {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at the intersection (always points against the ray)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: MaterialId,
    /// Ray parameter of the intersection
    pub t: f32,
    /// UV surface coordinates
    pub u: f32,
    pub v: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl HitRecord {
    /// Set the face normal from the ray direction and the outward normal.
    ///
    /// The stored normal always points against the ray; `front_face` records
    /// which side was hit.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

/// A geometry arena entry.
///
/// Self-contained primitives carry their data inline; composites reference
/// earlier arena entries, so the graph is acyclic by construction order.
pub enum Hittable {
    Sphere(Sphere),
    Rect(Rect),
    /// Ordered collection; the closest hit wins regardless of order.
    List { children: Vec<NodeId> },
    /// Internal BVH node caching the union of its children's boxes.
    Bvh {
        left: NodeId,
        right: NodeId,
        bbox: Aabb,
    },
    /// Shift the wrapped node by a fixed offset.
    Translate { inner: NodeId, offset: Vec3 },
    /// Rotate the wrapped node about the Y axis by a fixed angle.
    RotateY {
        inner: NodeId,
        sin_theta: f32,
        cos_theta: f32,
        /// Conservative box over the rotated inner box, if the inner node
        /// has one.
        bbox: Option<Aabb>,
    },
    /// Homogeneous participating medium bounded by another node.
    Medium {
        boundary: NodeId,
        neg_inv_density: f32,
        phase: MaterialId,
    },
}

/// Sphere with a linearly moving center for motion blur.
///
/// A stationary sphere has `center0 == center1`.
pub struct Sphere {
    pub center0: Vec3,
    pub center1: Vec3,
    pub time0: f32,
    pub time1: f32,
    pub radius: f32,
    pub material: MaterialId,
}

impl Sphere {
    pub fn stationary(center: Vec3, radius: f32, material: MaterialId) -> Self {
        Self {
            center0: center,
            center1: center,
            time0: 0.0,
            time1: 1.0,
            radius,
            material,
        }
    }

    pub fn moving(
        center0: Vec3,
        center1: Vec3,
        time0: f32,
        time1: f32,
        radius: f32,
        material: MaterialId,
    ) -> Self {
        Self {
            center0,
            center1,
            time0,
            time1,
            radius,
            material,
        }
    }

    /// Center position at the given shutter time.
    pub fn center(&self, time: f32) -> Vec3 {
        if self.center0 == self.center1 {
            return self.center0;
        }
        self.center0
            + ((time - self.time0) / (self.time1 - self.time0)) * (self.center1 - self.center0)
    }

    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let center = self.center(ray.time());
        let oc = center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let p = ray.at(root);
        let outward_normal = (p - center) / self.radius;
        let (u, v) = sphere_uv(outward_normal);

        let mut rec = HitRecord {
            p,
            normal: Vec3::ZERO,
            material: self.material,
            t: root,
            u,
            v,
            front_face: false,
        };
        rec.set_face_normal(ray, outward_normal);
        Some(rec)
    }

    /// Box over the swept volume: union of the boxes at both shutter ends.
    pub fn bounding_box(&self) -> Aabb {
        let rvec = Vec3::splat(self.radius);
        let box0 = Aabb::from_corners(self.center0 - rvec, self.center0 + rvec);
        let box1 = Aabb::from_corners(self.center1 - rvec, self.center1 + rvec);
        Aabb::union(&box0, &box1)
    }
}

/// UV coordinates for a point on the unit sphere.
fn sphere_uv(p: Vec3) -> (f32, f32) {
    // theta: angle down from +Y, phi: angle around Y from +X
    let theta = (-p.y).acos();
    let phi = (-p.z).atan2(p.x) + PI;

    (phi / (2.0 * PI), theta / PI)
}

/// Orientation of an axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectPlane {
    Xy,
    Xz,
    Yz,
}

impl RectPlane {
    /// Indices of the (first in-plane, second in-plane, fixed) axes.
    #[inline]
    fn axes(self) -> (usize, usize, usize) {
        match self {
            RectPlane::Xy => (0, 1, 2),
            RectPlane::Xz => (0, 2, 1),
            RectPlane::Yz => (1, 2, 0),
        }
    }

    /// Outward normal along the fixed axis.
    #[inline]
    fn normal(self) -> Vec3 {
        match self {
            RectPlane::Xy => Vec3::Z,
            RectPlane::Xz => Vec3::Y,
            RectPlane::Yz => Vec3::X,
        }
    }
}

/// Axis-aligned rectangle: in-plane bounds [a0, a1] x [b0, b1] at fixed
/// coordinate k.
pub struct Rect {
    pub plane: RectPlane,
    pub a0: f32,
    pub a1: f32,
    pub b0: f32,
    pub b1: f32,
    pub k: f32,
    pub material: MaterialId,
}

impl Rect {
    pub fn new(
        plane: RectPlane,
        a0: f32,
        a1: f32,
        b0: f32,
        b1: f32,
        k: f32,
        material: MaterialId,
    ) -> Self {
        Self {
            plane,
            a0,
            a1,
            b0,
            b1,
            k,
            material,
        }
    }

    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let (ia, ib, ik) = self.plane.axes();

        let t = (self.k - ray.origin()[ik]) / ray.direction()[ik];
        if !ray_t.surrounds(t) {
            return None;
        }

        let a = ray.origin()[ia] + t * ray.direction()[ia];
        let b = ray.origin()[ib] + t * ray.direction()[ib];
        if a < self.a0 || a > self.a1 || b < self.b0 || b > self.b1 {
            return None;
        }

        let mut rec = HitRecord {
            p: ray.at(t),
            normal: Vec3::ZERO,
            material: self.material,
            t,
            u: (a - self.a0) / (self.a1 - self.a0),
            v: (b - self.b0) / (self.b1 - self.b0),
            front_face: false,
        };
        rec.set_face_normal(ray, self.plane.normal());
        Some(rec)
    }

    /// Thin box around the rectangle; the fixed axis gets padded.
    pub fn bounding_box(&self) -> Aabb {
        let (ia, ib, ik) = self.plane.axes();
        let mut min = Vec3::ZERO;
        let mut max = Vec3::ZERO;
        min[ia] = self.a0;
        max[ia] = self.a1;
        min[ib] = self.b0;
        max[ib] = self.b1;
        min[ik] = self.k;
        max[ik] = self.k;
        Aabb::from_corners(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_head_on_hit() {
        let sphere = Sphere::stationary(Vec3::ZERO, 1.0, MaterialId(0));
        let ray = Ray::at_time_zero(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);

        let rec = sphere
            .hit(&ray, Interval::new(0.001, f32::INFINITY))
            .expect("ray aimed at the sphere");
        assert_eq!(rec.t, 4.0);
        assert_eq!(rec.normal, Vec3::new(0.0, 0.0, -1.0));
        assert!(rec.front_face);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::stationary(Vec3::new(0.0, 0.0, -1.0), 0.5, MaterialId(0));
        let ray = Ray::at_time_zero(Vec3::ZERO, Vec3::Y);

        assert!(sphere.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_sphere_inner_root_when_inside() {
        let sphere = Sphere::stationary(Vec3::ZERO, 2.0, MaterialId(0));
        let ray = Ray::at_time_zero(Vec3::ZERO, Vec3::X);

        let rec = sphere
            .hit(&ray, Interval::new(0.001, f32::INFINITY))
            .expect("origin is inside the sphere");
        assert_eq!(rec.t, 2.0);
        // Back face: normal flipped against the ray
        assert!(!rec.front_face);
        assert_eq!(rec.normal, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_moving_sphere_center_interpolation() {
        let sphere = Sphere::moving(
            Vec3::ZERO,
            Vec3::new(0.0, 2.0, 0.0),
            0.0,
            1.0,
            0.5,
            MaterialId(0),
        );

        assert_eq!(sphere.center(0.0), Vec3::ZERO);
        assert_eq!(sphere.center(0.5), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(sphere.center(1.0), Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_moving_sphere_bbox_covers_sweep() {
        let sphere = Sphere::moving(
            Vec3::ZERO,
            Vec3::new(3.0, 0.0, 0.0),
            0.0,
            1.0,
            1.0,
            MaterialId(0),
        );

        let bbox = sphere.bounding_box();
        assert_eq!(bbox.min.x, -1.0);
        assert_eq!(bbox.max.x, 4.0);
    }

    #[test]
    fn test_rect_hit_and_uv() {
        let rect = Rect::new(RectPlane::Xy, 0.0, 2.0, 0.0, 4.0, -1.0, MaterialId(3));
        let ray = Ray::at_time_zero(Vec3::new(0.5, 1.0, 0.0), -Vec3::Z);

        let rec = rect
            .hit(&ray, Interval::new(0.001, f32::INFINITY))
            .expect("ray crosses the rectangle");
        assert_eq!(rec.t, 1.0);
        assert_eq!(rec.material, MaterialId(3));
        assert_eq!(rec.u, 0.25);
        assert_eq!(rec.v, 0.25);
        // Approaching +Z face from the front
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
    }

    #[test]
    fn test_rect_miss_outside_bounds() {
        let rect = Rect::new(RectPlane::Xz, 0.0, 1.0, 0.0, 1.0, 2.0, MaterialId(0));
        let ray = Ray::at_time_zero(Vec3::new(5.0, 0.0, 0.5), Vec3::Y);

        assert!(rect.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_rect_parallel_ray_misses() {
        let rect = Rect::new(RectPlane::Xy, 0.0, 1.0, 0.0, 1.0, 0.0, MaterialId(0));
        let ray = Ray::at_time_zero(Vec3::new(-1.0, 0.5, 0.0), Vec3::X);

        assert!(rect.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_rect_bbox_padded_on_fixed_axis() {
        let rect = Rect::new(RectPlane::Yz, 0.0, 1.0, 0.0, 1.0, 5.0, MaterialId(0));
        let bbox = rect.bounding_box();

        assert!(bbox.min.x < 5.0 && bbox.max.x > 5.0);
        assert_eq!(bbox.min.y, 0.0);
        assert_eq!(bbox.max.z, 1.0);
    }
}
