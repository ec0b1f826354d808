//! Scene arena, builder, and ray traversal.
//!
//! The whole object graph is frozen host-side before rendering: geometry
//! nodes live in one flat arena addressed by `NodeId`, materials and
//! textures in flat tables addressed by their ids. Builder methods only ever
//! hand out handles to entries already in the arena, so children precede
//! parents and the graph cannot contain cycles. Once `build` returns, the
//! scene is immutable; the render loop only reads it.

use std::cmp::Ordering;
use std::path::Path;

use crate::hittable::{HitRecord, Hittable, Rect, RectPlane, Sphere};
use crate::material::{Material, MaterialId};
use crate::rng::gen_f32;
use crate::texture::{PixelImage, Texture, TextureId, TextureSet};
use crate::Color;
use arrayvec::ArrayVec;
use log::{debug, warn};
use rand::RngCore;
use thiserror::Error;
use warp_math::{Aabb, Interval, Ray, Vec3};

/// Handle into the geometry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Capacity of the BVH traversal stack. Median splits keep the tree
/// balanced, so depth stays logarithmic in the leaf count; 64 frames cover
/// any scene that fits in memory.
const BVH_STACK_CAPACITY: usize = 64;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("root node handle {0} is out of range")]
    InvalidRoot(u32),
}

/// Accumulates geometry, materials, and textures, then freezes them into a
/// `Scene`.
pub struct SceneBuilder {
    nodes: Vec<Hittable>,
    materials: Vec<Material>,
    textures: TextureSet,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            materials: Vec::new(),
            textures: TextureSet::new(),
        }
    }

    // --- textures ---

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.add(texture)
    }

    pub fn solid(&mut self, color: Color) -> TextureId {
        self.add_texture(Texture::Solid { color })
    }

    pub fn checker(&mut self, even: TextureId, odd: TextureId) -> TextureId {
        self.add_texture(Texture::Checker { even, odd })
    }

    pub fn noise(&mut self, scale: f32) -> TextureId {
        self.add_texture(Texture::Noise { scale })
    }

    /// Image texture from a file. Decode failure is non-fatal: the texture
    /// falls back to the debug color and the failure is logged.
    pub fn image(&mut self, path: &Path) -> TextureId {
        let pixels = match PixelImage::load(path) {
            Ok(pixels) => pixels,
            Err(err) => {
                warn!("could not load texture image {}: {err}", path.display());
                PixelImage::missing()
            }
        };
        let image = self.textures.add_image(pixels);
        self.add_texture(Texture::Image { image })
    }

    // --- materials ---

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let material = match material {
            Material::Metal { albedo, fuzz } => Material::Metal {
                albedo,
                fuzz: fuzz.clamp(0.0, 1.0),
            },
            other => other,
        };
        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(material);
        id
    }

    pub fn lambertian(&mut self, albedo: Color) -> MaterialId {
        let albedo = self.solid(albedo);
        self.add_material(Material::Lambertian { albedo })
    }

    pub fn lambertian_textured(&mut self, albedo: TextureId) -> MaterialId {
        self.add_material(Material::Lambertian { albedo })
    }

    pub fn metal(&mut self, albedo: Color, fuzz: f32) -> MaterialId {
        self.add_material(Material::Metal { albedo, fuzz })
    }

    pub fn dielectric(&mut self, ir: f32) -> MaterialId {
        self.add_material(Material::Dielectric { ir })
    }

    pub fn diffuse_light(&mut self, emit: Color) -> MaterialId {
        let emit = self.solid(emit);
        self.add_material(Material::DiffuseLight { emit })
    }

    // --- geometry ---

    pub fn sphere(&mut self, center: Vec3, radius: f32, material: MaterialId) -> NodeId {
        self.push(Hittable::Sphere(Sphere::stationary(center, radius, material)))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn moving_sphere(
        &mut self,
        center0: Vec3,
        center1: Vec3,
        time0: f32,
        time1: f32,
        radius: f32,
        material: MaterialId,
    ) -> NodeId {
        self.push(Hittable::Sphere(Sphere::moving(
            center0, center1, time0, time1, radius, material,
        )))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rect(
        &mut self,
        plane: RectPlane,
        a0: f32,
        a1: f32,
        b0: f32,
        b1: f32,
        k: f32,
        material: MaterialId,
    ) -> NodeId {
        self.push(Hittable::Rect(Rect::new(plane, a0, a1, b0, b1, k, material)))
    }

    /// Axis-aligned box composed of six rectangles.
    pub fn cuboid(&mut self, p0: Vec3, p1: Vec3, material: MaterialId) -> NodeId {
        let faces = vec![
            self.rect(RectPlane::Xy, p0.x, p1.x, p0.y, p1.y, p1.z, material),
            self.rect(RectPlane::Xy, p0.x, p1.x, p0.y, p1.y, p0.z, material),
            self.rect(RectPlane::Xz, p0.x, p1.x, p0.z, p1.z, p1.y, material),
            self.rect(RectPlane::Xz, p0.x, p1.x, p0.z, p1.z, p0.y, material),
            self.rect(RectPlane::Yz, p0.y, p1.y, p0.z, p1.z, p1.x, material),
            self.rect(RectPlane::Yz, p0.y, p1.y, p0.z, p1.z, p0.x, material),
        ];
        self.push(Hittable::List { children: faces })
    }

    /// Homogeneous medium filling the boundary node, with an isotropic
    /// phase function of the given albedo.
    pub fn constant_medium(&mut self, boundary: NodeId, density: f32, albedo: Color) -> NodeId {
        let albedo = self.solid(albedo);
        let phase = self.add_material(Material::Isotropic { albedo });
        self.push(Hittable::Medium {
            boundary,
            neg_inv_density: -1.0 / density,
            phase,
        })
    }

    pub fn translate(&mut self, inner: NodeId, offset: Vec3) -> NodeId {
        self.push(Hittable::Translate { inner, offset })
    }

    /// Rotate a node about the Y axis by an angle in degrees. The bounding
    /// box of the rotated node is precomputed from the 8 rotated corners of
    /// the inner box (conservative, never tight).
    pub fn rotate_y(&mut self, inner: NodeId, degrees: f32) -> NodeId {
        let radians = degrees.to_radians();
        let sin_theta = radians.sin();
        let cos_theta = radians.cos();

        let bbox = node_bounding_box(&self.nodes, inner).map(|b| {
            let mut min = Vec3::INFINITY;
            let mut max = Vec3::NEG_INFINITY;
            for i in 0..2 {
                for j in 0..2 {
                    for k in 0..2 {
                        let x = i as f32 * b.max.x + (1 - i) as f32 * b.min.x;
                        let y = j as f32 * b.max.y + (1 - j) as f32 * b.min.y;
                        let z = k as f32 * b.max.z + (1 - k) as f32 * b.min.z;

                        let newx = cos_theta * x + sin_theta * z;
                        let newz = -sin_theta * x + cos_theta * z;

                        let tester = Vec3::new(newx, y, newz);
                        min = min.min(tester);
                        max = max.max(tester);
                    }
                }
            }
            Aabb::from_corners(min, max)
        });

        self.push(Hittable::RotateY {
            inner,
            sin_theta,
            cos_theta,
            bbox,
        })
    }

    pub fn list(&mut self, children: Vec<NodeId>) -> NodeId {
        self.push(Hittable::List { children })
    }

    /// Build a BVH over the given nodes and return its root.
    ///
    /// Falls back to a plain list when any member has no bounding box, so a
    /// degenerate input costs acceleration, never correctness.
    pub fn bvh(&mut self, children: &[NodeId]) -> NodeId {
        if children.is_empty() {
            return self.push(Hittable::List {
                children: Vec::new(),
            });
        }

        let mut entries = Vec::with_capacity(children.len());
        for &child in children {
            match node_bounding_box(&self.nodes, child) {
                Some(bbox) => entries.push((child, bbox)),
                None => {
                    warn!("BVH build: member without a bounding box, keeping a linear list");
                    return self.push(Hittable::List {
                        children: children.to_vec(),
                    });
                }
            }
        }

        self.build_bvh(&mut entries)
    }

    /// Recursive median split. Every entry is guaranteed to have a box.
    fn build_bvh(&mut self, entries: &mut [(NodeId, Aabb)]) -> NodeId {
        if entries.len() == 1 {
            return entries[0].0;
        }

        let mut bounds = Aabb::EMPTY;
        let mut centroid_bounds = Aabb::EMPTY;
        for (_, bbox) in entries.iter() {
            bounds = Aabb::union(&bounds, bbox);
            let c = bbox.centroid();
            centroid_bounds = Aabb::union(&centroid_bounds, &Aabb { min: c, max: c });
        }

        // Split along the axis with the widest centroid spread
        let axis = centroid_bounds.longest_axis();
        entries.sort_unstable_by(|a, b| {
            a.1.centroid()[axis]
                .partial_cmp(&b.1.centroid()[axis])
                .unwrap_or(Ordering::Equal)
        });

        let mid = entries.len() / 2;
        let (left_half, right_half) = entries.split_at_mut(mid);
        let left = self.build_bvh(left_half);
        let right = self.build_bvh(right_half);

        self.push(Hittable::Bvh { left, right, bbox: bounds })
    }

    /// Freeze the arena into an immutable scene rooted at the given node.
    pub fn build(self, root: NodeId) -> Result<Scene, SceneError> {
        if root.index() >= self.nodes.len() {
            return Err(SceneError::InvalidRoot(root.0));
        }

        debug!(
            "scene frozen: {} nodes, {} materials, {} textures",
            self.nodes.len(),
            self.materials.len(),
            self.textures.len()
        );

        Ok(Scene {
            nodes: self.nodes,
            materials: self.materials,
            textures: self.textures,
            root,
        })
    }

    fn push(&mut self, node: Hittable) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable scene: geometry arena, material and texture tables, root node.
pub struct Scene {
    nodes: Vec<Hittable>,
    materials: Vec<Material>,
    textures: TextureSet,
    root: NodeId,
}

impl Scene {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn textures(&self) -> &TextureSet {
        &self.textures
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Closest intersection of the ray with the scene, if any.
    pub fn hit(&self, ray: &Ray, ray_t: Interval, rng: &mut dyn RngCore) -> Option<HitRecord> {
        self.hit_node(self.root, ray, ray_t, rng)
    }

    /// Closest intersection against one arena node.
    pub fn hit_node(
        &self,
        id: NodeId,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord> {
        match &self.nodes[id.index()] {
            Hittable::Sphere(sphere) => sphere.hit(ray, ray_t),

            Hittable::Rect(rect) => rect.hit(ray, ray_t),

            Hittable::List { children } => {
                let mut closest = ray_t.max;
                let mut best = None;
                for &child in children {
                    if let Some(rec) = self.hit_node(child, ray, Interval::new(ray_t.min, closest), rng)
                    {
                        closest = rec.t;
                        best = Some(rec);
                    }
                }
                best
            }

            Hittable::Bvh { .. } => self.hit_bvh(id, ray, ray_t, rng),

            Hittable::Translate { inner, offset } => {
                let moved = Ray::new(ray.origin() - *offset, ray.direction(), ray.time());
                let mut rec = self.hit_node(*inner, &moved, ray_t, rng)?;
                rec.p += *offset;
                let normal = rec.normal;
                rec.set_face_normal(&moved, normal);
                Some(rec)
            }

            Hittable::RotateY {
                inner,
                sin_theta,
                cos_theta,
                ..
            } => {
                let (sin_theta, cos_theta) = (*sin_theta, *cos_theta);
                let o = ray.origin();
                let d = ray.direction();

                // World -> local: rotate by the negative angle
                let origin = Vec3::new(
                    cos_theta * o.x - sin_theta * o.z,
                    o.y,
                    sin_theta * o.x + cos_theta * o.z,
                );
                let direction = Vec3::new(
                    cos_theta * d.x - sin_theta * d.z,
                    d.y,
                    sin_theta * d.x + cos_theta * d.z,
                );
                let rotated = Ray::new(origin, direction, ray.time());

                let mut rec = self.hit_node(*inner, &rotated, ray_t, rng)?;

                // Local -> world
                let p = Vec3::new(
                    cos_theta * rec.p.x + sin_theta * rec.p.z,
                    rec.p.y,
                    -sin_theta * rec.p.x + cos_theta * rec.p.z,
                );
                let normal = Vec3::new(
                    cos_theta * rec.normal.x + sin_theta * rec.normal.z,
                    rec.normal.y,
                    -sin_theta * rec.normal.x + cos_theta * rec.normal.z,
                );

                rec.p = p;
                rec.set_face_normal(&rotated, normal);
                Some(rec)
            }

            Hittable::Medium {
                boundary,
                neg_inv_density,
                phase,
            } => {
                // Entry/exit span of the ray through the boundary, regardless
                // of which side the ray starts on
                let rec1 = self.hit_node(*boundary, ray, Interval::UNIVERSE, rng)?;
                let rec2 = self.hit_node(
                    *boundary,
                    ray,
                    Interval::new(rec1.t + 0.0001, f32::INFINITY),
                    rng,
                )?;

                let mut t_enter = rec1.t.max(ray_t.min);
                let t_exit = rec2.t.min(ray_t.max);
                if t_enter >= t_exit {
                    return None;
                }
                if t_enter < 0.0 {
                    t_enter = 0.0;
                }

                let ray_length = ray.direction().length();
                let distance_inside = (t_exit - t_enter) * ray_length;
                let hit_distance = *neg_inv_density * gen_f32(rng).ln();
                if hit_distance > distance_inside {
                    return None;
                }

                let t = t_enter + hit_distance / ray_length;
                Some(HitRecord {
                    p: ray.at(t),
                    // Arbitrary; scattering in the medium is isotropic
                    normal: Vec3::X,
                    material: *phase,
                    t,
                    u: 0.0,
                    v: 0.0,
                    front_face: true,
                })
            }
        }
    }

    /// Iterative BVH traversal over the arena with a fixed-capacity stack.
    ///
    /// Subtrees whose cached box misses the (shrinking) interval are pruned;
    /// everything that survives is intersected exactly like the linear scan,
    /// so the closest hit is identical to brute force.
    fn hit_bvh(
        &self,
        root: NodeId,
        ray: &Ray,
        ray_t: Interval,
        rng: &mut dyn RngCore,
    ) -> Option<HitRecord> {
        let mut stack: ArrayVec<NodeId, BVH_STACK_CAPACITY> = ArrayVec::new();
        stack.push(root);

        let mut closest = ray_t.max;
        let mut best = None;

        while let Some(id) = stack.pop() {
            match &self.nodes[id.index()] {
                Hittable::Bvh { left, right, bbox } => {
                    if bbox.hit(ray, Interval::new(ray_t.min, closest)) {
                        stack.push(*left);
                        stack.push(*right);
                    }
                }
                _ => {
                    if let Some(rec) =
                        self.hit_node(id, ray, Interval::new(ray_t.min, closest), rng)
                    {
                        closest = rec.t;
                        best = Some(rec);
                    }
                }
            }
        }

        best
    }

    /// Bounding box of a node, if it has one.
    pub fn bounding_box(&self, id: NodeId) -> Option<Aabb> {
        node_bounding_box(&self.nodes, id)
    }
}

/// Bounding box of an arena node. `None` propagates from any member of a
/// composite, which makes the caller skip acceleration for that subtree.
fn node_bounding_box(nodes: &[Hittable], id: NodeId) -> Option<Aabb> {
    match &nodes[id.index()] {
        Hittable::Sphere(sphere) => Some(sphere.bounding_box()),
        Hittable::Rect(rect) => Some(rect.bounding_box()),
        Hittable::List { children } => {
            if children.is_empty() {
                return None;
            }
            let mut bbox = Aabb::EMPTY;
            for &child in children {
                bbox = Aabb::union(&bbox, &node_bounding_box(nodes, child)?);
            }
            Some(bbox)
        }
        Hittable::Bvh { bbox, .. } => Some(*bbox),
        Hittable::Translate { inner, offset } => {
            node_bounding_box(nodes, *inner).map(|b| b.offset(*offset))
        }
        Hittable::RotateY { bbox, .. } => *bbox,
        Hittable::Medium { boundary, .. } => node_bounding_box(nodes, *boundary),
    }
}
