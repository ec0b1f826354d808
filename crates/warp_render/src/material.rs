//! Material table entries and scattering.
//!
//! Materials are closed variants in a flat table; a hit carries the
//! `MaterialId` and evaluation is an exhaustive match on the entry. Albedo
//! and emission sample the texture table.

use crate::hittable::HitRecord;
use crate::rng::{gen_f32, random_in_unit_sphere, random_unit_vector};
use crate::texture::{TextureId, TextureSet};
use crate::Color;
use rand::RngCore;
use warp_math::{Ray, Vec3};

/// Handle into the material table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialId(pub(crate) u32);

impl MaterialId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Result of a scattering event.
pub struct Scatter {
    pub attenuation: Color,
    pub ray: Ray,
}

/// A material table entry.
pub enum Material {
    /// Diffuse surface scattering into a cosine-weighted direction.
    Lambertian { albedo: TextureId },
    /// Specular reflection perturbed by a fuzz radius in [0, 1].
    Metal { albedo: Color, fuzz: f32 },
    /// Clear refractive surface with the given index of refraction.
    Dielectric { ir: f32 },
    /// Emitter; absorbs every incoming ray.
    DiffuseLight { emit: TextureId },
    /// Phase function for participating media; scatters uniformly.
    Isotropic { albedo: TextureId },
}

impl Material {
    /// Scatter an incoming ray at a hit.
    ///
    /// Returns `None` when the ray is absorbed. Scattered rays inherit the
    /// incoming ray's time.
    pub fn scatter(
        &self,
        textures: &TextureSet,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<Scatter> {
        match self {
            Material::Lambertian { albedo } => {
                let mut scatter_direction = rec.normal + random_unit_vector(rng);

                // Catch degenerate scatter direction
                if scatter_direction.length_squared() < 1e-8 {
                    scatter_direction = rec.normal;
                }

                Some(Scatter {
                    attenuation: textures.value(*albedo, rec.u, rec.v, rec.p),
                    ray: Ray::new(rec.p, scatter_direction, ray_in.time()),
                })
            }

            Material::Metal { albedo, fuzz } => {
                let reflected = reflect(ray_in.direction().normalize(), rec.normal);
                let direction = reflected + *fuzz * random_unit_vector(rng);

                // Absorbed when the perturbed ray leaves the surface hemisphere
                if direction.dot(rec.normal) > 0.0 {
                    Some(Scatter {
                        attenuation: *albedo,
                        ray: Ray::new(rec.p, direction, ray_in.time()),
                    })
                } else {
                    None
                }
            }

            Material::Dielectric { ir } => {
                let refraction_ratio = if rec.front_face { 1.0 / ir } else { *ir };

                let unit_direction = ray_in.direction().normalize();
                let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
                let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

                let cannot_refract = refraction_ratio * sin_theta > 1.0;
                let direction =
                    if cannot_refract || reflectance(cos_theta, refraction_ratio) > gen_f32(rng) {
                        reflect(unit_direction, rec.normal)
                    } else {
                        refract(unit_direction, rec.normal, refraction_ratio)
                    };

                Some(Scatter {
                    attenuation: Color::ONE,
                    ray: Ray::new(rec.p, direction, ray_in.time()),
                })
            }

            Material::DiffuseLight { .. } => None,

            Material::Isotropic { albedo } => Some(Scatter {
                attenuation: textures.value(*albedo, rec.u, rec.v, rec.p),
                ray: Ray::new(rec.p, random_in_unit_sphere(rng), ray_in.time()),
            }),
        }
    }

    /// Emitted radiance at the hit. Black for everything but lights.
    pub fn emitted(&self, textures: &TextureSet, u: f32, v: f32, p: Vec3) -> Color {
        match self {
            Material::DiffuseLight { emit } => textures.value(*emit, u, v, p),
            _ => Color::ZERO,
        }
    }
}

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a vector through a surface.
#[inline]
fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Schlick's approximation for reflectance.
#[inline]
fn reflectance(cosine: f32, ref_idx: f32) -> f32 {
    let r0 = ((1.0 - ref_idx) / (1.0 + ref_idx)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
