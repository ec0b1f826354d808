//! Warp - kernel-style CPU path tracing.
//!
//! A Monte Carlo path tracer structured the way a data-parallel device
//! kernel would be: the scene graph is frozen host-side into a flat arena
//! addressed by integer handles, materials and textures are dispatched by id
//! through closed enums, the light-transport loop is bounded and
//! non-recursive, and each sample is one ordered dispatch over the per-pixel
//! seed and accumulation images.

mod camera;
mod film;
mod hittable;
mod integrator;
mod material;
mod perlin;
mod rng;
mod scene;
mod texture;

pub use camera::{Camera, CameraBuilder};
pub use film::{
    color_to_rgba, linear_to_gamma, render, render_sample, Executor, Film, RenderConfig,
};
pub use hittable::{HitRecord, Hittable, Rect, RectPlane, Sphere};
pub use integrator::{ray_color, MAX_DEPTH};
pub use material::{Material, MaterialId, Scatter};
pub use perlin::Perlin;
pub use rng::{
    gen_f32, gen_range_f32, random_in_unit_disk, random_in_unit_sphere, random_unit_vector, tea,
    SampleRng,
};
pub use scene::{NodeId, Scene, SceneBuilder, SceneError};
pub use texture::{PixelImage, Texture, TextureError, TextureId, TextureSet};

/// Re-export the math types the public API is expressed in.
pub use warp_math::{Aabb, Interval, Ray, Vec3};

/// Color type alias (RGB components, typically in [0, 1])
pub type Color = Vec3;
