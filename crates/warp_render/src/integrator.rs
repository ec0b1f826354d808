//! Bounded, non-recursive path integrator.
//!
//! The rendering-equation recursion `L = Le + albedo * L_next` is unrolled
//! into two fixed-bound passes over per-depth record arrays: a forward pass
//! that traces up to `max_depth` bounces and records each event's emission
//! and attenuation, and a backward pass that folds the records deepest-first
//! into the final radiance. The loop never recurses and its memory footprint
//! is fixed at `MAX_DEPTH + 1` records per ray.

use crate::scene::Scene;
use crate::Color;
use rand::RngCore;
use warp_math::{Interval, Ray};

/// Hard bound on the number of bounces; `max_depth` is clamped to this.
pub const MAX_DEPTH: u32 = 50;

/// Self-intersection epsilon for secondary rays.
const T_MIN: f32 = 0.001;

/// Radiance carried back along a camera ray.
pub fn ray_color(
    scene: &Scene,
    ray: Ray,
    background: Color,
    max_depth: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let max_depth = max_depth.min(MAX_DEPTH) as usize;

    let mut emitted_rec = [Color::ZERO; MAX_DEPTH as usize + 1];
    let mut attenuation_rec = [Color::ZERO; MAX_DEPTH as usize + 1];

    // Forward pass: depth counts down from max_depth; every terminal event
    // records a sentinel pair and stops the walk.
    let mut r = ray;
    let mut depth = max_depth;
    loop {
        if depth == 0 {
            // Bounce budget exhausted: no more light is gathered
            emitted_rec[depth] = Color::ZERO;
            attenuation_rec[depth] = Color::ZERO;
            break;
        }

        let rec = match scene.hit(&r, Interval::new(T_MIN, f32::INFINITY), rng) {
            Some(rec) => rec,
            None => {
                emitted_rec[depth] = Color::ZERO;
                attenuation_rec[depth] = background;
                break;
            }
        };

        let material = scene.material(rec.material);
        let emitted = material.emitted(scene.textures(), rec.u, rec.v, rec.p);

        match material.scatter(scene.textures(), &r, &rec, rng) {
            None => {
                emitted_rec[depth] = emitted;
                attenuation_rec[depth] = Color::ZERO;
                break;
            }
            Some(scatter) => {
                emitted_rec[depth] = emitted;
                attenuation_rec[depth] = scatter.attenuation;
                r = scatter.ray;
                depth -= 1;
            }
        }
    }

    // Backward pass: fold the records from the terminal depth back up,
    // composing the recursion deepest-first.
    let mut color = Color::ONE;
    loop {
        color = emitted_rec[depth] + attenuation_rec[depth] * color;
        depth += 1;
        if depth > max_depth {
            break;
        }
    }

    color
}
