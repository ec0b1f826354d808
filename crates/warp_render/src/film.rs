//! Sample dispatch driver and persistent per-pixel state.
//!
//! The film owns the two buffers that survive across sample dispatches: the
//! RNG seed image and the running-mean accumulation image. One dispatch
//! evaluates every pixel once for a single sample index; dispatches run
//! strictly in sequence, so the in-place read-modify-write of the two images
//! needs no locking. Within a dispatch, pixels are independent lanes with no
//! cross-pixel interaction.

use std::time::Instant;

use crate::camera::Camera;
use crate::integrator::ray_color;
use crate::rng::{gen_f32, tea, SampleRng};
use crate::scene::Scene;
use crate::Color;
use log::info;
use rayon::prelude::*;

/// How a sample dispatch maps pixels onto the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Executor {
    /// Data-parallel over all cores.
    Parallel,
    /// Single-threaded, same evaluation order as the buffers.
    Serial,
}

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Samples per pixel
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Background color when a ray escapes the scene
    pub background: Color,
    pub executor: Executor,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 100,
            max_depth: 50,
            background: Color::ZERO,
            executor: Executor::Parallel,
        }
    }
}

/// Persistent per-pixel render state.
pub struct Film {
    width: u32,
    height: u32,
    /// Per-pixel RNG state, advanced by every dispatch
    seeds: Vec<u32>,
    /// Per-pixel running mean of all samples so far
    accum: Vec<Color>,
}

impl Film {
    /// Create a film; both images are initialized by the first dispatch.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            seeds: vec![0; len],
            accum: vec![Color::ZERO; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Accumulated color of the pixel at (x, y); row 0 is the top.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.accum[(y * self.width + x) as usize]
    }

    /// Gamma-corrected (square root) RGBA8 bytes, row-major, top row first.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let pixels: Vec<[u8; 4]> = self.accum.iter().map(|&c| color_to_rgba(c)).collect();
        bytemuck::cast_slice(&pixels).to_vec()
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to gamma-corrected 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * linear_to_gamma(color.x).clamp(0.0, 1.0)) as u8;
    let g = (255.0 * linear_to_gamma(color.y).clamp(0.0, 1.0)) as u8;
    let b = (255.0 * linear_to_gamma(color.z).clamp(0.0, 1.0)) as u8;
    [r, g, b, 255]
}

/// Dispatch one sample over every pixel of the film.
///
/// Sample 0 seeds the RNG image from the pixel coordinates and clears the
/// accumulation image; every sample folds its result into the running mean
/// in place. The mean update `accum += (color - accum) / (n + 1)` is exact
/// for identical inputs.
pub fn render_sample(
    film: &mut Film,
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
    sample_index: u32,
) {
    let width = film.width as usize;
    let height = film.height as usize;

    let kernel = |index: usize, seed: &mut u32, accum: &mut Color| {
        let x = (index % width) as u32;
        let y = (index / width) as u32;

        if sample_index == 0 {
            *seed = tea(x, y);
            *accum = Color::ZERO;
        }

        let mut rng = SampleRng::from_state(*seed);
        let s = (x as f32 + gen_f32(&mut rng)) / (width as f32 - 1.0);
        // Viewport t runs bottom-up, image rows top-down
        let t = ((height as u32 - 1 - y) as f32 + gen_f32(&mut rng)) / (height as f32 - 1.0);

        let ray = camera.get_ray(s, t, &mut rng);
        let color = ray_color(scene, ray, config.background, config.max_depth, &mut rng);

        *accum += (color - *accum) / (sample_index as f32 + 1.0);
        *seed = rng.state();
    };

    match config.executor {
        Executor::Parallel => {
            film.seeds
                .par_iter_mut()
                .zip(film.accum.par_iter_mut())
                .enumerate()
                .for_each(|(index, (seed, accum))| kernel(index, seed, accum));
        }
        Executor::Serial => {
            film.seeds
                .iter_mut()
                .zip(film.accum.iter_mut())
                .enumerate()
                .for_each(|(index, (seed, accum))| kernel(index, seed, accum));
        }
    }
}

/// Run all sample dispatches in sequence and return the converged film.
pub fn render(scene: &Scene, camera: &Camera, config: &RenderConfig, width: u32, height: u32) -> Film {
    let mut film = Film::new(width, height);
    let start = Instant::now();

    for sample_index in 0..config.samples_per_pixel {
        render_sample(&mut film, scene, camera, config, sample_index);
        info!(
            "Samples: {} / {} ({:.1}s)",
            sample_index + 1,
            config.samples_per_pixel,
            start.elapsed().as_secs_f32()
        );
    }

    film
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraBuilder;
    use crate::scene::SceneBuilder;
    use warp_math::Vec3;

    fn empty_scene() -> Scene {
        let mut builder = SceneBuilder::new();
        let root = builder.list(Vec::new());
        builder.build(root).unwrap()
    }

    fn test_camera() -> Camera {
        CameraBuilder::new()
            .with_view(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(90.0, 0.0, 1.0)
            .with_aspect_ratio(1.0)
            .build()
    }

    #[test]
    fn test_running_mean_is_exact_for_identical_samples() {
        // Every ray misses, so every sample of every pixel is exactly the
        // background color
        let scene = empty_scene();
        let camera = test_camera();
        let background = Color::new(0.3, 0.5, 0.7);
        let config = RenderConfig {
            samples_per_pixel: 7,
            max_depth: 50,
            background,
            executor: Executor::Serial,
        };

        let mut film = Film::new(4, 4);
        for sample_index in 0..config.samples_per_pixel {
            render_sample(&mut film, &scene, &camera, &config, sample_index);
        }

        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(film.pixel(x, y), background);
            }
        }
    }

    #[test]
    fn test_parallel_and_serial_agree() {
        let scene = empty_scene();
        let camera = test_camera();
        let background = Color::new(0.1, 0.2, 0.3);

        let mut serial = Film::new(8, 8);
        let mut parallel = Film::new(8, 8);
        for (film, executor) in [
            (&mut serial, Executor::Serial),
            (&mut parallel, Executor::Parallel),
        ] {
            let config = RenderConfig {
                samples_per_pixel: 3,
                max_depth: 10,
                background,
                executor,
            };
            for sample_index in 0..config.samples_per_pixel {
                render_sample(film, &scene, &camera, &config, sample_index);
            }
        }

        assert_eq!(serial.accum, parallel.accum);
        assert_eq!(serial.seeds, parallel.seeds);
    }

    #[test]
    fn test_first_dispatch_initializes_seed_image() {
        let scene = empty_scene();
        let camera = test_camera();
        let config = RenderConfig {
            executor: Executor::Serial,
            ..Default::default()
        };

        let mut film = Film::new(2, 2);
        render_sample(&mut film, &scene, &camera, &config, 0);

        // Seeds advanced past their tea() initialization and differ per pixel
        let mut seeds = film.seeds.clone();
        seeds.sort_unstable();
        seeds.dedup();
        assert_eq!(seeds.len(), 4);
    }

    #[test]
    fn test_color_to_rgba_gamma() {
        assert_eq!(color_to_rgba(Color::ZERO), [0, 0, 0, 255]);
        assert_eq!(color_to_rgba(Color::ONE), [255, 255, 255, 255]);
        // 0.25 linear -> 0.5 encoded
        let [r, _, _, _] = color_to_rgba(Color::new(0.25, 0.0, 0.0));
        assert_eq!(r, 127);
        // Out-of-range values clamp instead of wrapping
        assert_eq!(color_to_rgba(Color::splat(4.0))[0], 255);
    }

    #[test]
    fn test_to_rgba8_layout() {
        let mut film = Film::new(2, 1);
        film.accum[0] = Color::new(1.0, 0.0, 0.0);
        film.accum[1] = Color::new(0.0, 1.0, 0.0);

        let bytes = film.to_rgba8();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[0..4], &[255, 0, 0, 255]);
        assert_eq!(&bytes[4..8], &[0, 255, 0, 255]);
    }
}
