//! Texture table and evaluation.
//!
//! Textures live in a flat, insertion-ordered table and reference each other
//! by `TextureId`. Child handles always precede their parents, so evaluation
//! never loops. The Perlin tables and decoded image buffers are shared
//! scene-level assets owned by the table.

use std::path::Path;

use crate::perlin::Perlin;
use crate::rng::{tea, SampleRng};
use crate::Color;
use thiserror::Error;
use warp_math::Vec3;

/// Octaves used by the noise texture's turbulence sum.
const TURBULENCE_DEPTH: u32 = 7;

/// Fallback color when an image texture has no pixel data.
const MISSING_IMAGE_COLOR: Color = Color::new(0.0, 1.0, 1.0);

/// Errors that can occur while loading texture assets.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Handle into the texture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureId(pub(crate) u32);

impl TextureId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A decoded RGBA8 pixel buffer.
pub struct PixelImage {
    width: u32,
    height: u32,
    /// Packed RGBA, row-major, top row first.
    pixels: Vec<u8>,
}

impl PixelImage {
    /// Decode an image file into an RGBA8 buffer.
    pub fn load(path: &Path) -> Result<Self, TextureError> {
        let decoded = image::open(path)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(Self {
            width,
            height,
            pixels: decoded.into_raw(),
        })
    }

    /// An image with no pixel data; sampling yields the debug color.
    pub fn missing() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    pub fn has_pixels(&self) -> bool {
        !self.pixels.is_empty()
    }

    /// Nearest-pixel lookup. u and v are clamped to [0, 1]; v is flipped to
    /// image-row order.
    pub fn sample_nearest(&self, u: f32, v: f32) -> Color {
        if !self.has_pixels() {
            return MISSING_IMAGE_COLOR;
        }

        let u = u.clamp(0.0, 1.0);
        let v = 1.0 - v.clamp(0.0, 1.0);

        let i = ((u * self.width as f32) as u32).min(self.width - 1);
        let j = ((v * self.height as f32) as u32).min(self.height - 1);

        let offset = ((j * self.width + i) * 4) as usize;
        let color_scale = 1.0 / 255.0;
        Color::new(
            color_scale * self.pixels[offset] as f32,
            color_scale * self.pixels[offset + 1] as f32,
            color_scale * self.pixels[offset + 2] as f32,
        )
    }
}

/// A texture table entry.
pub enum Texture {
    /// Constant color.
    Solid { color: Color },
    /// 3-D checker lattice choosing between two child textures.
    Checker { even: TextureId, odd: TextureId },
    /// Sine-modulated Perlin turbulence.
    Noise { scale: f32 },
    /// Nearest-sampled image lookup.
    Image { image: usize },
}

/// Flat texture table plus the shared noise/image assets.
pub struct TextureSet {
    textures: Vec<Texture>,
    images: Vec<PixelImage>,
    perlin: Perlin,
}

impl TextureSet {
    pub fn new() -> Self {
        // Fixed seed: the noise tables are part of the frozen scene, not of
        // the per-pixel sample stream.
        let mut rng = SampleRng::from_state(tea(0x9d2c_5680, 0x5f35_6495));
        Self {
            textures: Vec::new(),
            images: Vec::new(),
            perlin: Perlin::new(&mut rng),
        }
    }

    /// Add a texture, returning its handle. Child handles must already be in
    /// the table.
    pub fn add(&mut self, texture: Texture) -> TextureId {
        if let Texture::Checker { even, odd } = &texture {
            debug_assert!(even.index() < self.textures.len());
            debug_assert!(odd.index() < self.textures.len());
        }
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(texture);
        id
    }

    /// Add a decoded image buffer, returning its index for `Texture::Image`.
    pub fn add_image(&mut self, image: PixelImage) -> usize {
        self.images.push(image);
        self.images.len() - 1
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Evaluate a texture at surface coordinates (u, v) and point p.
    pub fn value(&self, id: TextureId, u: f32, v: f32, p: Vec3) -> Color {
        match &self.textures[id.index()] {
            Texture::Solid { color } => *color,

            Texture::Checker { even, odd } => {
                let sines = (10.0 * p.x).sin() * (10.0 * p.y).sin() * (10.0 * p.z).sin();
                if sines < 0.0 {
                    self.value(*odd, u, v, p)
                } else {
                    self.value(*even, u, v, p)
                }
            }

            Texture::Noise { scale } => {
                let s = 0.5 * (1.0 + (scale * p.z + 10.0 * self.perlin.turb(p, TURBULENCE_DEPTH)).sin());
                Color::splat(s)
            }

            Texture::Image { image } => match self.images.get(*image) {
                Some(img) => img.sample_nearest(u, v),
                None => MISSING_IMAGE_COLOR,
            },
        }
    }
}

impl Default for TextureSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_solid_value() {
        let mut set = TextureSet::new();
        let id = set.add(Texture::Solid {
            color: Color::new(0.2, 0.4, 0.8),
        });

        let c = set.value(id, 0.3, 0.7, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(c, Color::new(0.2, 0.4, 0.8));
    }

    #[test]
    fn test_checker_flips_between_cells() {
        let mut set = TextureSet::new();
        let even = set.add(Texture::Solid { color: Color::ONE });
        let odd = set.add(Texture::Solid { color: Color::ZERO });
        let id = set.add(Texture::Checker { even, odd });

        // sin(10x) at x = pi/20 is positive, at x = -pi/20 negative
        let half_cell = PI / 20.0;
        let a = set.value(id, 0.0, 0.0, Vec3::splat(half_cell));
        let b = set.value(id, 0.0, 0.0, Vec3::new(-half_cell, half_cell, half_cell));
        assert_ne!(a, b);
    }

    #[test]
    fn test_checker_constant_within_cell() {
        let mut set = TextureSet::new();
        let even = set.add(Texture::Solid { color: Color::ONE });
        let odd = set.add(Texture::Solid { color: Color::ZERO });
        let id = set.add(Texture::Checker { even, odd });

        let half_cell = PI / 10.0;
        let reference = set.value(id, 0.0, 0.0, Vec3::splat(half_cell * 0.5));
        for i in 1..9 {
            let p = Vec3::splat(half_cell * (i as f32 / 10.0));
            assert_eq!(set.value(id, 0.0, 0.0, p), reference);
        }
    }

    #[test]
    fn test_noise_value_in_unit_range() {
        let mut set = TextureSet::new();
        let id = set.add(Texture::Noise { scale: 4.0 });

        for i in 0..200 {
            let p = Vec3::new(i as f32 * 0.13, i as f32 * 0.29, i as f32 * 0.53);
            let c = set.value(id, 0.0, 0.0, p);
            assert!(c.x >= 0.0 && c.x <= 1.0);
            // Grayscale
            assert_eq!(c.x, c.y);
            assert_eq!(c.y, c.z);
        }
    }

    #[test]
    fn test_image_nearest_lookup_flips_v() {
        // 1x2 image: top row red, bottom row blue
        let img = PixelImage {
            width: 1,
            height: 2,
            pixels: vec![255, 0, 0, 255, 0, 0, 255, 255],
        };
        let mut set = TextureSet::new();
        let image = set.add_image(img);
        let id = set.add(Texture::Image { image });

        // v = 1 maps to the top row
        let top = set.value(id, 0.5, 1.0, Vec3::ZERO);
        let bottom = set.value(id, 0.5, 0.0, Vec3::ZERO);
        assert_eq!(top, Color::new(1.0, 0.0, 0.0));
        assert_eq!(bottom, Color::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_image_uv_clamped() {
        let img = PixelImage {
            width: 1,
            height: 1,
            pixels: vec![255, 255, 255, 255],
        };
        let mut set = TextureSet::new();
        let image = set.add_image(img);
        let id = set.add(Texture::Image { image });

        assert_eq!(set.value(id, -3.0, 7.5, Vec3::ZERO), Color::ONE);
    }

    #[test]
    fn test_missing_image_falls_back_to_debug_color() {
        let mut set = TextureSet::new();
        let image = set.add_image(PixelImage::missing());
        let id = set.add(Texture::Image { image });

        assert_eq!(set.value(id, 0.5, 0.5, Vec3::ZERO), MISSING_IMAGE_COLOR);
    }
}
