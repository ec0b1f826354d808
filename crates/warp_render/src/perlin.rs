//! Perlin gradient noise with precomputed permutation tables.
//!
//! The tables are generated once at scene-build time and are read-only for
//! the rest of the run.

use crate::rng::{gen_range_f32, SampleRng};
use rand::RngCore;
use warp_math::Vec3;

const POINT_COUNT: usize = 256;

/// Gradient noise over precomputed random tables.
pub struct Perlin {
    ranvec: Vec<Vec3>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    pub fn new(rng: &mut SampleRng) -> Self {
        let ranvec = (0..POINT_COUNT)
            .map(|_| {
                Vec3::new(
                    gen_range_f32(rng, -1.0, 1.0),
                    gen_range_f32(rng, -1.0, 1.0),
                    gen_range_f32(rng, -1.0, 1.0),
                )
                .normalize()
            })
            .collect();

        Self {
            ranvec,
            perm_x: generate_perm(rng),
            perm_y: generate_perm(rng),
            perm_z: generate_perm(rng),
        }
    }

    /// Gradient noise in [-1, 1].
    pub fn noise(&self, p: Vec3) -> f32 {
        let u = p.x - p.x.floor();
        let v = p.y - p.y.floor();
        let w = p.z - p.z.floor();

        let i = p.x.floor() as i32;
        let j = p.y.floor() as i32;
        let k = p.z.floor() as i32;

        let mut c = [[[Vec3::ZERO; 2]; 2]; 2];
        for (di, plane) in c.iter_mut().enumerate() {
            for (dj, row) in plane.iter_mut().enumerate() {
                for (dk, cell) in row.iter_mut().enumerate() {
                    *cell = self.ranvec[self.perm_x[((i + di as i32) & 255) as usize]
                        ^ self.perm_y[((j + dj as i32) & 255) as usize]
                        ^ self.perm_z[((k + dk as i32) & 255) as usize]];
                }
            }
        }

        trilinear_interp(&c, u, v, w)
    }

    /// Multi-octave sum of absolute noise values.
    pub fn turb(&self, p: Vec3, depth: u32) -> f32 {
        let mut accum = 0.0;
        let mut temp_p = p;
        let mut weight = 1.0;

        for _ in 0..depth {
            accum += weight * self.noise(temp_p);
            weight *= 0.5;
            temp_p *= 2.0;
        }

        accum.abs()
    }
}

fn generate_perm(rng: &mut SampleRng) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..POINT_COUNT).collect();

    // Fisher-Yates
    for i in (1..POINT_COUNT).rev() {
        let target = (rng.next_u32() as usize) % (i + 1);
        perm.swap(i, target);
    }

    perm
}

fn trilinear_interp(c: &[[[Vec3; 2]; 2]; 2], u: f32, v: f32, w: f32) -> f32 {
    // Hermitian smoothing of the lattice weights
    let uu = u * u * (3.0 - 2.0 * u);
    let vv = v * v * (3.0 - 2.0 * v);
    let ww = w * w * (3.0 - 2.0 * w);

    let mut accum = 0.0;
    for (i, plane) in c.iter().enumerate() {
        for (j, row) in plane.iter().enumerate() {
            for (k, cell) in row.iter().enumerate() {
                let (fi, fj, fk) = (i as f32, j as f32, k as f32);
                let weight_v = Vec3::new(u - fi, v - fj, w - fk);
                accum += (fi * uu + (1.0 - fi) * (1.0 - uu))
                    * (fj * vv + (1.0 - fj) * (1.0 - vv))
                    * (fk * ww + (1.0 - fk) * (1.0 - ww))
                    * cell.dot(weight_v);
            }
        }
    }

    accum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::tea;

    fn test_perlin() -> Perlin {
        let mut rng = SampleRng::from_state(tea(17, 29));
        Perlin::new(&mut rng)
    }

    #[test]
    fn test_noise_range() {
        let perlin = test_perlin();
        for i in 0..500 {
            let p = Vec3::new(i as f32 * 0.37, i as f32 * 0.11, i as f32 * 0.71);
            let n = perlin.noise(p);
            assert!((-1.0..=1.0).contains(&n), "noise out of range: {n}");
        }
    }

    #[test]
    fn test_noise_deterministic_for_same_tables() {
        let perlin = test_perlin();
        let p = Vec3::new(1.3, 2.7, -0.4);
        assert_eq!(perlin.noise(p), perlin.noise(p));
    }

    #[test]
    fn test_turb_nonnegative() {
        let perlin = test_perlin();
        for i in 0..200 {
            let p = Vec3::splat(i as f32 * 0.23);
            assert!(perlin.turb(p, 7) >= 0.0);
        }
    }

    #[test]
    fn test_perm_tables_are_permutations() {
        let mut rng = SampleRng::from_state(tea(1, 2));
        let mut perm = generate_perm(&mut rng);
        perm.sort_unstable();
        assert_eq!(perm, (0..POINT_COUNT).collect::<Vec<_>>());
    }
}
