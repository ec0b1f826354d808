//! The eight demo scenes and their camera setups.

use std::path::Path;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use warp_math::Vec3;
use warp_render::{
    gen_f32, gen_range_f32, Camera, CameraBuilder, Color, RectPlane, Scene, SceneBuilder,
};

/// A frozen scene together with everything the driver needs to render it.
pub struct SceneSetup {
    pub scene: Scene,
    pub camera: Camera,
    pub background: Color,
    pub width: u32,
    pub height: u32,
}

struct View {
    look_from: Vec3,
    look_at: Vec3,
    vfov: f32,
    aperture: f32,
}

impl View {
    fn new(look_from: Vec3, look_at: Vec3, vfov: f32, aperture: f32) -> Self {
        Self {
            look_from,
            look_at,
            vfov,
            aperture,
        }
    }
}

/// Build the demo scene for a selector in 1..=8.
///
/// An out-of-range selector is an error; a silently empty scene renders a
/// blank image and helps nobody.
pub fn build(selector: u32) -> Result<SceneSetup> {
    match selector {
        1 => random_scene(),
        2 => two_spheres(),
        3 => two_perlin_spheres(),
        4 => earth(),
        5 => simple_light(),
        6 => cornell_box(),
        7 => cornell_smoke(),
        8 => final_scene(),
        _ => bail!("unknown scene selector {selector} (expected 1-8)"),
    }
}

const SKY: Color = Color::new(0.7, 0.8, 1.0);

fn assemble(
    scene: Scene,
    view: View,
    background: Color,
    aspect_ratio: f32,
    width: u32,
) -> SceneSetup {
    let height = (width as f32 / aspect_ratio) as u32;
    let camera = CameraBuilder::new()
        .with_view(view.look_from, view.look_at, Vec3::Y)
        .with_lens(view.vfov, view.aperture, 10.0)
        .with_aspect_ratio(aspect_ratio)
        .with_shutter(0.0, 1.0)
        .build();

    SceneSetup {
        scene,
        camera,
        background,
        width,
        height,
    }
}

/// Scene 1: the randomized sphere field with motion blur, under a BVH.
fn random_scene() -> Result<SceneSetup> {
    let mut builder = SceneBuilder::new();
    let mut rng = StdRng::seed_from_u64(19);

    let even = builder.solid(Color::new(0.2, 0.3, 0.1));
    let odd = builder.solid(Color::new(0.9, 0.9, 0.9));
    let checker = builder.checker(even, odd);
    let ground = builder.lambertian_textured(checker);

    let mut world = vec![builder.sphere(Vec3::new(0.0, -1000.0, 0.0), 1000.0, ground)];

    for a in -11..11 {
        for b in -11..11 {
            let choose_mat = gen_f32(&mut rng);
            let center = Vec3::new(
                a as f32 + 0.9 * gen_f32(&mut rng),
                0.2,
                b as f32 + 0.9 * gen_f32(&mut rng),
            );

            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            if choose_mat < 0.8 {
                // diffuse, drifting upward over the shutter
                let albedo = Color::new(
                    gen_f32(&mut rng) * gen_f32(&mut rng),
                    gen_f32(&mut rng) * gen_f32(&mut rng),
                    gen_f32(&mut rng) * gen_f32(&mut rng),
                );
                let material = builder.lambertian(albedo);
                let center1 = center + Vec3::new(0.0, gen_range_f32(&mut rng, 0.0, 0.5), 0.0);
                world.push(builder.moving_sphere(center, center1, 0.0, 1.0, 0.2, material));
            } else if choose_mat < 0.95 {
                // metal
                let albedo = Color::new(
                    gen_range_f32(&mut rng, 0.5, 1.0),
                    gen_range_f32(&mut rng, 0.5, 1.0),
                    gen_range_f32(&mut rng, 0.5, 1.0),
                );
                let fuzz = gen_range_f32(&mut rng, 0.0, 0.5);
                let material = builder.metal(albedo, fuzz);
                world.push(builder.sphere(center, 0.2, material));
            } else {
                // glass
                let material = builder.dielectric(1.5);
                world.push(builder.sphere(center, 0.2, material));
            }
        }
    }

    let glass = builder.dielectric(1.5);
    world.push(builder.sphere(Vec3::new(0.0, 1.0, 0.0), 1.0, glass));

    let matte = builder.lambertian(Color::new(0.4, 0.2, 0.1));
    world.push(builder.sphere(Vec3::new(-4.0, 1.0, 0.0), 1.0, matte));

    let mirror = builder.metal(Color::new(0.7, 0.6, 0.5), 0.0);
    world.push(builder.sphere(Vec3::new(4.0, 1.0, 0.0), 1.0, mirror));

    let root = builder.bvh(&world);
    let scene = builder.build(root)?;

    let view = View::new(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, 20.0, 0.1);
    Ok(assemble(scene, view, SKY, 16.0 / 9.0, 1920))
}

/// Scene 2: two checkered spheres.
fn two_spheres() -> Result<SceneSetup> {
    let mut builder = SceneBuilder::new();

    let even = builder.solid(Color::new(0.2, 0.3, 0.1));
    let odd = builder.solid(Color::new(0.9, 0.9, 0.9));
    let checker = builder.checker(even, odd);
    let material = builder.lambertian_textured(checker);

    let bottom = builder.sphere(Vec3::new(0.0, -10.0, 0.0), 10.0, material);
    let top = builder.sphere(Vec3::new(0.0, 10.0, 0.0), 10.0, material);
    let root = builder.list(vec![bottom, top]);
    let scene = builder.build(root)?;

    let view = View::new(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, 20.0, 0.0);
    Ok(assemble(scene, view, SKY, 16.0 / 9.0, 1920))
}

/// Scene 3: two spheres with sine-modulated Perlin turbulence.
fn two_perlin_spheres() -> Result<SceneSetup> {
    let mut builder = SceneBuilder::new();

    let noise = builder.noise(4.0);
    let material = builder.lambertian_textured(noise);

    let ground = builder.sphere(Vec3::new(0.0, -1000.0, 0.0), 1000.0, material);
    let ball = builder.sphere(Vec3::new(0.0, 2.0, 0.0), 2.0, material);
    let root = builder.list(vec![ground, ball]);
    let scene = builder.build(root)?;

    let view = View::new(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, 20.0, 0.0);
    Ok(assemble(scene, view, SKY, 16.0 / 9.0, 1920))
}

/// Scene 4: an image-textured globe.
fn earth() -> Result<SceneSetup> {
    let mut builder = SceneBuilder::new();

    let earth_texture = builder.image(Path::new("assets/earthmap.jpg"));
    let surface = builder.lambertian_textured(earth_texture);
    let globe = builder.sphere(Vec3::ZERO, 2.0, surface);
    let scene = builder.build(globe)?;

    let view = View::new(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, 20.0, 0.0);
    Ok(assemble(scene, view, SKY, 16.0 / 9.0, 1920))
}

/// Scene 5: Perlin spheres lit only by a rectangle light.
fn simple_light() -> Result<SceneSetup> {
    let mut builder = SceneBuilder::new();

    let noise = builder.noise(4.0);
    let material = builder.lambertian_textured(noise);
    let ground = builder.sphere(Vec3::new(0.0, -1000.0, 0.0), 1000.0, material);
    let ball = builder.sphere(Vec3::new(0.0, 2.0, 0.0), 2.0, material);

    let light = builder.diffuse_light(Color::new(4.0, 4.0, 4.0));
    let lamp = builder.rect(RectPlane::Xy, 3.0, 5.0, 1.0, 3.0, -2.0, light);

    let root = builder.list(vec![ground, ball, lamp]);
    let scene = builder.build(root)?;

    let view = View::new(Vec3::new(26.0, 3.0, 6.0), Vec3::new(0.0, 2.0, 0.0), 20.0, 0.0);
    Ok(assemble(scene, view, Color::ZERO, 16.0 / 9.0, 1920))
}

/// Walls, ceiling light, and the two boxes of the Cornell box.
fn cornell_walls(builder: &mut SceneBuilder, light_emit: Color, light_extent: [f32; 4]) -> Vec<warp_render::NodeId> {
    let red = builder.lambertian(Color::new(0.65, 0.05, 0.05));
    let white = builder.lambertian(Color::new(0.73, 0.73, 0.73));
    let green = builder.lambertian(Color::new(0.12, 0.45, 0.15));
    let light = builder.diffuse_light(light_emit);

    let [a0, a1, b0, b1] = light_extent;
    vec![
        builder.rect(RectPlane::Yz, 0.0, 555.0, 0.0, 555.0, 555.0, green),
        builder.rect(RectPlane::Yz, 0.0, 555.0, 0.0, 555.0, 0.0, red),
        builder.rect(RectPlane::Xz, a0, a1, b0, b1, 554.0, light),
        builder.rect(RectPlane::Xz, 0.0, 555.0, 0.0, 555.0, 0.0, white),
        builder.rect(RectPlane::Xz, 0.0, 555.0, 0.0, 555.0, 555.0, white),
        builder.rect(RectPlane::Xy, 0.0, 555.0, 0.0, 555.0, 555.0, white),
    ]
}

fn cornell_boxes(builder: &mut SceneBuilder) -> (warp_render::NodeId, warp_render::NodeId) {
    let white = builder.lambertian(Color::new(0.73, 0.73, 0.73));

    let tall = builder.cuboid(Vec3::ZERO, Vec3::new(165.0, 330.0, 165.0), white);
    let tall = builder.rotate_y(tall, 15.0);
    let tall = builder.translate(tall, Vec3::new(265.0, 0.0, 295.0));

    let short = builder.cuboid(Vec3::ZERO, Vec3::new(165.0, 165.0, 165.0), white);
    let short = builder.rotate_y(short, -18.0);
    let short = builder.translate(short, Vec3::new(130.0, 0.0, 65.0));

    (tall, short)
}

/// Scene 6: the Cornell box.
fn cornell_box() -> Result<SceneSetup> {
    let mut builder = SceneBuilder::new();

    let mut children = cornell_walls(
        &mut builder,
        Color::new(15.0, 15.0, 15.0),
        [213.0, 343.0, 227.0, 332.0],
    );
    let (tall, short) = cornell_boxes(&mut builder);
    children.push(tall);
    children.push(short);

    let root = builder.list(children);
    let scene = builder.build(root)?;

    let view = View::new(
        Vec3::new(278.0, 278.0, -800.0),
        Vec3::new(278.0, 278.0, 0.0),
        40.0,
        0.0,
    );
    Ok(assemble(scene, view, Color::ZERO, 1.0, 600))
}

/// Scene 7: the Cornell box with the boxes swapped for smoke volumes.
fn cornell_smoke() -> Result<SceneSetup> {
    let mut builder = SceneBuilder::new();

    let mut children = cornell_walls(
        &mut builder,
        Color::new(7.0, 7.0, 7.0),
        [113.0, 443.0, 127.0, 432.0],
    );
    let (tall, short) = cornell_boxes(&mut builder);
    children.push(builder.constant_medium(tall, 0.01, Color::ZERO));
    children.push(builder.constant_medium(short, 0.01, Color::ONE));

    let root = builder.list(children);
    let scene = builder.build(root)?;

    let view = View::new(
        Vec3::new(278.0, 278.0, -800.0),
        Vec3::new(278.0, 278.0, 0.0),
        40.0,
        0.0,
    );
    Ok(assemble(scene, view, Color::ZERO, 1.0, 600))
}

/// Scene 8: everything at once - the ground box grid, motion blur, glass,
/// metal, fog volumes, noise, an orbiting sphere cluster.
fn final_scene() -> Result<SceneSetup> {
    let mut builder = SceneBuilder::new();
    let mut rng = StdRng::seed_from_u64(23);

    let ground = builder.lambertian(Color::new(0.48, 0.83, 0.53));

    let boxes_per_side = 20;
    let mut ground_boxes = Vec::with_capacity(boxes_per_side * boxes_per_side);
    for i in 0..boxes_per_side {
        for j in 0..boxes_per_side {
            let w = 100.0;
            let x0 = -1000.0 + i as f32 * w;
            let z0 = -1000.0 + j as f32 * w;
            let y1 = gen_range_f32(&mut rng, 1.0, 101.0);

            ground_boxes.push(builder.cuboid(
                Vec3::new(x0, 0.0, z0),
                Vec3::new(x0 + w, y1, z0 + w),
                ground,
            ));
        }
    }

    let mut world = vec![builder.bvh(&ground_boxes)];

    let light = builder.diffuse_light(Color::new(7.0, 7.0, 7.0));
    world.push(builder.rect(RectPlane::Xz, 123.0, 423.0, 147.0, 412.0, 554.0, light));

    let center0 = Vec3::new(400.0, 400.0, 200.0);
    let center1 = center0 + Vec3::new(30.0, 0.0, 0.0);
    let drifting = builder.lambertian(Color::new(0.7, 0.3, 0.1));
    world.push(builder.moving_sphere(center0, center1, 0.0, 1.0, 50.0, drifting));

    let glass = builder.dielectric(1.5);
    world.push(builder.sphere(Vec3::new(260.0, 150.0, 45.0), 50.0, glass));
    let brushed = builder.metal(Color::new(0.8, 0.8, 0.9), 1.0);
    world.push(builder.sphere(Vec3::new(0.0, 150.0, 145.0), 50.0, brushed));

    // Glass sphere filled with blue fog
    let boundary_glass = builder.dielectric(1.5);
    let boundary = builder.sphere(Vec3::new(360.0, 150.0, 145.0), 70.0, boundary_glass);
    world.push(boundary);
    world.push(builder.constant_medium(boundary, 0.2, Color::new(0.2, 0.4, 0.9)));

    // Thin global haze
    let haze_glass = builder.dielectric(1.5);
    let haze_boundary = builder.sphere(Vec3::ZERO, 5000.0, haze_glass);
    world.push(builder.constant_medium(haze_boundary, 0.0001, Color::ONE));

    let noise = builder.noise(0.1);
    let marble = builder.lambertian_textured(noise);
    world.push(builder.sphere(Vec3::new(220.0, 280.0, 300.0), 80.0, marble));

    let white = builder.lambertian(Color::new(0.73, 0.73, 0.73));
    let mut cluster = Vec::with_capacity(1000);
    for _ in 0..1000 {
        let center = Vec3::new(
            gen_range_f32(&mut rng, 0.0, 165.0),
            gen_range_f32(&mut rng, 0.0, 165.0),
            gen_range_f32(&mut rng, 0.0, 165.0),
        );
        cluster.push(builder.sphere(center, 10.0, white));
    }
    let cluster = builder.bvh(&cluster);
    let cluster = builder.rotate_y(cluster, 15.0);
    world.push(builder.translate(cluster, Vec3::new(-100.0, 270.0, 395.0)));

    let root = builder.list(world);
    let scene = builder.build(root)?;

    let view = View::new(
        Vec3::new(478.0, 278.0, -600.0),
        Vec3::new(278.0, 278.0, 0.0),
        40.0,
        0.0,
    );
    Ok(assemble(scene, view, Color::ZERO, 1.0, 800))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_selectors_build() {
        for selector in 1..=8 {
            let setup = build(selector).unwrap_or_else(|e| panic!("scene {selector}: {e}"));
            assert!(setup.width > 0 && setup.height > 0);
            assert!(setup.scene.node_count() > 0);
        }
    }

    #[test]
    fn test_out_of_range_selector_fails() {
        assert!(build(0).is_err());
        assert!(build(9).is_err());
        assert!(build(u32::MAX).is_err());
    }

    #[test]
    fn test_cornell_box_dimensions() {
        let setup = build(6).unwrap();
        assert_eq!(setup.width, 600);
        assert_eq!(setup.height, 600);
        assert_eq!(setup.background, Color::ZERO);
    }
}
