//! End-to-end render tests: scene build -> camera -> integrator -> film.

use warp_render::{
    render, CameraBuilder, Color, Executor, RectPlane, RenderConfig, SceneBuilder, Vec3,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn sky_lit_spheres_produce_a_full_image() {
    init_logger();
    let mut builder = SceneBuilder::new();
    let even = builder.solid(Color::new(0.2, 0.3, 0.1));
    let odd = builder.solid(Color::new(0.9, 0.9, 0.9));
    let checker = builder.checker(even, odd);
    let ground = builder.lambertian_textured(checker);
    let center = builder.lambertian(Color::new(0.4, 0.2, 0.1));

    let floor = builder.sphere(Vec3::new(0.0, -1000.0, 0.0), 1000.0, ground);
    let ball = builder.sphere(Vec3::new(0.0, 1.0, 0.0), 1.0, center);
    let root = builder.bvh(&[floor, ball]);
    let scene = builder.build(root).unwrap();

    let camera = CameraBuilder::new()
        .with_view(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.0, 10.0)
        .with_aspect_ratio(1.0)
        .build();

    let config = RenderConfig {
        samples_per_pixel: 4,
        max_depth: 10,
        background: Color::new(0.7, 0.8, 1.0),
        executor: Executor::Serial,
    };

    let film = render(&scene, &camera, &config, 16, 16);

    for y in 0..film.height() {
        for x in 0..film.width() {
            let c = film.pixel(x, y);
            assert!(c.is_finite(), "non-finite pixel at ({x}, {y}): {c}");
            assert!(c.cmpge(Vec3::ZERO).all(), "negative pixel at ({x}, {y}): {c}");
            // Sky light reaches every pixel in this scene
            assert!(c.length_squared() > 0.0, "black pixel at ({x}, {y})");
        }
    }

    // Top rows see the sky directly
    let sky = film.pixel(0, 0);
    assert!((sky - Color::new(0.7, 0.8, 1.0)).length() < 1e-3);
}

#[test]
fn emissive_box_render_stays_finite() {
    init_logger();
    // Cornell-style enclosure: all light comes from the ceiling rect
    let mut builder = SceneBuilder::new();
    let red = builder.lambertian(Color::new(0.65, 0.05, 0.05));
    let white = builder.lambertian(Color::new(0.73, 0.73, 0.73));
    let green = builder.lambertian(Color::new(0.12, 0.45, 0.15));
    let light = builder.diffuse_light(Color::new(15.0, 15.0, 15.0));

    let walls = vec![
        builder.rect(RectPlane::Yz, 0.0, 555.0, 0.0, 555.0, 555.0, green),
        builder.rect(RectPlane::Yz, 0.0, 555.0, 0.0, 555.0, 0.0, red),
        builder.rect(RectPlane::Xz, 213.0, 343.0, 227.0, 332.0, 554.0, light),
        builder.rect(RectPlane::Xz, 0.0, 555.0, 0.0, 555.0, 0.0, white),
        builder.rect(RectPlane::Xz, 0.0, 555.0, 0.0, 555.0, 555.0, white),
        builder.rect(RectPlane::Xy, 0.0, 555.0, 0.0, 555.0, 555.0, white),
    ];
    let tall = builder.cuboid(Vec3::ZERO, Vec3::new(165.0, 330.0, 165.0), white);
    let tall = builder.rotate_y(tall, 15.0);
    let tall = builder.translate(tall, Vec3::new(265.0, 0.0, 295.0));

    let mut children = walls;
    children.push(tall);
    let root = builder.list(children);
    let scene = builder.build(root).unwrap();

    let camera = CameraBuilder::new()
        .with_view(
            Vec3::new(278.0, 278.0, -800.0),
            Vec3::new(278.0, 278.0, 0.0),
            Vec3::Y,
        )
        .with_lens(40.0, 0.0, 10.0)
        .with_aspect_ratio(1.0)
        .build();

    let config = RenderConfig {
        samples_per_pixel: 2,
        max_depth: 8,
        background: Color::ZERO,
        executor: Executor::Parallel,
    };

    let film = render(&scene, &camera, &config, 8, 8);

    let mut total = Color::ZERO;
    for y in 0..film.height() {
        for x in 0..film.width() {
            let c = film.pixel(x, y);
            assert!(c.is_finite());
            assert!(c.cmpge(Vec3::ZERO).all());
            total += c;
        }
    }
    // Some path reaches the ceiling light
    assert!(total.length_squared() > 0.0);
}
