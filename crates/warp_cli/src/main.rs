//! Demo scene renderer: pick a scene, render it, write a PNG.

mod scenes;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use warp_render::{render, Executor, RenderConfig, MAX_DEPTH};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExecutorArg {
    /// Data-parallel over all cores
    Parallel,
    /// Single-threaded
    Serial,
}

impl From<ExecutorArg> for Executor {
    fn from(arg: ExecutorArg) -> Self {
        match arg {
            ExecutorArg::Parallel => Executor::Parallel,
            ExecutorArg::Serial => Executor::Serial,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Monte Carlo path tracer over the built-in demo scenes")]
struct Cli {
    /// Kernel executor
    #[arg(short, long, value_enum, default_value_t = ExecutorArg::Parallel)]
    executor: ExecutorArg,

    /// Samples per pixel
    #[arg(short, long, default_value_t = 100)]
    samples: u32,

    /// Scene id:
    /// 1 random spheres, 2 two spheres, 3 two perlin spheres, 4 earth,
    /// 5 simple light, 6 cornell box, 7 cornell smoke, 8 final scene
    #[arg(short = 'i', long, default_value_t = 1, verbatim_doc_comment)]
    scene: u32,

    /// Output image base name (".png" is appended)
    #[arg(short, long, default_value = "./render")]
    outfile: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let setup = scenes::build(cli.scene)?;
    log::info!(
        "scene {}: {} nodes, {}x{} @ {} spp ({:?})",
        cli.scene,
        setup.scene.node_count(),
        setup.width,
        setup.height,
        cli.samples,
        cli.executor
    );

    let config = RenderConfig {
        samples_per_pixel: cli.samples,
        max_depth: MAX_DEPTH,
        background: setup.background,
        executor: cli.executor.into(),
    };

    let film = render(&setup.scene, &setup.camera, &config, setup.width, setup.height);

    let path = format!("{}.png", cli.outfile);
    let image = image::RgbaImage::from_raw(film.width(), film.height(), film.to_rgba8())
        .context("film buffer does not match the image dimensions")?;
    image
        .save(&path)
        .with_context(|| format!("could not write {path}"))?;
    log::info!("wrote {path}");

    Ok(())
}
