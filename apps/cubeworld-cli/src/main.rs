use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use cubeworld_common::CubeId;
use cubeworld_kernel::{Body, LevelData, SimConfig, World};
use cubeworld_nav::CubePos;
use cubeworld_tools::{WorldInspector, event_name};
use glam::Vec3;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cubeworld-cli", about = "CLI tool for cubeworld levels")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LevelArgs {
    /// JSON level file; a straight corridor is used when omitted
    #[arg(short, long)]
    level: Option<PathBuf>,
    /// Cube count of the fallback corridor
    #[arg(long, default_value = "4")]
    corridor: usize,
    /// YAML file overriding simulation constants
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Build a level and report its shape
    Validate {
        #[command(flatten)]
        level: LevelArgs,
    },
    /// Step a level and report the events it produced
    Simulate {
        #[command(flatten)]
        level: LevelArgs,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "60")]
        steps: u64,
        /// Frame time in seconds
        #[arg(short, long, default_value = "0.05")]
        frame_time: f32,
        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
    /// Find a path between two cubes
    Path {
        #[command(flatten)]
        level: LevelArgs,
        /// Start cube index
        from: u32,
        /// Destination cube index
        to: u32,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Returns the world and whether it is the built-in corridor.
fn load_world(args: &LevelArgs) -> anyhow::Result<(World, bool)> {
    let config = load_config(args.config.as_deref())?;
    match &args.level {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading level {}", path.display()))?;
            let world = World::from_json(&json, config)
                .with_context(|| format!("building level {}", path.display()))?;
            Ok((world, false))
        }
        None => {
            anyhow::ensure!(args.corridor > 0, "corridor needs at least one cube");
            let level = LevelData::corridor(args.corridor, 100.0, 100.0);
            Ok((World::build(&level, config)?, true))
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("cubeworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: v{}", cubeworld_kernel::version());
            println!("nav: {}", cubeworld_nav::crate_info());
            println!("tools: {}", cubeworld_tools::crate_info());
        }
        Commands::Validate { level } => {
            let (world, _) = load_world(&level)?;
            println!("{}", WorldInspector::summary(&world));
            let solid = world
                .cubes()
                .iter()
                .flat_map(|c| c.sides.iter())
                .filter(|s| world.is_side_solid(s.id))
                .count();
            println!("Solid sides: {solid}");
            println!("OK");
        }
        Commands::Simulate {
            level,
            steps,
            frame_time,
            seed,
        } => {
            let (world, demo) = load_world(&level)?;
            let mut world = world.with_seed(seed);
            if demo {
                // Fire a shot down the corridor so the run has something to show.
                let shot = Body::weapon(Vec3::new(0.0, 0.0, 50.0), Vec3::new(0.0, 0.0, 400.0), 1.0, 10.0);
                world.spawn_body(shot, CubeId(0))?;
            }

            println!("Simulating: seed={seed}, steps={steps}, frame_time={frame_time}");
            let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
            for _ in 0..steps {
                world.step(frame_time);
                for event in world.drain_events() {
                    *counts.entry(event_name(&event)).or_insert(0) += 1;
                }
            }

            tracing::info!(ticks = world.tick(), bodies = world.body_count(), "simulation finished");
            println!("{}", WorldInspector::summary(&world));
            for (name, count) in &counts {
                println!("  {name}: {count}");
            }
            for id in WorldInspector::list_bodies(&world) {
                if let Some(info) = WorldInspector::inspect_body(&world, id) {
                    println!("  {info}");
                }
            }
        }
        Commands::Path { level, from, to } => {
            let (world, _) = load_world(&level)?;
            let dest_cube = world
                .cube(CubeId(to))
                .with_context(|| format!("no cube {to}"))?;
            let start_cube = world
                .cube(CubeId(from))
                .with_context(|| format!("no cube {from}"))?;
            let start = CubePos::new(CubeId(from), start_cube.center);
            let dest = CubePos::new(CubeId(to), dest_cube.center);

            match start.create_path_to(&world, &dest) {
                Some(path) => {
                    println!("Path {from} -> {to}: {} waypoints", path.len());
                    for wp in path {
                        println!(
                            "  cube {} at ({:.2}, {:.2}, {:.2})",
                            wp.cube, wp.pos.x, wp.pos.y, wp.pos.z
                        );
                    }
                }
                None => println!("No path from {from} to {to}"),
            }
        }
    }

    Ok(())
}
