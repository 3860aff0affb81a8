use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use road_network_sim::network::{load_segments, RoadNetwork};
use road_network_sim::simulation::{SimConfig, SimWorld, DEFAULT_SPAWN_PROBABILITY, MIN_CLEARANCE};

/// Smallest scaling factor accepted for generated networks, before the
/// clearance-based bound
const MIN_SCALAR: i64 = 20;

#[derive(Parser)]
#[command(name = "road_network_sim")]
#[command(about = "Headless traffic simulation on a lattice road network")]
struct Cli {
    /// Network description file, one `x1,y1,x2,y2` segment per line.
    /// Without it a random network is generated.
    #[arg(long)]
    network: Option<PathBuf>,

    /// Number of segments in a generated network
    #[arg(long, default_value = "12")]
    segments: usize,

    /// Scaling factor applied to a generated network
    #[arg(long, default_value = "40")]
    scalar: i64,

    /// Accept networks with nodes unreachable from every entry gate
    #[arg(long)]
    allow_unreachable: bool,

    /// Chance per tick that an entry road spawns a vehicle
    #[arg(long, default_value_t = DEFAULT_SPAWN_PROBABILITY)]
    probability: f64,

    /// Minimum spacing between vehicles
    #[arg(long, default_value_t = MIN_CLEARANCE)]
    clearance: f64,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "1000")]
    ticks: u64,

    /// Seed for network generation and the simulation
    #[arg(long)]
    seed: Option<u64>,

    /// Print a summary every this many ticks (0 for none)
    #[arg(long, default_value = "250")]
    report_every: u64,

    /// Draw the network in the terminal with each summary
    #[arg(long)]
    map: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,road_network_sim=info"))
        .init();
    let cli = Cli::parse();

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let network = build_network(&cli, &mut rng)?;

    let config = SimConfig::default()
        .with_clearance(cli.clearance)
        .with_spawn_probability(cli.probability);
    let mut world = SimWorld::with_rng(
        network.graph(),
        network.entry_gates(),
        network.exit_gates(),
        config,
        rng,
    )
    .context("Failed to set up the simulation")?;

    run_headless(&mut world, &cli);
    Ok(())
}

fn build_network(cli: &Cli, rng: &mut StdRng) -> Result<RoadNetwork> {
    let enforce_reachability = !cli.allow_unreachable;

    if let Some(path) = &cli.network {
        let segments = load_segments(path)
            .with_context(|| format!("Failed to read network file {}", path.display()))?;
        return RoadNetwork::from_segments(&segments, enforce_reachability)
            .with_context(|| format!("Invalid road network in {}", path.display()));
    }

    let min_scalar = MIN_SCALAR.max((2.0 * cli.clearance).ceil() as i64);
    if cli.scalar < min_scalar {
        bail!("scalar must be at least {min_scalar}, got {}", cli.scalar);
    }
    RoadNetwork::generate(cli.segments, cli.scalar, enforce_reachability, rng)
        .context("Failed to generate a road network")
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(world: &mut SimWorld, cli: &Cli) {
    info!("Running {} ticks headless", cli.ticks);

    if cli.report_every > 0 {
        report(world, cli.map);
    }

    for tick in 1..=cli.ticks {
        world.tick();
        if cli.report_every > 0 && tick % cli.report_every == 0 {
            report(world, cli.map);
        }
    }

    let stats = &world.stats;
    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks: {}", stats.ticks);
    info!("Total vehicles spawned: {}", stats.vehicles_spawned);
    info!("Total vehicles exited: {}", stats.vehicles_exited);
    info!("Active vehicles: {}", world.vehicle_count());
    info!("Total intersections: {}", world.intersections().len());
    info!("Total roads: {}", world.roads().len());
    info!(
        "Throughput: {:.1}%",
        if stats.vehicles_spawned > 0 {
            stats.vehicles_exited as f64 / stats.vehicles_spawned as f64 * 100.0
        } else {
            0.0
        }
    );
}

fn report(world: &SimWorld, map: bool) {
    world.print_summary();
    if map {
        world.draw_map();
    }
    println!();
}
