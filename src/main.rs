use clap::Parser;

use globegen::biome::Biome;
use globegen::export;
use globegen::options::PlanetOptions;
use globegen::seeds::PlanetSeeds;
use globegen::vegetation;
use globegen::worker::{build_with_mode, BuildMode};

#[derive(Parser, Debug)]
#[command(name = "globegen")]
#[command(about = "Generate procedural planet meshes with biome classification")]
struct Args {
    /// Random seed (uses a random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Planet radius in world units
    #[arg(short, long, default_value = "1.0")]
    radius: f32,

    /// Edge segments per icosahedron face (8-64)
    #[arg(short = 'R', long, default_value = "16")]
    resolution: u32,

    /// Sea level in [0, 1]
    #[arg(short, long, default_value = "0.4")]
    water_level: f32,

    /// Skip the ocean shell
    #[arg(long)]
    no_ocean: bool,

    /// Skip the atmosphere shell
    #[arg(long)]
    no_atmosphere: bool,

    /// Skip vegetation planning
    #[arg(long)]
    no_vegetation: bool,

    /// Chance in [0, 1] that a qualifying vertex receives a tree point
    #[arg(long, default_value = "0.3")]
    vegetation_density: f32,

    /// Run the build through the worker protocol instead of inline
    #[arg(long)]
    worker: bool,

    /// Export an equirectangular biome map to PNG
    #[arg(long)]
    export_biomes: Option<String>,

    /// Export an equirectangular elevation map to PNG
    #[arg(long)]
    export_elevation: Option<String>,

    /// Export the terrain mesh as Wavefront OBJ
    #[arg(long)]
    export_obj: Option<String>,

    /// Width in pixels for exported maps (height is width/2)
    #[arg(long, default_value = "1024")]
    map_width: u32,

    /// Print the effective options as JSON and exit
    #[arg(long)]
    dump_options: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let seed = args.seed.unwrap_or_else(rand::random);

    let options = PlanetOptions {
        radius: args.radius,
        resolution: args.resolution,
        seed,
        water_level: args.water_level,
        has_ocean: !args.no_ocean,
        has_atmosphere: !args.no_atmosphere,
        has_vegetation: !args.no_vegetation,
        vegetation_density: args.vegetation_density,
        ..PlanetOptions::default()
    };

    if args.dump_options {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    println!("Seeds: {}", PlanetSeeds::from_master(seed));

    let mode = if args.worker {
        BuildMode::Worker
    } else {
        BuildMode::Local
    };
    log::info!("building planet (mode: {mode:?})");
    let mesh = build_with_mode(mode, &options)?;

    println!(
        "Terrain: {} vertices, {} triangles",
        mesh.terrain.vertex_count(),
        mesh.terrain.triangle_count()
    );
    if let Some(ocean) = &mesh.ocean {
        println!(
            "Ocean:   {} vertices, {} triangles",
            ocean.vertex_count(),
            ocean.triangle_count()
        );
    }
    if let Some(atmosphere) = &mesh.atmosphere {
        println!(
            "Atmos:   {} vertices, {} triangles",
            atmosphere.vertex_count(),
            atmosphere.triangle_count()
        );
    }

    println!("Biomes:");
    let total = mesh.surface.len() as f64;
    for &biome in Biome::all() {
        let count = mesh.surface.biomes.iter().filter(|&&b| b == biome).count();
        if count > 0 {
            println!(
                "  {:<11} {:>6}  ({:.1}%)",
                biome.to_string(),
                count,
                100.0 * count as f64 / total
            );
        }
    }

    if options.has_vegetation {
        let placements = vegetation::plan_vegetation(&mesh, &options);
        println!("Vegetation: {} placement points", placements.len());
    }

    if let Some(path) = &args.export_biomes {
        export::export_biome_map(&options, args.map_width, path)?;
        println!("Wrote biome map to {path}");
    }
    if let Some(path) = &args.export_elevation {
        export::export_elevation_map(&options, args.map_width, path)?;
        println!("Wrote elevation map to {path}");
    }
    if let Some(path) = &args.export_obj {
        export::export_obj(&mesh.terrain, path)?;
        println!("Wrote terrain mesh to {path}");
    }

    Ok(())
}
