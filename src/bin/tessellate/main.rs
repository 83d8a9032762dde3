//! Tessellate CLI - voxel surfacing and mesh checking tool.
//!
//! Usage: tessellate <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `tessellate --help` for available commands. Set `RUST_LOG` or pass
//! `-v` for diagnostic output.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use nalgebra::Point3;

use tessellate::algo::march::{marching_cubes, Extraction, MarchOptions};
use tessellate::algo::smooth::{laplacian_smooth, SmoothOptions};
use tessellate::io::{self, grid, stl};
use tessellate::mesh::{fixtures, Mesh, MeshConfig, MeshAdjacency};
use tessellate::shape::Shape;
use tessellate::voxel::VoxelVolume;

#[derive(Parser)]
#[command(name = "tessellate")]
#[command(author, version, about = "Voxel surfacing and mesh validation CLI", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Run the basic, manifold and connection checks
    Validate {
        /// Input mesh file
        #[arg(required_unless_present = "fixture")]
        input: Option<PathBuf>,

        /// Check a built-in diagnostic mesh instead of a file
        #[arg(long, conflicts_with = "input")]
        fixture: Option<String>,
    },

    /// Smooth a mesh
    Smooth {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Number of iterations
        #[arg(short, long, default_value = "1")]
        iterations: usize,

        /// Smoothing rate (0.0 to 1.0)
        #[arg(short, long, default_value = "0.5")]
        rate: f64,

        /// Evaluate vertices in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Surface a voxel grid
    March {
        /// Input grid file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Voxel edge length
        #[arg(long, default_value = "1.0")]
        cell_size: f64,

        /// Emit exposed voxel faces instead of marching cubes
        #[arg(long)]
        faces: bool,

        /// Laplacian smoothing iterations applied afterwards
        #[arg(long, default_value = "0")]
        smooth: usize,
    },

    /// Test whether a point lies inside a mesh
    Contains {
        /// Input mesh file
        input: PathBuf,

        /// X coordinate
        #[arg(allow_hyphen_values = true)]
        x: f64,

        /// Y coordinate
        #[arg(allow_hyphen_values = true)]
        y: f64,

        /// Z coordinate
        #[arg(allow_hyphen_values = true)]
        z: f64,

        /// Use bounding-sphere acceleration
        #[arg(long)]
        accel: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Validate { input, fixture } => {
            cmd_validate(input.as_deref(), fixture.as_deref())?;
        }

        Commands::Smooth {
            input,
            output,
            iterations,
            rate,
            parallel,
        } => {
            cmd_smooth(&input, &output, iterations, rate, parallel)?;
        }

        Commands::March {
            input,
            output,
            cell_size,
            faces,
            smooth,
        } => {
            cmd_march(&input, &output, cell_size, faces, smooth)?;
        }

        Commands::Contains { input, x, y, z, accel } => {
            cmd_contains(&input, Point3::new(x, y, z), accel)?;
        }
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Triangles: {}", mesh.num_triangles());

    let adjacency = MeshAdjacency::build(mesh.num_vertices(), mesh.triangles());
    println!("Edges: {}", adjacency.edge_count());
    println!("Boundary edges: {}", adjacency.boundary_edges().count());
    println!("Non-manifold edges: {}", adjacency.non_manifold_edges().count());
    println!("Watertight: {}", if adjacency.is_watertight() { "yes" } else { "no" });

    let mut total_area = 0.0;
    for face in 0..mesh.num_triangles() {
        if let Some([a, b, c]) = mesh.triangle_positions(face) {
            total_area += (b - a).cross(&(c - a)).norm() * 0.5;
        }
    }
    println!("Surface area: {:.6}", total_area);

    if let Some(bbox) = mesh.bounding_box() {
        let (min, max) = (bbox.min, bbox.max);
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = bbox.extent();
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    println!("Distinct face normals: {}", mesh.distinct_face_normals(1e-9).len());

    Ok(())
}

fn cmd_validate(input: Option<&Path>, fixture: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let (name, mesh) = match (input, fixture) {
        (_, Some(name)) => {
            let mesh = fixtures::by_name(name).ok_or_else(|| {
                format!("unknown fixture '{}' (available: {})", name, fixtures::NAMES.join(", "))
            })?;
            (name.to_string(), mesh)
        }
        (Some(path), None) => (path.display().to_string(), io::load(path)?),
        (None, None) => return Err("no input given".into()),
    };

    println!("Mesh: {} ({} vertices, {} triangles)", name, mesh.num_vertices(), mesh.num_triangles());
    let checks = [
        ("basic", mesh.check_basic()),
        ("manifold", mesh.check_manifold()),
        ("connection", mesh.check_connection()),
    ];
    for (check, result) in checks {
        match result {
            Ok(()) => println!("  {:<10} ok", check),
            Err(v) => println!("  {:<10} FAILED: {}", check, v),
        }
    }

    Ok(())
}

fn cmd_smooth(
    input: &Path,
    output: &Path,
    iterations: usize,
    rate: f64,
    parallel: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = io::load(input)?;
    println!("Loaded: {} vertices, {} triangles", mesh.num_vertices(), mesh.num_triangles());

    let mode = if parallel { "parallel" } else { "sequential" };
    println!("Applying Laplacian smoothing ({} iterations, rate {}, {})...", iterations, rate, mode);

    let options = SmoothOptions::default()
        .with_iterations(iterations)
        .with_rate(rate)
        .with_parallel(parallel);
    let start = Instant::now();
    laplacian_smooth(&mut mesh, &options)?;
    let elapsed = start.elapsed();

    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_march(
    input: &Path,
    output: &Path,
    cell_size: f64,
    faces: bool,
    smooth: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let volume = grid::read_grid(input)?.with_cell_size(cell_size)?;
    println!("Grid: {:?} voxels, {} filled", volume.dimensions(), volume.filled_count());

    let extraction = if faces { Extraction::VoxelFaces } else { Extraction::MarchingCubes };
    let start = Instant::now();
    let mut mesh = marching_cubes(&volume, &MarchOptions::default().with_extraction(extraction))?;
    if smooth > 0 {
        laplacian_smooth(&mut mesh, &SmoothOptions::default().with_iterations(smooth))?;
    }
    let elapsed = start.elapsed();

    println!(
        "Result: {} vertices, {} triangles ({:.2?})",
        mesh.num_vertices(),
        mesh.num_triangles(),
        elapsed
    );
    if !mesh.manifold_validity() {
        println!("Warning: output is not a closed two-manifold");
    }

    stl::save(&mesh, output)?;
    println!("Saved: {}", output.display());

    Ok(())
}

fn cmd_contains(input: &Path, point: Point3<f64>, accel: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: Mesh = io::load(input)?;
    mesh.set_config(MeshConfig::default().with_sphere_accel(accel));

    let inside = mesh.point_containment(&point);
    println!(
        "({}, {}, {}) is {}",
        point.x,
        point.y,
        point.z,
        if inside { "inside" } else { "outside" }
    );

    Ok(())
}
