//! sharpiso CLI — sharp isosurface vertex placement from gradient samples.

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use sharpiso::{
    CubeVertexRecord, FeatureKind, GradSelectionMethod, GradientSample, GridField,
    ReconstructedPoint, ScalarGrid, SharpIsoConfig, SharpVertexLocator, SolveMethod, SvdSolver,
    VertexStats,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "sharpiso")]
#[command(about = "Place isosurface vertices on sharp edges and corners using gradient samples")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one vertex from a JSON list of gradient samples.
    Solve(CliSolveArgs),

    /// Locate vertices for every active cube of a grid.
    Grid(CliGridArgs),

    /// List the gradient selection presets.
    Methods,
}

#[derive(Debug, Clone, Args)]
struct CliSolveArgs {
    /// Input JSON: `{ "isovalue", "reference_point", "samples": [...] }`.
    #[arg(long)]
    input: PathBuf,

    /// Path to write the solved point (JSON).
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    solver: CliSolverArgs,
}

#[derive(Debug, Clone, Args)]
struct CliGridArgs {
    /// Synthetic field to sample (ignored when --grid-json is given).
    #[arg(long, value_enum, default_value_t = FieldArg::Corner)]
    field: FieldArg,

    /// Load the grid from a `sharpiso.grid.v1` JSON file instead.
    #[arg(long)]
    grid_json: Option<PathBuf>,

    /// Vertices per axis of the synthetic grid.
    #[arg(long, default_value = "16")]
    size: usize,

    /// Isovalue of the surface.
    #[arg(long, default_value = "0.0")]
    isovalue: f64,

    /// Gradient selection preset (see `sharpiso methods`).
    #[arg(long)]
    position: Option<GradSelectionMethod>,

    /// Drop gradients shorter than this.
    #[arg(long)]
    max_mag: Option<f64>,

    /// Offset of the cube used by the isoplane filter, in (-1, 1].
    #[arg(long)]
    grad_s_offset: Option<f64>,

    /// Path to write vertex records and statistics (JSON).
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    solver: CliSolverArgs,
}

#[derive(Debug, Clone, Args)]
struct CliSolverArgs {
    /// JSON config file; command-line flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Least-squares formulation.
    #[arg(long, value_enum)]
    method: Option<SolveMethodArg>,

    /// Relative singular value cutoff, in (0, 1).
    #[arg(long)]
    tolerance: Option<f64>,

    /// Retain at most this many singular values (1..=3).
    #[arg(long)]
    max_rank: Option<usize>,

    /// Use raw gradients instead of unit normals in the direct solve.
    #[arg(long)]
    raw_gradients: bool,

    /// Use the cube center instead of the sample centroid as mass point.
    #[arg(long)]
    cube_center_mass_point: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SolveMethodArg {
    Direct,
    Lindstrom,
    Lindstrom2,
    LindstromFast,
}

impl SolveMethodArg {
    fn to_core(self) -> SolveMethod {
        match self {
            Self::Direct => SolveMethod::Direct,
            Self::Lindstrom => SolveMethod::Lindstrom,
            Self::Lindstrom2 => SolveMethod::Lindstrom2,
            Self::LindstromFast => SolveMethod::LindstromFast,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FieldArg {
    /// Tilted plane: smooth everywhere.
    Plane,
    /// Two intersecting planes: one sharp edge.
    Edge,
    /// Three intersecting planes: one sharp corner.
    Corner,
    /// Sphere: smooth, curved.
    Sphere,
    /// Axis-aligned box: twelve edges, eight corners.
    Box,
}

impl CliSolverArgs {
    fn load_config(&self) -> CliResult<SharpIsoConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("Loading config: {}", path.display());
                SharpIsoConfig::from_json_file(path)?
            }
            None => SharpIsoConfig::default(),
        };
        if let Some(method) = self.method {
            config.svd.method = method.to_core();
        }
        if let Some(tol) = self.tolerance {
            config.svd.error_tolerance = tol;
        }
        if let Some(rank) = self.max_rank {
            config.svd.max_rank = rank;
        }
        if self.raw_gradients {
            config.svd.normalize_gradients = false;
        }
        if self.cube_center_mass_point {
            config.svd.mass_point = sharpiso::MassPoint::CubeCenter;
        }
        Ok(config)
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve(args) => run_solve(&args),
        Commands::Grid(args) => run_grid(&args),
        Commands::Methods => run_methods(),
    }
}

// ── methods ───────────────────────────────────────────────────────────

fn run_methods() -> CliResult<()> {
    println!("gradient selection presets (--position)");
    for m in GradSelectionMethod::ALL {
        println!("  {:<10} {}", m.as_str(), m.description());
    }
    Ok(())
}

// ── solve ─────────────────────────────────────────────────────────────

fn default_reference_point() -> [f64; 3] {
    [0.5; 3]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SolveInput {
    #[serde(default)]
    isovalue: f64,
    /// Fallback for rank 0 and cube center for the mass point.
    #[serde(default = "default_reference_point")]
    reference_point: [f64; 3],
    samples: Vec<GradientSample>,
}

#[derive(Debug, Serialize)]
struct SolveOutput {
    num_samples: usize,
    feature: FeatureKind,
    point: ReconstructedPoint,
}

fn run_solve(args: &CliSolveArgs) -> CliResult<()> {
    tracing::info!("Loading samples: {}", args.input.display());
    let data = std::fs::read_to_string(&args.input)?;
    let input: SolveInput = serde_json::from_str(&data)?;

    let config = args.solver.load_config()?;
    let solver = SvdSolver::new(config.svd)?;
    let point = solver.solve(&input.samples, input.isovalue, input.reference_point)?;

    tracing::info!(
        "Solved {} samples: rank {} at ({:.6}, {:.6}, {:.6})",
        input.samples.len(),
        point.rank,
        point.coord[0],
        point.coord[1],
        point.coord[2]
    );
    if let Some(dir) = point.free_direction {
        tracing::info!(
            "Free direction: ({:.6}, {:.6}, {:.6})",
            dir[0],
            dir[1],
            dir[2]
        );
    }

    let out = SolveOutput {
        num_samples: input.samples.len(),
        feature: point.feature(),
        point,
    };
    write_json(&args.out, &out)
}

// ── grid ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GridOutput<'a> {
    axis_size: [usize; 3],
    isovalue: f64,
    config: &'a SharpIsoConfig,
    stats: VertexStats,
    records: Vec<CubeVertexRecord>,
}

fn run_grid(args: &CliGridArgs) -> CliResult<()> {
    let grid = match &args.grid_json {
        Some(path) => {
            tracing::info!("Loading grid: {}", path.display());
            ScalarGrid::from_json_file(path)?
        }
        None => synthetic_grid(args.field, args.size)?,
    };
    let axis_size = grid.axis_size();
    tracing::info!(
        "Grid size: {}x{}x{} ({} cubes)",
        axis_size[0],
        axis_size[1],
        axis_size[2],
        grid.num_cubes()
    );

    let mut config = args.solver.load_config()?;
    if let Some(method) = args.position {
        config.selection.apply_method(method);
    }
    if let Some(max_mag) = args.max_mag {
        config.selection.max_small_magnitude = max_mag;
    }
    if let Some(offset) = args.grad_s_offset {
        config.selection.grad_selection_cube_offset = offset;
    }
    let locator = SharpVertexLocator::new(config)?;

    let records = locator.locate_all(&grid, args.isovalue);
    let stats = VertexStats::from_records(&records);
    tracing::info!(
        "Active cubes: {} (corners {}, edges {}, smooth {}, no samples {})",
        stats.num_cubes,
        stats.num_with(FeatureKind::Corner),
        stats.num_with(FeatureKind::Edge),
        stats.num_with(FeatureKind::Smooth),
        stats.num_without_samples
    );

    let out = GridOutput {
        axis_size,
        isovalue: args.isovalue,
        config: locator.config(),
        stats,
        records,
    };
    write_json(&args.out, &out)
}

fn synthetic_grid(field: FieldArg, size: usize) -> CliResult<ScalarGrid> {
    let c = (size as f64 - 1.0) * 0.5;
    // off-grid feature positions keep samples away from exact ties
    let center = [c + 0.13, c - 0.21, c + 0.07];
    let half = c * 0.5;
    let grid = match field {
        FieldArg::Plane => ScalarGrid::from_fn([size; 3], |p| {
            0.3 * (p[0] - center[0]) + 0.5 * (p[1] - center[1]) + 0.8 * (p[2] - center[2])
        }),
        FieldArg::Edge => ScalarGrid::from_fn([size; 3], |p| {
            (p[0] - center[0]).max(p[1] - center[1])
        }),
        FieldArg::Corner => ScalarGrid::from_fn([size; 3], |p| {
            (p[0] - center[0])
                .max(p[1] - center[1])
                .max(p[2] - center[2])
        }),
        FieldArg::Sphere => ScalarGrid::from_fn([size; 3], |p| {
            let d = [p[0] - center[0], p[1] - center[1], p[2] - center[2]];
            (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt() - half
        }),
        FieldArg::Box => ScalarGrid::from_fn([size; 3], |p| {
            let d = [
                (p[0] - center[0]).abs() - half,
                (p[1] - center[1]).abs() - half,
                (p[2] - center[2]).abs() - half,
            ];
            d[0].max(d[1]).max(d[2])
        }),
    }?;
    Ok(grid)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    tracing::info!("Results written to {}", path.display());
    Ok(())
}
