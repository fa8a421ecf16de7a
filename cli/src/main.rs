use std::fs;
use std::path::PathBuf;

use battlemap::camera::Point;
use battlemap::grid::{GridConfig, GridType, cell_center, cell_to_point, point_to_cell, snap_to_grid};
use battlemap::grid_lines::{GridLines, GridLinesError};
use battlemap::input::Modifiers;
use battlemap::snap::{ASSET_SNAP, SnapConfig, SnapMode, WALL_SNAP, resolve_snap_mode, snap_point};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid grid config: {0}")]
    InvalidGrid(#[from] battlemap::grid::GridConfigError),
    #[error(transparent)]
    TooDense(#[from] GridLinesError),
    #[error("grid config has {0} violation(s)")]
    Violations(usize),
}

#[derive(Parser, Debug)]
#[command(name = "battlemap-cli", about = "Grid math and grid line tools for battle maps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate grid primitives for an extent.
    Grid(GridCommand),
    /// Map a stage point to its cell and the cell's anchor points.
    Cell(CellCommand),
    /// Snap a stage point under a snap mode.
    Snap(SnapCommand),
    /// Validate a grid config JSON file.
    Validate(ValidateCommand),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GridKind {
    None,
    Square,
    HexH,
    HexV,
    Iso,
}

impl From<GridKind> for GridType {
    fn from(kind: GridKind) -> Self {
        match kind {
            GridKind::None => GridType::NoGrid,
            GridKind::Square => GridType::Square,
            GridKind::HexH => GridType::HexHorizontal,
            GridKind::HexV => GridType::HexVertical,
            GridKind::Iso => GridType::Isometric,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SnapArg {
    Free,
    Full,
    Half,
    Quarter,
    Micro,
}

impl From<SnapArg> for SnapMode {
    fn from(arg: SnapArg) -> Self {
        match arg {
            SnapArg::Free => SnapMode::Free,
            SnapArg::Full => SnapMode::Full,
            SnapArg::Half => SnapMode::Half,
            SnapArg::Quarter => SnapMode::Quarter,
            SnapArg::Micro => SnapMode::Micro,
        }
    }
}

/// Snap preset, as picked by the kind of thing being dragged.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SnapPreset {
    /// Tokens: full cells, half cells when fine.
    Asset,
    /// Walls and region vertices: half cells, quarter cells when fine.
    Wall,
}

impl From<SnapPreset> for SnapConfig {
    fn from(preset: SnapPreset) -> Self {
        match preset {
            SnapPreset::Asset => ASSET_SNAP,
            SnapPreset::Wall => WALL_SNAP,
        }
    }
}

/// Grid selection shared by every subcommand. `--config` wins over the flags.
#[derive(Args, Debug)]
struct GridArgs {
    /// Grid config JSON file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = GridKind::Square)]
    grid: GridKind,

    #[arg(long, default_value_t = 50.0)]
    cell_width: f64,

    #[arg(long)]
    cell_height: Option<f64>,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    offset_x: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    offset_y: f64,
}

impl GridArgs {
    fn load(&self) -> Result<GridConfig, CliError> {
        if let Some(path) = &self.config {
            return read_config(path);
        }
        Ok(GridConfig {
            grid_type: self.grid.into(),
            cell_width: self.cell_width,
            cell_height: self.cell_height.unwrap_or(self.cell_width),
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            ..GridConfig::default()
        })
    }
}

#[derive(Args, Debug)]
struct GridCommand {
    #[command(flatten)]
    grid: GridArgs,

    #[arg(long, default_value_t = 800.0)]
    width: f64,

    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Extra cells past each edge for hex and isometric grids (at least 3).
    #[arg(long, value_parser = clap::value_parser!(u32).range(3..))]
    overdraw: Option<u32>,

    /// Refuse to generate more primitives than this.
    #[arg(long)]
    limit: Option<u64>,

    /// Print only the number of primitives.
    #[arg(long)]
    count: bool,
}

#[derive(Args, Debug)]
struct CellCommand {
    #[command(flatten)]
    grid: GridArgs,

    #[arg(allow_hyphen_values = true)]
    x: f64,

    #[arg(allow_hyphen_values = true)]
    y: f64,
}

#[derive(Args, Debug)]
struct SnapCommand {
    #[command(flatten)]
    grid: GridArgs,

    /// Explicit snap mode; overrides `--preset`, `--fine` and `--free`.
    #[arg(long, value_enum)]
    mode: Option<SnapArg>,

    #[arg(long, value_enum, default_value_t = SnapPreset::Asset)]
    preset: SnapPreset,

    /// Use the preset's fine mode, as when Ctrl is held.
    #[arg(long)]
    fine: bool,

    /// Disable snapping, as when Alt is held.
    #[arg(long)]
    free: bool,

    #[arg(allow_hyphen_values = true)]
    x: f64,

    #[arg(allow_hyphen_values = true)]
    y: f64,
}

#[derive(Args, Debug)]
struct ValidateCommand {
    path: PathBuf,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Grid(cmd) => run_grid(&cmd),
        Command::Cell(cmd) => run_cell(&cmd),
        Command::Snap(cmd) => run_snap(&cmd),
        Command::Validate(cmd) => run_validate(&cmd),
    }
}

fn run_grid(cmd: &GridCommand) -> Result<(), CliError> {
    let cfg = cmd.grid.load()?.validated()?;
    let mut plan = GridLines::new(cfg, cmd.width, cmd.height);
    if let Some(cells) = cmd.overdraw {
        plan = plan.with_overdraw(cells);
    }
    if let Some(limit) = cmd.limit {
        plan = plan.with_limit(limit);
    }
    let primitives = plan.generate()?;
    info!(grid_type = ?cfg.grid_type, count = primitives.len(), "generated grid");
    if cmd.count {
        println!("{}", primitives.len());
        return Ok(());
    }
    print_json(&serde_json::to_value(&primitives)?)
}

fn run_cell(cmd: &CellCommand) -> Result<(), CliError> {
    let cfg = cmd.grid.load()?.validated()?;
    let p = Point::new(cmd.x, cmd.y);
    let cell = point_to_cell(p, &cfg);
    debug!(col = cell.col, row = cell.row, "resolved cell");
    print_json(&json!({
        "cell": cell,
        "anchor": cell_to_point(cell, &cfg),
        "center": cell_center(cell, &cfg),
        "snapped": snap_to_grid(p, &cfg),
    }))
}

fn run_snap(cmd: &SnapCommand) -> Result<(), CliError> {
    let cfg = cmd.grid.load()?.validated()?;
    let mode = match cmd.mode {
        Some(mode) => mode.into(),
        None => {
            let modifiers = Modifiers { ctrl: cmd.fine, alt: cmd.free, ..Modifiers::default() };
            resolve_snap_mode(modifiers, cmd.preset.into())
        }
    };
    debug!(?mode, "resolved snap mode");
    let snapped = snap_point(Point::new(cmd.x, cmd.y), &cfg, mode);
    print_json(&serde_json::to_value(snapped)?)
}

fn run_validate(cmd: &ValidateCommand) -> Result<(), CliError> {
    let cfg = read_config(&cmd.path)?;
    let errors = cfg.errors();
    if errors.is_empty() {
        println!("ok");
        return Ok(());
    }
    for error in &errors {
        println!("{error}");
    }
    Err(CliError::Violations(errors.len()))
}

fn read_config(path: &PathBuf) -> Result<GridConfig, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Read { path: path.clone(), source })?;
    Ok(serde_json::from_str(&raw)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
