//! Stage tuning parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::consts::{
    DEFAULT_GRID_OVERDRAW_CELLS, DEFAULT_MAX_GRID_PRIMITIVES, DEFAULT_MAX_ZOOM, DEFAULT_MIN_PLACEMENT_PX, DEFAULT_MIN_ZOOM,
    DEFAULT_ROTATION_SNAP_DEG, DEFAULT_WHEEL_ZOOM_STEP, DEFAULT_ZOOM_STEP, MIN_GRID_OVERDRAW_CELLS,
};

pub const ENV_MIN_ZOOM: &str = "BATTLEMAP_MIN_ZOOM";
pub const ENV_MAX_ZOOM: &str = "BATTLEMAP_MAX_ZOOM";
pub const ENV_ZOOM_STEP: &str = "BATTLEMAP_ZOOM_STEP";
pub const ENV_WHEEL_ZOOM_STEP: &str = "BATTLEMAP_WHEEL_ZOOM_STEP";
pub const ENV_GRID_OVERDRAW_CELLS: &str = "BATTLEMAP_GRID_OVERDRAW_CELLS";
pub const ENV_MAX_GRID_PRIMITIVES: &str = "BATTLEMAP_MAX_GRID_PRIMITIVES";
pub const ENV_MIN_PLACEMENT_PX: &str = "BATTLEMAP_MIN_PLACEMENT_PX";
pub const ENV_ROTATION_SNAP_DEG: &str = "BATTLEMAP_ROTATION_SNAP_DEG";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}: cannot parse '{value}'")]
    Parse { key: &'static str, value: String },
    #[error("{key}: {value} {reason}")]
    OutOfRange { key: &'static str, value: f64, reason: &'static str },
    #[error("zoom range is empty (min {min} > max {max})")]
    ZoomRange { min: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Factor applied by zoom in/out buttons.
    pub zoom_step: f64,
    /// Factor applied per wheel notch.
    pub wheel_zoom_step: f64,
    /// Cells generated past each visible edge of polygonal grids.
    pub grid_overdraw_cells: u32,
    /// Grid plans estimated above this many primitives are not generated.
    pub max_grid_primitives: u32,
    pub min_placement_px: f64,
    pub rotation_snap_deg: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            zoom_step: DEFAULT_ZOOM_STEP,
            wheel_zoom_step: DEFAULT_WHEEL_ZOOM_STEP,
            grid_overdraw_cells: DEFAULT_GRID_OVERDRAW_CELLS,
            max_grid_primitives: DEFAULT_MAX_GRID_PRIMITIVES,
            min_placement_px: DEFAULT_MIN_PLACEMENT_PX,
            rotation_snap_deg: DEFAULT_ROTATION_SNAP_DEG,
        }
    }
}

impl StageConfig {
    /// Build stage config from environment variables.
    ///
    /// Optional (defaults in `consts`):
    /// - `BATTLEMAP_MIN_ZOOM`, `BATTLEMAP_MAX_ZOOM`: scale limits, `0 < min <= max`
    /// - `BATTLEMAP_ZOOM_STEP`, `BATTLEMAP_WHEEL_ZOOM_STEP`: factors `> 1`
    /// - `BATTLEMAP_GRID_OVERDRAW_CELLS`: whole cells, `>= 3`
    /// - `BATTLEMAP_MAX_GRID_PRIMITIVES`: `> 0`
    /// - `BATTLEMAP_MIN_PLACEMENT_PX`: `>= 0`
    /// - `BATTLEMAP_ROTATION_SNAP_DEG`: `(0, 360]`
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unparsable or out-of-range values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// Same as [`Self::from_env`] but reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unparsable or out-of-range values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let cfg = Self {
            min_zoom: parse_f64(&lookup, ENV_MIN_ZOOM, defaults.min_zoom)?,
            max_zoom: parse_f64(&lookup, ENV_MAX_ZOOM, defaults.max_zoom)?,
            zoom_step: parse_f64(&lookup, ENV_ZOOM_STEP, defaults.zoom_step)?,
            wheel_zoom_step: parse_f64(&lookup, ENV_WHEEL_ZOOM_STEP, defaults.wheel_zoom_step)?,
            grid_overdraw_cells: parse_u32(&lookup, ENV_GRID_OVERDRAW_CELLS, defaults.grid_overdraw_cells)?,
            max_grid_primitives: parse_u32(&lookup, ENV_MAX_GRID_PRIMITIVES, defaults.max_grid_primitives)?,
            min_placement_px: parse_f64(&lookup, ENV_MIN_PLACEMENT_PX, defaults.min_placement_px)?,
            rotation_snap_deg: parse_f64(&lookup, ENV_ROTATION_SNAP_DEG, defaults.rotation_snap_deg)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns the first violated range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(ENV_MIN_ZOOM, self.min_zoom, self.min_zoom > 0.0, "must be greater than 0")?;
        require(ENV_MAX_ZOOM, self.max_zoom, self.max_zoom.is_finite(), "must be finite")?;
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::ZoomRange { min: self.min_zoom, max: self.max_zoom });
        }
        require(ENV_ZOOM_STEP, self.zoom_step, self.zoom_step > 1.0, "must be greater than 1")?;
        require(ENV_WHEEL_ZOOM_STEP, self.wheel_zoom_step, self.wheel_zoom_step > 1.0, "must be greater than 1")?;
        require(
            ENV_GRID_OVERDRAW_CELLS,
            f64::from(self.grid_overdraw_cells),
            self.grid_overdraw_cells >= MIN_GRID_OVERDRAW_CELLS,
            "must be at least 3",
        )?;
        require(
            ENV_MAX_GRID_PRIMITIVES,
            f64::from(self.max_grid_primitives),
            self.max_grid_primitives > 0,
            "must be greater than 0",
        )?;
        require(ENV_MIN_PLACEMENT_PX, self.min_placement_px, self.min_placement_px >= 0.0, "must not be negative")?;
        require(
            ENV_ROTATION_SNAP_DEG,
            self.rotation_snap_deg,
            self.rotation_snap_deg > 0.0 && self.rotation_snap_deg <= 360.0,
            "must be in (0, 360]",
        )?;
        Ok(())
    }
}

fn require(key: &'static str, value: f64, ok: bool, reason: &'static str) -> Result<(), ConfigError> {
    // NaN fails every comparison, so `ok` is false for it.
    if ok { Ok(()) } else { Err(ConfigError::OutOfRange { key, value, reason }) }
}

fn parse_f64(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<f64>().map_err(|_| ConfigError::Parse { key, value: raw }),
    }
}

fn parse_u32(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u32>().map_err(|_| ConfigError::Parse { key, value: raw }),
    }
}
