//! Runtime fireworks configuration loaded from `assets/fireworks.toml`.
//!
//! [`FireworksConfig`] is a Bevy [`Resource`] that mirrors the fireworks
//! section of [`crate::constants`].  At startup, [`load_fireworks_config`]
//! reads `assets/fireworks.toml` and overwrites the defaults with any values
//! present in the file.  Missing keys fall back to the compile-time defaults,
//! so a minimal TOML can override just the values you care about.
//!
//! ## Tuning workflow
//!
//! 1. Edit `assets/fireworks.toml`.
//! 2. Restart the app. No recompilation is required.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `FireworksConfig::default()`.

use std::io::ErrorKind;
use std::path::Path;

use crate::constants::*;
use crate::error::ConfigError;
use bevy::prelude::*;
use serde::Deserialize;

/// Path of the optional tuning file, relative to the working directory.
pub const FIREWORKS_CONFIG_PATH: &str = "assets/fireworks.toml";

/// Runtime-tunable fireworks engine parameters.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FireworksConfig {
    // ── Spawning ──────────────────────────────────────────────────────────────
    pub spawn_probability: f32,
    pub ascent_speed: f32,
    pub explosion_altitude: f32,

    // ── Explosion batch ───────────────────────────────────────────────────────
    pub particle_count_min: u32,
    pub particle_count_max: u32,
    pub particle_speed_min: f32,
    pub particle_speed_max: f32,
    pub lifespan_min: u32,
    pub lifespan_max: u32,
    pub particle_radius_min: f32,
    pub particle_radius_max: f32,

    // ── Physics ───────────────────────────────────────────────────────────────
    pub gravity: f32,
    pub friction: f32,

    // ── Rendering ─────────────────────────────────────────────────────────────
    pub trail_fade_alpha: f32,
    pub trail_width: f32,
    pub trail_opacity: f32,
    pub glow_scale: f32,
    pub glow_opacity: f32,
    pub trail_mark_budget: usize,
}

impl Default for FireworksConfig {
    fn default() -> Self {
        Self {
            // Spawning
            spawn_probability: SPAWN_PROBABILITY,
            ascent_speed: ASCENT_SPEED,
            explosion_altitude: EXPLOSION_ALTITUDE,
            // Explosion batch
            particle_count_min: PARTICLE_COUNT_MIN,
            particle_count_max: PARTICLE_COUNT_MAX,
            particle_speed_min: PARTICLE_SPEED_MIN,
            particle_speed_max: PARTICLE_SPEED_MAX,
            lifespan_min: LIFESPAN_MIN,
            lifespan_max: LIFESPAN_MAX,
            particle_radius_min: PARTICLE_RADIUS_MIN,
            particle_radius_max: PARTICLE_RADIUS_MAX,
            // Physics
            gravity: PARTICLE_GRAVITY,
            friction: PARTICLE_FRICTION,
            // Rendering
            trail_fade_alpha: TRAIL_FADE_ALPHA,
            trail_width: TRAIL_WIDTH,
            trail_opacity: TRAIL_OPACITY,
            glow_scale: GLOW_SCALE,
            glow_opacity: GLOW_OPACITY,
            trail_mark_budget: TRAIL_MARK_BUDGET,
        }
    }
}

impl FireworksConfig {
    /// Parse a (possibly partial) TOML document and sanitize the result.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<FireworksConfig>(contents).map(FireworksConfig::sanitized)
    }

    /// Clamp every value into the range the engine can run with.
    ///
    /// Swapped bounds are reordered, probabilities and alphas are clamped to
    /// `[0, 1]`, friction stays below 1, the mark budget is capped and an
    /// explosion always produces at least one particle that lives for at
    /// least one frame.
    pub fn sanitized(mut self) -> Self {
        self.spawn_probability = clamp_unit(self.spawn_probability);
        self.explosion_altitude = clamp_unit(self.explosion_altitude);
        self.ascent_speed = self.ascent_speed.abs().max(f32::EPSILON);

        self.particle_count_min = self.particle_count_min.max(1);
        if self.particle_count_max < self.particle_count_min {
            std::mem::swap(&mut self.particle_count_min, &mut self.particle_count_max);
            self.particle_count_min = self.particle_count_min.max(1);
        }

        self.lifespan_min = self.lifespan_min.max(1);
        if self.lifespan_max < self.lifespan_min {
            std::mem::swap(&mut self.lifespan_min, &mut self.lifespan_max);
            self.lifespan_min = self.lifespan_min.max(1);
        }

        order_f32(&mut self.particle_speed_min, &mut self.particle_speed_max);
        self.particle_speed_min = self.particle_speed_min.max(0.0);
        order_f32(&mut self.particle_radius_min, &mut self.particle_radius_max);
        self.particle_radius_min = self.particle_radius_min.max(0.0);

        if !(0.0..1.0).contains(&self.friction) {
            self.friction = PARTICLE_FRICTION;
        }

        self.trail_fade_alpha = clamp_unit(self.trail_fade_alpha);
        self.trail_opacity = clamp_unit(self.trail_opacity);
        self.glow_opacity = clamp_unit(self.glow_opacity);
        self.trail_width = self.trail_width.max(0.0);
        self.glow_scale = self.glow_scale.max(1.0);
        self.trail_mark_budget = self.trail_mark_budget.min(MAX_TRAIL_MARK_BUDGET);
        self
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn order_f32(min: &mut f32, max: &mut f32) {
    if *max < *min {
        std::mem::swap(min, max);
    }
}

/// Startup system: attempt to load `assets/fireworks.toml` and overwrite the
/// `FireworksConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  A missing file is not an
/// error; unreadable or malformed files are logged and do not abort the app.
pub fn load_fireworks_config(mut config: ResMut<FireworksConfig>) {
    let path = Path::new(FIREWORKS_CONFIG_PATH);
    match read_config_file(path) {
        Ok(Some(loaded)) => {
            *config = loaded;
            info!("Loaded fireworks config from {}", path.display());
        }
        Ok(None) => info!("No {} found; using compiled defaults", path.display()),
        Err(err) => warn!("{err}; using defaults"),
    }
}

/// Read and parse a tuning file.  `Ok(None)` means the file does not exist.
pub fn read_config_file(path: &Path) -> Result<Option<FireworksConfig>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    FireworksConfig::from_toml(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = FireworksConfig::from_toml("").expect("empty TOML must parse");
        assert_eq!(config, FireworksConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_named_keys() {
        let config = FireworksConfig::from_toml("spawn_probability = 0.0\nlifespan_max = 120\n")
            .expect("partial TOML must parse");
        assert_eq!(config.spawn_probability, 0.0);
        assert_eq!(config.lifespan_max, 120);
        assert_eq!(config.lifespan_min, LIFESPAN_MIN);
        assert_eq!(config.friction, PARTICLE_FRICTION);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(FireworksConfig::from_toml("spawn_probability = \"often\"").is_err());
    }

    #[test]
    fn sanitize_reorders_swapped_bounds() {
        let config = FireworksConfig {
            particle_count_min: 90,
            particle_count_max: 10,
            particle_speed_min: 8.0,
            particle_speed_max: 2.0,
            ..FireworksConfig::default()
        }
        .sanitized();
        assert_eq!(config.particle_count_min, 10);
        assert_eq!(config.particle_count_max, 90);
        assert_eq!(config.particle_speed_min, 2.0);
        assert_eq!(config.particle_speed_max, 8.0);
    }

    #[test]
    fn sanitize_never_allows_an_empty_batch() {
        let config = FireworksConfig {
            particle_count_min: 0,
            particle_count_max: 0,
            lifespan_min: 0,
            lifespan_max: 0,
            ..FireworksConfig::default()
        }
        .sanitized();
        assert_eq!(config.particle_count_min, 1);
        assert!(config.particle_count_max >= 1);
        assert_eq!(config.lifespan_min, 1);
    }

    #[test]
    fn tuning_file_outcomes_are_told_apart() {
        let dir = tempfile::TempDir::new().expect("temp dir");

        let missing = dir.path().join("fireworks.toml");
        assert!(matches!(read_config_file(&missing), Ok(None)));

        std::fs::write(&missing, "gravity = 0.1\n").expect("write");
        let loaded = read_config_file(&missing).expect("readable").expect("present");
        assert_eq!(loaded.gravity, 0.1);

        std::fs::write(&missing, "gravity = [").expect("write");
        assert!(matches!(
            read_config_file(&missing),
            Err(ConfigError::Parse { .. })
        ));

        // A directory exists but cannot be read as text.
        assert!(matches!(
            read_config_file(dir.path()),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn sanitize_clamps_probability_and_friction() {
        let config = FireworksConfig {
            spawn_probability: 3.0,
            friction: 1.5,
            ..FireworksConfig::default()
        }
        .sanitized();
        assert_eq!(config.spawn_probability, 1.0);
        assert_eq!(config.friction, PARTICLE_FRICTION);
    }

    #[test]
    fn mark_budget_is_capped() {
        let config = FireworksConfig::from_toml("trail_mark_budget = 10000000\n").expect("parse");
        assert_eq!(config.trail_mark_budget, MAX_TRAIL_MARK_BUDGET);
        let config = FireworksConfig::from_toml("trail_mark_budget = 0\n").expect("parse");
        assert_eq!(config.trail_mark_budget, 0);
    }
}
