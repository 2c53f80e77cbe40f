//! Centralised animation, lottery and audio constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//!
//! ## Tuning guidance
//!
//! The fireworks values are the compiled defaults of
//! [`crate::config::FireworksConfig`]; override them at runtime through
//! `assets/fireworks.toml` instead of editing this file.  Units are pixels and
//! frames unless stated otherwise: the engine advances one step per rendered
//! frame, so timings scale with the display refresh rate.

// ── Fireworks: Spawning ───────────────────────────────────────────────────────

/// Probability that a new firework is launched on any given frame.
///
/// At 60 Hz, 0.05 launches roughly three rockets per second.
/// 0.0 disables launching entirely (useful for draining the scene in tests).
pub const SPAWN_PROBABILITY: f32 = 0.05;

/// Upward speed of an unexploded firework (pixels/frame).
pub const ASCENT_SPEED: f32 = 5.0;

/// Explosion altitude as a fraction of the viewport height, measured from the top.
///
/// A rocket explodes the first frame its `y` is at or above this line.
pub const EXPLOSION_ALTITUDE: f32 = 0.3;

// ── Fireworks: Explosion Batch ────────────────────────────────────────────────

/// Fewest particles one explosion may produce.  Clamped to at least 1.
pub const PARTICLE_COUNT_MIN: u32 = 50;

/// Most particles one explosion may produce (inclusive).
pub const PARTICLE_COUNT_MAX: u32 = 100;

/// Initial particle speed range (pixels/frame).  Sampled uniformly, paired
/// with a uniformly random angle over the full circle.
pub const PARTICLE_SPEED_MIN: f32 = 1.0;
pub const PARTICLE_SPEED_MAX: f32 = 6.0;

/// Particle lifespan range (frames, inclusive).
pub const LIFESPAN_MIN: u32 = 50;
pub const LIFESPAN_MAX: u32 = 100;

/// Particle radius range (pixels).
pub const PARTICLE_RADIUS_MIN: f32 = 1.0;
pub const PARTICLE_RADIUS_MAX: f32 = 3.0;

// ── Fireworks: Physics ────────────────────────────────────────────────────────

/// Downward acceleration added to `vy` every frame (pixels/frame²).
pub const PARTICLE_GRAVITY: f32 = 0.06;

/// Multiplicative velocity damping applied every frame.  Must stay below 1.0.
pub const PARTICLE_FRICTION: f32 = 0.97;

// ── Fireworks: Rendering ──────────────────────────────────────────────────────

/// Alpha of the translucent fill applied over the surface each frame.
///
/// Lower values leave longer light trails; 1.0 is a hard clear.
pub const TRAIL_FADE_ALPHA: f32 = 0.1;

/// Width of the launch trail line (pixels).
pub const TRAIL_WIDTH: f32 = 2.0;

/// Opacity of the launch trail line.
pub const TRAIL_OPACITY: f32 = 0.6;

/// Glow halo radius as a multiple of the particle radius.
pub const GLOW_SCALE: f32 = 2.5;

/// Glow halo opacity relative to the particle core.
pub const GLOW_OPACITY: f32 = 0.25;

/// Marks fainter than this are dropped from the trail layer.
pub const MARK_ALPHA_CUTOFF: f32 = 1.0 / 64.0;

/// Most marks the trail layer keeps; the oldest go first.
pub const TRAIL_MARK_BUDGET: usize = 6_000;

/// Upper bound accepted for the mark budget; keeps mark depths inside the
/// camera's depth range.
pub const MAX_TRAIL_MARK_BUDGET: usize = 50_000;

/// Render layer shared by the overlay camera and the mark entities.
pub const FIREWORKS_RENDER_LAYER: usize = 1;

/// Number of alpha steps marks are quantized to when picking a material.
pub const MARK_ALPHA_LEVELS: u8 = 64;

/// Viewport used when no window is available (headless runs).
pub const FALLBACK_VIEWPORT_WIDTH: f32 = 1280.0;
pub const FALLBACK_VIEWPORT_HEIGHT: f32 = 720.0;

/// Shared explosion palette (sRGB bytes): gold, deep pink, cyan, hot pink,
/// slate blue, orange.
pub const PALETTE: [[u8; 3]; 6] = [
    [0xFF, 0xD7, 0x00],
    [0xFF, 0x14, 0x93],
    [0x00, 0xF5, 0xFF],
    [0xFF, 0x69, 0xB4],
    [0x7B, 0x68, 0xEE],
    [0xFF, 0xA5, 0x00],
];

// ── Lottery ───────────────────────────────────────────────────────────────────

/// Interval between digit substitutions while the spinner rolls (ms).
pub const SPIN_TICK_MS: u64 = 60;

/// Default total spin time (ms): 41 ticks of 60 ms.
pub const DEFAULT_SPIN_DURATION_MS: u64 = 2460;

/// Default upper bound of the winning integer; also fixes the digit width (5).
pub const DEFAULT_MAX_RANGE: u32 = 99_999;

/// Default seconds between automatic spins when auto-spin is enabled.
pub const DEFAULT_AUTO_SPIN_INTERVAL_SECS: u32 = 30;

// ── Persistence ───────────────────────────────────────────────────────────────

/// Maximum number of draws kept in the persisted history.
pub const HISTORY_CAP: usize = 50;

/// Number of entries reported by history statistics (top digits, recent draws).
pub const STATS_TOP_N: usize = 5;

/// On-disk record format version.
pub const STORE_VERSION: u32 = 1;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "LUCKYDRAW_DATA_DIR";

/// Data directory used when [`DATA_DIR_ENV`] is unset.
pub const DEFAULT_DATA_DIR: &str = "saves";

// ── Celebration ───────────────────────────────────────────────────────────────

/// Confetti pieces spawned per revealed draw.
pub const CONFETTI_COUNT: usize = 100;

/// Seconds before the confetti burst is cleared.
pub const CONFETTI_CLEAR_SECS: f32 = 4.0;

// ── Audio ─────────────────────────────────────────────────────────────────────

/// Sample rate of the synthesized one-shot cues (Hz).
pub const SAMPLE_RATE: u32 = 44_100;

/// Sample rate of the ambient pad (Hz); its tones stay below 300 Hz.
pub const AMBIENT_SAMPLE_RATE: u32 = 11_025;

/// Floor used by exponential ramps; the ramp target can never reach zero.
pub const RAMP_FLOOR: f32 = 0.0001;
