//! Headless fireworks simulation.
//!
//! Everything here is a value transform: [`step`] takes the previous
//! [`FireworksScene`] and returns the next one without touching the old
//! value or any drawing surface.  Randomness is injected as `&mut impl Rng`
//! so tests can drive it with a seeded or constant generator.
//!
//! Coordinates follow the drawing surface: the origin is the top-left corner
//! and `y` grows downward, so a rising rocket has a decreasing `y`.

use bevy::math::Vec2;
use bevy::prelude::Resource;
use rand::Rng;

use crate::config::FireworksConfig;
use crate::constants::PALETTE;

// ── Particle ──────────────────────────────────────────────────────────────────

/// A single point of light released by an explosion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Surface position (px).
    pub position: Vec2,
    /// Velocity (px/frame).
    pub velocity: Vec2,
    /// Frames simulated so far.
    pub age: u32,
    /// Lifespan (frames); the particle is retired once `age >= max_life`.
    pub max_life: u32,
    /// sRGB colour shared by the whole batch.
    pub color: [u8; 3],
    /// Core radius (px).
    pub radius: f32,
    /// Downward acceleration added each frame (px/frame²).
    pub gravity: f32,
    /// Velocity damping factor, `< 1`.
    pub friction: f32,
}

impl Particle {
    /// Integrate one frame.
    ///
    /// Position moves by the current velocity first; the velocity is then
    /// damped and gravity is added to the vertical component.
    pub fn step(&self) -> Particle {
        Particle {
            position: self.position + self.velocity,
            velocity: Vec2::new(
                self.velocity.x * self.friction,
                self.velocity.y * self.friction + self.gravity,
            ),
            age: self.age.saturating_add(1),
            ..*self
        }
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age >= self.max_life
    }

    /// Linear fade: fully opaque at birth, transparent at `max_life`.
    pub fn opacity(&self) -> f32 {
        if self.max_life == 0 {
            return 0.0;
        }
        (1.0 - self.age as f32 / self.max_life as f32).clamp(0.0, 1.0)
    }
}

// ── Firework ──────────────────────────────────────────────────────────────────

/// A rocket that rises, explodes once, and then only carries its particles.
#[derive(Debug, Clone, PartialEq)]
pub struct Firework {
    /// Rocket head position; frozen at the burst point after exploding.
    pub position: Vec2,
    /// Explosion particles; always empty before the explosion.
    pub particles: Vec<Particle>,
    pub exploded: bool,
    /// Engine frame on which the rocket was launched.
    pub created_at: u64,
}

impl Firework {
    /// A new rocket on the bottom edge of a viewport of height `viewport_height`.
    pub fn launch(x: f32, viewport_height: f32, frame: u64) -> Self {
        Self {
            position: Vec2::new(x, viewport_height),
            particles: Vec::new(),
            exploded: false,
            created_at: frame,
        }
    }

    /// Burst at the current position.  Calling this on an already exploded
    /// firework returns it unchanged, so the batch is only ever created once.
    pub fn explode<R: Rng + ?Sized>(&self, params: &FireworksConfig, rng: &mut R) -> Firework {
        if self.exploded {
            return self.clone();
        }
        Firework {
            position: self.position,
            particles: explosion_batch(self.position, params, rng),
            exploded: true,
            created_at: self.created_at,
        }
    }

    /// True once the firework has exploded and every particle has retired.
    #[inline]
    pub fn is_spent(&self) -> bool {
        self.exploded && self.particles.is_empty()
    }

    fn ascend(&self, params: &FireworksConfig) -> Firework {
        Firework {
            position: Vec2::new(self.position.x, self.position.y - params.ascent_speed),
            particles: Vec::new(),
            exploded: false,
            created_at: self.created_at,
        }
    }

    fn advance_particles(&self) -> Firework {
        Firework {
            position: self.position,
            particles: self
                .particles
                .iter()
                .map(Particle::step)
                .filter(|p| !p.is_expired())
                .collect(),
            exploded: true,
            created_at: self.created_at,
        }
    }
}

// ── Scene ─────────────────────────────────────────────────────────────────────

/// The complete live entity set of the engine.
///
/// Exposed as a resource so the page and tests can observe how many rockets
/// and particles are alive; only the frame system replaces it.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct FireworksScene {
    pub fireworks: Vec<Firework>,
    /// Number of steps taken since the scene was created.
    pub frame: u64,
}

impl FireworksScene {
    #[inline]
    pub fn live_fireworks(&self) -> usize {
        self.fireworks.len()
    }

    pub fn live_particles(&self) -> usize {
        self.fireworks.iter().map(|fw| fw.particles.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fireworks.is_empty()
    }
}

/// Surface `y` at or above which a rising rocket explodes.
#[inline]
pub fn explosion_line(params: &FireworksConfig, viewport: Vec2) -> f32 {
    viewport.y * params.explosion_altitude
}

/// Advance the scene by one frame.
///
/// 1. Unexploded rockets rise by `ascent_speed`; a rocket that reaches the
///    explosion line bursts into its particle batch.
/// 2. Previously exploded fireworks integrate every particle and drop the
///    ones whose lifespan has elapsed.
/// 3. Exploded fireworks with no particles left are removed.
/// 4. With probability `spawn_probability` a new rocket is launched from a
///    random point on the bottom edge.
pub fn step<R: Rng + ?Sized>(
    scene: &FireworksScene,
    params: &FireworksConfig,
    viewport: Vec2,
    rng: &mut R,
) -> FireworksScene {
    let threshold = explosion_line(params, viewport);
    let frame = scene.frame.wrapping_add(1);

    let mut fireworks = Vec::with_capacity(scene.fireworks.len() + 1);
    for firework in &scene.fireworks {
        let next = if firework.exploded {
            firework.advance_particles()
        } else {
            let risen = firework.ascend(params);
            if risen.position.y <= threshold {
                risen.explode(params, rng)
            } else {
                risen
            }
        };
        if !next.is_spent() {
            fireworks.push(next);
        }
    }

    let p = f64::from(params.spawn_probability).clamp(0.0, 1.0);
    if p > 0.0 && rng.gen_bool(p) {
        let x = sample_f32(rng, 0.0, viewport.x.max(0.0));
        fireworks.push(Firework::launch(x, viewport.y, frame));
    }

    FireworksScene { fireworks, frame }
}

/// Build one explosion: a randomized number of particles sharing one palette
/// colour, each with a uniformly random direction and bounded speed.
pub fn explosion_batch<R: Rng + ?Sized>(
    origin: Vec2,
    params: &FireworksConfig,
    rng: &mut R,
) -> Vec<Particle> {
    let count_min = params.particle_count_min.max(1);
    let count_max = params.particle_count_max.max(count_min);
    let count = rng.gen_range(count_min..=count_max);

    let color = PALETTE[rng.gen_range(0..PALETTE.len())];
    let life_min = params.lifespan_min.max(1);
    let life_max = params.lifespan_max.max(life_min);

    (0..count)
        .map(|_| {
            let angle = rng.gen_range(0.0_f32..std::f32::consts::TAU);
            let speed = sample_f32(rng, params.particle_speed_min, params.particle_speed_max);
            Particle {
                position: origin,
                velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
                age: 0,
                max_life: rng.gen_range(life_min..=life_max),
                color,
                radius: sample_f32(rng, params.particle_radius_min, params.particle_radius_max),
                gravity: params.gravity,
                friction: params.friction,
            }
        })
        .collect()
}

/// Uniform sample in `[min, max)`, or `min` when the range is empty.
fn sample_f32<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}
